use crate::parameters::ModelKind;

/// Error returned when a flat parameter vector is converted into [crate::ModelParameters]
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParametersError {
    #[error("{kind} model has {expected} parameters, but {actual} values were given")]
    WrongLength {
        kind: ModelKind,
        expected: usize,
        actual: usize,
    },
}

/// Error returned from [crate::ObservedImage] and [crate::ObservedData] constructors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ObservationError {
    #[error(
        "observed image row has {actual} values, 6 (position and magnitude) or 10 (with proper motion) are expected"
    )]
    WrongRowLength { actual: usize },

    #[error("uncertainty of {feature} must be positive and finite, got {value}")]
    InvalidUncertainty { feature: &'static str, value: f64 },

    #[error("observed value of {feature} must be finite, got {value}")]
    NonFiniteValue { feature: &'static str, value: f64 },

    #[error("features and their uncertainties have different layouts")]
    UncertaintyLayout,

    #[error("{with_pm} images have proper motion and {without_pm} images have not")]
    MixedLayout { with_pm: usize, without_pm: usize },
}

/// Error returned from [crate::root_finding::brent]
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RootFindingError {
    #[error("root is not bracketed: f({a}) = {fa}, f({b}) = {fb}")]
    NotBracketed { a: f64, fa: f64, b: f64, fb: f64 },

    #[error("Brent's method has not converged in {iterations} iterations, last estimate is {x}")]
    NotConverged { iterations: u32, x: f64 },
}

/// Error returned from [crate::ImageSolver::try_new] and [crate::ImageSolver] deserialization
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SolverError {
    #[error("step must be positive and finite, got {0}")]
    InvalidStep(f64),

    #[error("{name} must be non-negative and finite, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },

    #[error("max_iterations must be positive")]
    ZeroIterations,
}
