#![doc = include_str!("../README.md")]

#[cfg(test)]
mod tests;

mod error;
pub use error::{ObservationError, ParametersError, RootFindingError, SolverError};

pub mod lens;
pub use lens::{Curve, Lens, LensTrait, SieLens, SisLens, tabulate_curve};

mod likelihood;
pub use likelihood::{LensLikelihood, PredictedImage};

mod observation;
pub use observation::{ImageFeatures, ObservedData, ObservedImage, ProperMotion};

mod parameters;
pub use parameters::{
    LensGeometry, ModelKind, ModelParameters, ParameterName, SieParameters, SiePmParameters,
    SisParameters, SisPmParameters,
};

mod posterior;
pub use posterior::LensPosterior;

pub mod prior;
pub use prior::{LensPrior, LnPrior1D};

pub mod root_finding;

mod sampling;
pub use sampling::EmceeTarget;

mod solver;
pub use solver::{Image, ImageSolver};

pub use emcee;
pub use nalgebra;
pub use ndarray;
