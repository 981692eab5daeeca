use crate::parameters::{ModelParameters, ParameterName};
use crate::prior::ln_prior_1d::{LnPrior1D, LnPrior1DTrait};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::{LOG10_E, PI};

/// Joint prior of the lens model parameters
///
/// Parameters are independent, so the joint prior is the product of one-dimensional priors:
///
/// | parameter | prior |
/// |---|---|
/// | `xS`, `yS`, `xL`, `yL` | Normal(0, 0.1) |
/// | `gS` | Gamma(shape = 10, scale = 5) |
/// | `bL` | Gamma(shape = 3, scale = 1), $r^2 e^{-r} / 2$ |
/// | `q` | Uniform(0, 1) |
/// | `theta` | Uniform(0, pi) |
/// | `dxS`, `dyS` | Normal(0, 0.5) |
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct LensPrior {
    position: LnPrior1D,
    magnitude: LnPrior1D,
    einstein_radius: LnPrior1D,
    axis_ratio: LnPrior1D,
    orientation: LnPrior1D,
    proper_motion: LnPrior1D,
}

impl LensPrior {
    pub fn new() -> Self {
        Self {
            position: LnPrior1D::normal(0.0, 0.1),
            magnitude: LnPrior1D::gamma(10.0, 5.0),
            einstein_radius: LnPrior1D::gamma(3.0, 1.0),
            axis_ratio: LnPrior1D::uniform(0.0, 1.0),
            orientation: LnPrior1D::uniform(0.0, PI),
            proper_motion: LnPrior1D::normal(0.0, 0.5),
        }
    }

    /// One-dimensional prior of the parameter
    pub fn component(&self, name: ParameterName) -> &LnPrior1D {
        match name {
            ParameterName::SourceX
            | ParameterName::SourceY
            | ParameterName::LensX
            | ParameterName::LensY => &self.position,
            ParameterName::SourcePmX | ParameterName::SourcePmY => &self.proper_motion,
            ParameterName::SourceMagnitude => &self.magnitude,
            ParameterName::EinsteinRadius => &self.einstein_radius,
            ParameterName::AxisRatio => &self.axis_ratio,
            ParameterName::Orientation => &self.orientation,
        }
    }

    /// Prior probability density of a single parameter, zero out of its support
    ///
    /// The density is evaluated in linear space and underflows to zero far in the tails of
    /// unbounded priors, while [LensPrior::ln_prior] and [LensPrior::log10_prior] are evaluated
    /// in log space and stay finite there.
    pub fn prior_density(&self, name: ParameterName, value: f64) -> f64 {
        self.component(name).density(value)
    }

    /// Natural logarithm of the joint prior
    ///
    /// Returns negative infinity as soon as a parameter is out of its support, remaining
    /// parameters are not evaluated. If `jac` is `Some`, the gradient over the flat parameter
    /// vector is stored in it, it is zero for a rejected parameter set.
    ///
    /// # Panics
    ///
    /// If `jac` length differs from the number of model parameters.
    pub fn ln_prior(&self, params: &ModelParameters, mut jac: Option<&mut [f64]>) -> f64 {
        let named = params.named();
        if let Some(jac) = jac.as_deref_mut() {
            assert_eq!(
                jac.len(),
                named.len(),
                "jac length must be equal to the number of parameters"
            );
        }

        let mut total = 0.0;
        for (i, (name, value)) in named.into_iter().enumerate() {
            let component = self.component(name);
            let ln_p = match jac.as_deref_mut() {
                Some(jac) => component.ln_prior_1d(value, Some(&mut jac[i])),
                None => component.ln_prior_1d(value, None),
            };
            // NaN is rejected too
            if !(ln_p > f64::NEG_INFINITY) {
                log::trace!("{name} = {value} is out of the prior support");
                if let Some(jac) = jac {
                    jac.fill(0.0);
                }
                return f64::NEG_INFINITY;
            }
            total += ln_p;
        }
        total
    }

    /// Decimal logarithm of the joint prior
    ///
    /// Computed from [LensPrior::ln_prior], so it is finite everywhere in the support, even where
    /// [LensPrior::prior_density] of some parameter underflows to zero.
    pub fn log10_prior(&self, params: &ModelParameters) -> f64 {
        self.ln_prior(params, None) * LOG10_E
    }
}

impl Default for LensPrior {
    fn default() -> Self {
        Self::new()
    }
}
