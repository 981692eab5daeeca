use enum_dispatch::enum_dispatch;
use ordered_float::NotNan;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

#[enum_dispatch]
pub trait LnPrior1DTrait:
    Clone + Debug + Serialize + DeserializeOwned + PartialEq + Eq + Hash
{
    /// Evaluate the natural logarithm of the prior at x
    ///
    /// If `grad` is `Some`, the gradient d(ln_prior)/dx is also computed and stored in it.
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64;
}

/// Natural logarithm of prior for a single lens model parameter
#[enum_dispatch(LnPrior1DTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LnPrior1D {
    Normal(NormalLnPrior1D),
    Uniform(UniformLnPrior1D),
    Gamma(GammaLnPrior1D),
}

impl LnPrior1D {
    pub fn normal(mu: f64, std: f64) -> Self {
        NormalLnPrior1D::new(mu, std).into()
    }

    pub fn uniform(left: f64, right: f64) -> Self {
        UniformLnPrior1D::new(left, right).into()
    }

    pub fn gamma(shape: f64, scale: f64) -> Self {
        GammaLnPrior1D::new(shape, scale).into()
    }

    /// Probability density, zero out of the support
    pub fn density(&self, x: f64) -> f64 {
        self.ln_prior_1d(x, None).exp()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(into = "NormalLnPrior1DParameters", from = "NormalLnPrior1DParameters")]
pub struct NormalLnPrior1D {
    mu: NotNan<f64>,
    inv_std2: NotNan<f64>,
    ln_prob_coeff: NotNan<f64>,
}

impl NormalLnPrior1D {
    pub fn new(mu: f64, std: f64) -> Self {
        Self {
            mu: NotNan::new(mu).expect("mu must be not NaN"),
            inv_std2: NotNan::new(std.powi(-2)).expect("std must be positive and finite"),
            ln_prob_coeff: NotNan::new(-f64::ln(std) - 0.5 * f64::ln(std::f64::consts::TAU))
                .expect("std must be positive and finite"),
        }
    }

    fn mu(&self) -> f64 {
        self.mu.into_inner()
    }

    fn inv_std2(&self) -> f64 {
        self.inv_std2.into_inner()
    }

    fn ln_prob_coeff(&self) -> f64 {
        self.ln_prob_coeff.into_inner()
    }
}

impl LnPrior1DTrait for NormalLnPrior1D {
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64 {
        let diff = self.mu() - x;
        let ln_prior = self.ln_prob_coeff() - 0.5 * diff.powi(2) * self.inv_std2();

        if let Some(g) = grad {
            *g = diff * self.inv_std2();
        }

        ln_prior
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "NormalLnPrior1D")]
struct NormalLnPrior1DParameters {
    mu: f64,
    std: f64,
}

impl From<NormalLnPrior1D> for NormalLnPrior1DParameters {
    fn from(f: NormalLnPrior1D) -> Self {
        Self {
            mu: f.mu(),
            std: f.inv_std2().recip().sqrt(),
        }
    }
}

impl From<NormalLnPrior1DParameters> for NormalLnPrior1D {
    fn from(f: NormalLnPrior1DParameters) -> Self {
        Self::new(f.mu, f.std)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(
    into = "UniformLnPrior1DParameters",
    from = "UniformLnPrior1DParameters"
)]
pub struct UniformLnPrior1D {
    range: std::ops::RangeInclusive<NotNan<f64>>,
    ln_prob: NotNan<f64>,
}

impl UniformLnPrior1D {
    pub fn new(left: f64, right: f64) -> Self {
        assert!(left < right, "right must be larger than left");
        let left = NotNan::new(left).expect("left must be finite");
        let right = NotNan::new(right).expect("right must be finite");
        Self {
            range: left..=right,
            ln_prob: NotNan::new(-f64::ln(right.into_inner() - left.into_inner()))
                .expect("range must be finite"),
        }
    }

    fn left(&self) -> f64 {
        self.range.start().into_inner()
    }

    fn right(&self) -> f64 {
        self.range.end().into_inner()
    }

    fn ln_prob(&self) -> f64 {
        self.ln_prob.into_inner()
    }
}

impl LnPrior1DTrait for UniformLnPrior1D {
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64 {
        // constant within the range
        if let Some(g) = grad {
            *g = 0.0;
        }
        match NotNan::new(x) {
            Ok(x) if self.range.contains(&x) => self.ln_prob(),
            _ => f64::NEG_INFINITY,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "UniformLnPrior")]
struct UniformLnPrior1DParameters {
    range: std::ops::RangeInclusive<f64>,
}

impl From<UniformLnPrior1D> for UniformLnPrior1DParameters {
    fn from(f: UniformLnPrior1D) -> Self {
        Self {
            range: f.left()..=f.right(),
        }
    }
}

impl From<UniformLnPrior1DParameters> for UniformLnPrior1D {
    fn from(f: UniformLnPrior1DParameters) -> Self {
        Self::new(*f.range.start(), *f.range.end())
    }
}

/// Gamma distribution with `shape` k and `scale` theta, supported on positive values
///
/// $p(x) = x^{k-1} e^{-x/\theta} / (\Gamma(k) \theta^k)$
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(into = "GammaLnPrior1DParameters", from = "GammaLnPrior1DParameters")]
pub struct GammaLnPrior1D {
    shape: NotNan<f64>,
    inv_scale: NotNan<f64>,
    ln_prob_coeff: NotNan<f64>,
}

impl GammaLnPrior1D {
    pub fn new(shape: f64, scale: f64) -> Self {
        assert!(shape > 0.0, "shape must be positive");
        assert!(scale > 0.0, "scale must be positive");
        Self {
            shape: NotNan::new(shape).expect("shape must be not NaN"),
            inv_scale: NotNan::new(scale.recip()).expect("scale must be positive and finite"),
            ln_prob_coeff: NotNan::new(-libm::lgamma(shape) - shape * f64::ln(scale))
                .expect("shape and scale must be finite"),
        }
    }

    fn shape(&self) -> f64 {
        self.shape.into_inner()
    }

    fn inv_scale(&self) -> f64 {
        self.inv_scale.into_inner()
    }

    fn ln_prob_coeff(&self) -> f64 {
        self.ln_prob_coeff.into_inner()
    }

    /// Maximum of the density for `shape >= 1`
    pub fn mode(&self) -> f64 {
        f64::max(self.shape() - 1.0, 0.0) / self.inv_scale()
    }
}

impl LnPrior1DTrait for GammaLnPrior1D {
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64 {
        if !(x > 0.0) {
            if let Some(g) = grad {
                *g = 0.0;
            }
            return f64::NEG_INFINITY;
        }
        let ln_prior = self.ln_prob_coeff() + (self.shape() - 1.0) * f64::ln(x) - x * self.inv_scale();

        if let Some(g) = grad {
            *g = (self.shape() - 1.0) / x - self.inv_scale();
        }

        ln_prior
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "GammaLnPrior1D")]
struct GammaLnPrior1DParameters {
    shape: f64,
    scale: f64,
}

impl From<GammaLnPrior1D> for GammaLnPrior1DParameters {
    fn from(f: GammaLnPrior1D) -> Self {
        Self {
            shape: f.shape(),
            scale: f.inv_scale().recip(),
        }
    }
}

impl From<GammaLnPrior1DParameters> for GammaLnPrior1D {
    fn from(f: GammaLnPrior1DParameters) -> Self {
        Self::new(f.shape, f.scale)
    }
}
