use crate::lens::LensTrait;

use nalgebra::Vector2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Singular isothermal ellipsoid, Kormann, Schneider & Bartelmann (1994)
///
/// `q` is the axis ratio, the lens is physical for `0 < q <= 1`. The constructor doesn't check
/// it: values outside of the support give NaN, and it is the prior which rejects them.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SieLens {
    pub q: f64,
}

impl SieLens {
    pub fn new(q: f64) -> Self {
        Self { q }
    }

    /// `sqrt(1 - q^2)`
    fn eccentricity(&self) -> f64 {
        (1.0 - self.q.powi(2)).sqrt()
    }
}

impl LensTrait for SieLens {
    fn axis_ratio(&self) -> f64 {
        self.q
    }

    fn deflection_angle(&self, phi: f64) -> Vector2<f64> {
        let (sin, cos) = phi.sin_cos();
        let e = self.eccentricity();
        // spherical limit of the expression below
        if e == 0.0 {
            return Vector2::new(cos, sin);
        }
        let ratio = self.q.sqrt() / e;
        Vector2::new(
            ratio * f64::asinh(e * cos / self.q),
            ratio * f64::asin(e * sin),
        )
    }
}
