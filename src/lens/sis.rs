use crate::lens::LensTrait;

use nalgebra::Vector2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Singular isothermal sphere
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SisLens {}

impl LensTrait for SisLens {
    fn axis_ratio(&self) -> f64 {
        1.0
    }

    fn deflection_angle(&self, phi: f64) -> Vector2<f64> {
        let (sin, cos) = phi.sin_cos();
        Vector2::new(cos, sin)
    }

    fn psi_tilde(&self, _phi: f64) -> f64 {
        1.0
    }

    fn critical_curve(&self, phi: f64) -> Vector2<f64> {
        self.deflection_angle(phi)
    }

    // The caustic degenerates to the lens centre
    fn caustic_curve(&self, _phi: f64) -> Vector2<f64> {
        Vector2::zeros()
    }
}
