//! Singular isothermal lens models
//!
//! All functions work in the normalized lens frame: angles are measured from the lens major
//! axis and lengths are in units of the Einstein radius. Image positions are given in polar
//! coordinates `(r, phi)`, source positions `y = (y1, y2)` in Cartesian coordinates.
//!
//! The lens equation `y = x - alpha(phi)` of a singular isothermal lens splits into a radial and
//! a tangential part. The tangential part,
//!
//! $$
//! (y_1 + \alpha_1(\phi)) \sin\phi - (y_2 + \alpha_2(\phi)) \cos\phi = 0,
//! $$
//!
//! depends on the polar angle only and is solved numerically by [ImageSolver](crate::ImageSolver),
//! the radial part gives the image radius in closed form:
//! $r(\phi) = y_1 \cos\phi + y_2 \sin\phi + \tilde\psi(\phi)$.

use enum_dispatch::enum_dispatch;
use nalgebra::{Matrix2, Vector2};
use ndarray::Array2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

mod sie;
pub use sie::SieLens;

mod sis;
pub use sis::SisLens;

/// Closed-form physics of a lens model
#[enum_dispatch]
pub trait LensTrait {
    /// Axis ratio of the lens, unity for a spherical lens
    fn axis_ratio(&self) -> f64;

    /// Dimensionless surface mass density at the image position
    ///
    /// $\kappa = \sqrt{q} / (2 r \sqrt{\cos^2\phi + q^2 \sin^2\phi})$, `1 / (2 r)` for `q = 1`.
    fn kappa(&self, r: f64, phi: f64) -> f64 {
        let q = self.axis_ratio();
        let (sin, cos) = phi.sin_cos();
        q.sqrt() / (2.0 * r * f64::sqrt(cos.powi(2) + q.powi(2) * sin.powi(2)))
    }

    /// Deflection angle as a function of the image polar angle
    fn deflection_angle(&self, phi: f64) -> Vector2<f64>;

    /// Radial projection of the deflection angle
    fn psi_tilde(&self, phi: f64) -> f64 {
        let (sin, cos) = phi.sin_cos();
        let alpha = self.deflection_angle(phi);
        alpha.x * cos + alpha.y * sin
    }

    /// Signed magnification, infinite on the critical curve
    fn magnification(&self, r: f64, phi: f64) -> f64 {
        1.0 / (1.0 - 2.0 * self.kappa(r, phi))
    }

    /// Symmetric distortion matrix, `det A = 1 / magnification`
    ///
    /// The matrix is singular on the critical curve, its inverse maps source-plane proper motion
    /// to image-plane proper motion.
    fn distortion_matrix(&self, r: f64, phi: f64) -> Matrix2<f64> {
        let kappa = self.kappa(r, phi);
        let (sin, cos) = phi.sin_cos();
        let a11 = 1.0 - 2.0 * kappa * sin.powi(2);
        let a12 = kappa * (2.0 * phi).sin();
        let a22 = 1.0 - 2.0 * kappa * cos.powi(2);
        Matrix2::new(a11, a12, a12, a22)
    }

    /// Limit of the lens equation for `r -> 0`
    fn cut_curve(&self, phi: f64) -> Vector2<f64> {
        -self.deflection_angle(phi)
    }

    /// Image-plane curve where the distortion matrix is singular
    fn critical_curve(&self, phi: f64) -> Vector2<f64> {
        // kappa is proportional to 1/r, so kappa(r_crit) = 1/2 gives r_crit = 2 kappa(1)
        let r = 2.0 * self.kappa(1.0, phi);
        let (sin, cos) = phi.sin_cos();
        Vector2::new(r * cos, r * sin)
    }

    /// Source-plane image of the critical curve
    fn caustic_curve(&self, phi: f64) -> Vector2<f64> {
        self.critical_curve(phi) - self.deflection_angle(phi)
    }

    /// Tangential mismatch of the lens equation for the source position `y`
    fn lens_equation_residual(&self, phi: f64, y: &Vector2<f64>) -> f64 {
        let (sin, cos) = phi.sin_cos();
        let alpha = self.deflection_angle(phi);
        (y.x + alpha.x) * sin - (y.y + alpha.y) * cos
    }

    /// Image radius solving the radial part of the lens equation
    ///
    /// The radius is negative for the counter-image of a source lying outside of the cut.
    fn image_radius(&self, phi: f64, y: &Vector2<f64>) -> f64 {
        let (sin, cos) = phi.sin_cos();
        y.x * cos + y.y * sin + self.psi_tilde(phi)
    }
}

/// Lens model: singular isothermal sphere or ellipsoid
#[enum_dispatch(LensTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum Lens {
    Sis(SisLens),
    Sie(SieLens),
}

impl Lens {
    pub fn sis() -> Self {
        SisLens {}.into()
    }

    pub fn sie(q: f64) -> Self {
        SieLens::new(q).into()
    }
}

/// Characteristic curve of a lens
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum Curve {
    Cut,
    Critical,
    Caustic,
}

impl Curve {
    pub fn eval<L: LensTrait>(self, lens: &L, phi: f64) -> Vector2<f64> {
        match self {
            Self::Cut => lens.cut_curve(phi),
            Self::Critical => lens.critical_curve(phi),
            Self::Caustic => lens.caustic_curve(phi),
        }
    }
}

/// Sample a curve at `n` equally spaced polar angles in `[0, 2 pi)`
///
/// Returns an `n x 2` array of Cartesian points, one row per angle.
pub fn tabulate_curve<L: LensTrait>(lens: &L, curve: Curve, n: usize) -> Array2<f64> {
    let mut table = Array2::zeros((n, 2));
    for (i, mut row) in table.rows_mut().into_iter().enumerate() {
        let phi = TAU * (i as f64) / (n as f64);
        let point = curve.eval(lens, phi);
        row[0] = point.x;
        row[1] = point.y;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn magnification_is_inverse_determinant() {
        for lens in [Lens::sis(), Lens::sie(0.3), Lens::sie(0.8)] {
            for &(r, phi) in &[(0.4, 0.3), (1.7, 2.1), (2.5, 4.0), (0.9, 5.9)] {
                let det = lens.distortion_matrix(r, phi).determinant();
                assert_relative_eq!(lens.magnification(r, phi), det.recip(), max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn critical_curve_is_singular() {
        for lens in [Lens::sis(), Lens::sie(0.5)] {
            for &phi in &[0.0, 0.7, 2.0, 3.3, 5.0] {
                let x = lens.critical_curve(phi);
                let r = x.norm();
                assert_relative_eq!(lens.kappa(r, phi), 0.5, max_relative = 1e-12);
                assert!(lens.distortion_matrix(r, phi).determinant().abs() < 1e-12);
            }
        }
    }

    #[test]
    fn cut_is_lens_equation_at_zero_radius() {
        let lens = Lens::sie(0.6);
        for &phi in &[0.2, 1.4, 3.0, 4.5] {
            let y = lens.cut_curve(phi);
            assert!(lens.lens_equation_residual(phi, &y).abs() < 1e-12);
            assert!(lens.image_radius(phi, &y).abs() < 1e-12);
        }
    }

    #[test]
    fn tabulated_curve_shape() {
        let lens = Lens::sie(0.5);
        let table = tabulate_curve(&lens, Curve::Caustic, 100);
        assert_eq!(table.shape(), &[100, 2]);
        let first = lens.caustic_curve(0.0);
        assert_relative_eq!(table[[0, 0]], first.x);
        assert_relative_eq!(table[[0, 1]], first.y);
    }

    #[test]
    fn kappa_follows_axis_ratio() {
        assert_eq!(Lens::sis().axis_ratio(), 1.0);
        assert_eq!(Lens::sie(0.3).axis_ratio(), 0.3);
        for &(r, phi) in &[(0.5, 0.0), (1.0, 1.2), (2.0, 4.4)] {
            assert_relative_eq!(Lens::sis().kappa(r, phi), 0.5 / r, max_relative = 1e-15);
            assert_relative_eq!(
                Lens::sie(1.0).kappa(r, phi),
                Lens::sis().kappa(r, phi),
                max_relative = 1e-15
            );
        }
    }

    #[test]
    fn lens_serialization() {
        let lens = Lens::sie(0.25);
        let json = serde_json::to_string(&lens).unwrap();
        let restored: Lens = serde_json::from_str(&json).unwrap();
        assert_eq!(lens, restored);
    }
}
