use crate::error::SolverError;
use crate::lens::LensTrait;
use crate::root_finding::brent;

use itertools::Itertools;
use nalgebra::Vector2;
use ndarray::Array1;
use ordered_float::NotNan;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Lensed image in the polar coordinates of the normalized lens frame
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Image {
    /// Radius in Einstein radii, negative for the counter-image of a source outside of the cut
    pub r: f64,
    /// Polar angle in `[0, 2 pi)`, measured from the lens major axis
    pub phi: f64,
}

impl Image {
    /// Cartesian position in the normalized lens frame
    pub fn position(&self) -> Vector2<f64> {
        let (sin, cos) = self.phi.sin_cos();
        Vector2::new(self.r * cos, self.r * sin)
    }
}

/// Lens-equation solver
///
/// The tangential lens equation is tabulated on a fixed grid of polar angles with `step`
/// spacing. Every grid interval where the residual changes its sign brackets an image, which is
/// refined by Brent's method to `xtol + rtol * |phi|` accuracy. The grid is periodic: the last
/// interval ends at `2 pi` and reuses the residual value at zero, so the number of brackets,
/// and therefore of images, is always even.
///
/// Two roots inside the same grid interval cancel each other and are missed, as is a tangent
/// root of a source lying on the caustic. `step` controls this trade-off between precision and
/// the number of residual evaluations.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(try_from = "ImageSolverParameters", into = "ImageSolverParameters")]
pub struct ImageSolver {
    step: NotNan<f64>,
    xtol: NotNan<f64>,
    rtol: NotNan<f64>,
    max_iterations: u32,
}

impl ImageSolver {
    /// Create a new [ImageSolver]
    ///
    /// # Arguments
    /// - `step`: polar angle spacing of the coarse scan, radians
    /// - `xtol`: absolute tolerance of the refined polar angle
    /// - `rtol`: relative tolerance of the refined polar angle
    /// - `max_iterations`: maximum number of refinement iterations per image
    ///
    /// # Panics
    ///
    /// If the arguments are invalid, see [ImageSolver::try_new] for a fallible version.
    pub fn new(step: f64, xtol: f64, rtol: f64, max_iterations: u32) -> Self {
        match Self::try_new(step, xtol, rtol, max_iterations) {
            Ok(solver) => solver,
            Err(error) => panic!("{error}"),
        }
    }

    /// Create a new [ImageSolver], checking that `step` is positive and finite, tolerances are
    /// non-negative and finite and `max_iterations` is positive
    pub fn try_new(
        step: f64,
        xtol: f64,
        rtol: f64,
        max_iterations: u32,
    ) -> Result<Self, SolverError> {
        let step = match NotNan::new(step) {
            Ok(step) if step.is_finite() && *step > 0.0 => step,
            _ => return Err(SolverError::InvalidStep(step)),
        };
        let tolerance = |name, value: f64| match NotNan::new(value) {
            Ok(tol) if tol.is_finite() && *tol >= 0.0 => Ok(tol),
            _ => Err(SolverError::InvalidTolerance { name, value }),
        };
        if max_iterations == 0 {
            return Err(SolverError::ZeroIterations);
        }
        Ok(Self {
            step,
            xtol: tolerance("xtol", xtol)?,
            rtol: tolerance("rtol", rtol)?,
            max_iterations,
        })
    }

    /// Copy of this solver with another scan step
    pub fn with_step(&self, step: f64) -> Self {
        Self::new(step, self.xtol(), self.rtol(), self.max_iterations)
    }

    pub fn step(&self) -> f64 {
        self.step.into_inner()
    }

    pub fn xtol(&self) -> f64 {
        self.xtol.into_inner()
    }

    pub fn rtol(&self) -> f64 {
        self.rtol.into_inner()
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    #[inline]
    pub fn default_step() -> f64 {
        0.1
    }

    #[inline]
    pub fn default_xtol() -> f64 {
        2e-12
    }

    #[inline]
    pub fn default_rtol() -> f64 {
        4.0 * f64::EPSILON
    }

    #[inline]
    pub fn default_max_iterations() -> u32 {
        100
    }

    /// Images of the source at `(y1, y2)`, ordered by polar angle
    ///
    /// The source position is relative to the lens centre in the lens frame and in Einstein
    /// radii. Returns 0, 2 or 4 images. A source exactly at the centre of a spherical lens has
    /// no isolated images, and an empty vector is returned.
    pub fn solve<L>(&self, lens: &L, y1: f64, y2: f64) -> Vec<Image>
    where
        L: LensTrait + ?Sized,
    {
        let y = Vector2::new(y1, y2);
        let residual = |phi: f64| lens.lens_equation_residual(phi, &y);

        let mut samples: Vec<(f64, f64)> = Array1::range(0.0, TAU, self.step())
            .iter()
            .map(|&phi| (phi, residual(phi)))
            .collect();
        if let Some(&(_, at_zero)) = samples.first() {
            samples.push((TAU, at_zero));
        }

        let mut images: Vec<Image> = samples
            .iter()
            .tuple_windows()
            .filter(|((_, f_lo), (_, f_hi))| (*f_lo > 0.0) != (*f_hi > 0.0))
            .filter_map(|(&lo, &hi)| {
                match brent(
                    residual,
                    lo,
                    hi,
                    self.xtol(),
                    self.rtol(),
                    self.max_iterations,
                ) {
                    Ok(phi) => {
                        log::trace!("image bracketed by [{}, {}] refined to {}", lo.0, hi.0, phi);
                        Some(phi)
                    }
                    Err(error) => {
                        log::warn!("skipping image bracket [{}, {}]: {}", lo.0, hi.0, error);
                        None
                    }
                }
            })
            .map(|phi| {
                let phi = phi.rem_euclid(TAU);
                Image {
                    r: lens.image_radius(phi, &y),
                    phi,
                }
            })
            .collect();
        // a root at the very end of the closing interval wraps to zero
        images.sort_by(|a, b| a.phi.total_cmp(&b.phi));
        images
    }
}

impl Default for ImageSolver {
    fn default() -> Self {
        Self::new(
            Self::default_step(),
            Self::default_xtol(),
            Self::default_rtol(),
            Self::default_max_iterations(),
        )
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "ImageSolver")]
struct ImageSolverParameters {
    step: f64,
    xtol: f64,
    rtol: f64,
    max_iterations: u32,
}

impl From<ImageSolver> for ImageSolverParameters {
    fn from(f: ImageSolver) -> Self {
        Self {
            step: f.step(),
            xtol: f.xtol(),
            rtol: f.rtol(),
            max_iterations: f.max_iterations(),
        }
    }
}

impl TryFrom<ImageSolverParameters> for ImageSolver {
    type Error = SolverError;

    fn try_from(p: ImageSolverParameters) -> Result<Self, Self::Error> {
        Self::try_new(p.step, p.xtol, p.rtol, p.max_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::{Lens, SieLens, SisLens};
    use crate::tests::*;

    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn check_images<L: LensTrait>(lens: &L, y1: f64, y2: f64, images: &[Image]) {
        let y = Vector2::new(y1, y2);
        assert_eq!(images.len() % 2, 0, "odd number of images: {images:?}");
        assert!(images.len() <= 4, "too many images: {images:?}");
        for image in images {
            assert!((0.0..TAU).contains(&image.phi), "{image:?}");
            let residual = lens.lens_equation_residual(image.phi, &y);
            assert!(residual.abs() <= 1e-8, "residual {residual} for {image:?}");
            assert_relative_eq!(image.r, lens.image_radius(image.phi, &y));
        }
        assert!(images.iter().tuple_windows().all(|(a, b)| a.phi < b.phi));
    }

    #[test]
    fn sis_source_on_major_axis() {
        let images = ImageSolver::default().solve(&SisLens {}, 0.1, 0.0);
        assert_eq!(images.len(), 2);
        assert_relative_eq!(images[0].phi, 0.0, epsilon = 1e-10);
        assert_relative_eq!(images[0].r, 1.1, max_relative = 1e-10);
        assert_relative_eq!(images[1].phi, PI, max_relative = 1e-10);
        assert_relative_eq!(images[1].r, 0.9, max_relative = 1e-10);
    }

    #[test]
    fn sis_always_two_images() {
        let mut rng = StdRng::seed_from_u64(0);
        let solver = ImageSolver::default();
        let lens = SisLens {};
        for _ in 0..1000 {
            let (y1, y2) = (rng.random_range(-1.5..1.5), rng.random_range(-1.5..1.5));
            let images = solver.solve(&lens, y1, y2);
            assert_eq!(images.len(), 2, "source ({y1}, {y2})");
            check_images(&lens, y1, y2, &images);
            // images lie on the line through the source and the lens centre
            let y = Vector2::new(y1, y2);
            assert_relative_eq!(
                (images[0].phi - images[1].phi).abs(),
                PI,
                max_relative = 1e-9
            );
            assert_relative_eq!(images[0].r + images[1].r, 2.0, max_relative = 1e-9);
            assert_relative_eq!(
                (images[0].r - images[1].r).abs(),
                2.0 * y.norm(),
                max_relative = 1e-8
            );
        }
    }

    #[test]
    fn sis_centred_source_is_degenerate() {
        assert!(ImageSolver::default().solve(&SisLens {}, 0.0, 0.0).is_empty());
    }

    #[test]
    fn sie_inside_caustic() {
        let solver = ImageSolver::default();
        for &(q, y1, y2) in &[(0.5, 0.05, 0.03), (0.8, 0.03, 0.02), (0.3, -0.05, 0.1)] {
            let lens = SieLens::new(q);
            let images = solver.solve(&lens, y1, y2);
            assert_eq!(images.len(), 4, "q = {q}, source ({y1}, {y2})");
            check_images(&lens, y1, y2, &images);
            assert!(images.iter().all(|image| image.r > 0.0));
        }
    }

    #[test]
    fn sie_between_caustic_and_cut() {
        let solver = ImageSolver::default();
        for &(q, y1, y2) in &[(0.5, 0.6, 0.02), (0.5, 0.1, 0.7), (0.8, -0.3, 0.3)] {
            let lens = SieLens::new(q);
            let images = solver.solve(&lens, y1, y2);
            assert_eq!(images.len(), 2, "q = {q}, source ({y1}, {y2})");
            check_images(&lens, y1, y2, &images);
        }
    }

    #[test]
    fn sie_even_number_of_images() {
        let mut rng = StdRng::seed_from_u64(1);
        let solver = ImageSolver::default();
        for _ in 0..500 {
            let q = rng.random_range(0.05..1.0);
            let (y1, y2) = (rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
            let lens = Lens::sie(q);
            let images = solver.solve(&lens, y1, y2);
            check_images(&lens, y1, y2, &images);
        }
    }

    #[test]
    fn coarse_scan_misses_images() {
        let lens = SieLens::new(0.5);
        let fine = ImageSolver::default().solve(&lens, 0.05, 0.03);
        assert_eq!(fine.len(), 4);
        let coarse = ImageSolver::default().with_step(PI).solve(&lens, 0.05, 0.03);
        assert_eq!(coarse.len(), 2);
        check_images(&lens, 0.05, 0.03, &coarse);
    }

    #[test]
    fn nan_lens_has_no_images() {
        assert!(ImageSolver::default().solve(&SieLens::new(2.0), 0.1, 0.1).is_empty());
    }

    #[test]
    fn solver_serialization() {
        let solver = ImageSolver::default().with_step(0.05);
        let json = serde_json::to_string(&solver).unwrap();
        let restored: ImageSolver = serde_json::from_str(&json).unwrap();
        assert_eq!(solver, restored);
    }

    #[test]
    #[should_panic(expected = "step must be positive")]
    fn zero_step() {
        let _ = ImageSolver::default().with_step(0.0);
    }

    #[test]
    fn invalid_arguments() {
        assert_eq!(
            ImageSolver::try_new(-0.1, 0.0, 0.0, 100),
            Err(SolverError::InvalidStep(-0.1))
        );
        assert!(matches!(
            ImageSolver::try_new(f64::INFINITY, 0.0, 0.0, 100),
            Err(SolverError::InvalidStep(_))
        ));
        assert!(matches!(
            ImageSolver::try_new(f64::NAN, 0.0, 0.0, 100),
            Err(SolverError::InvalidStep(_))
        ));
        assert_eq!(
            ImageSolver::try_new(0.1, -1e-12, 0.0, 100),
            Err(SolverError::InvalidTolerance {
                name: "xtol",
                value: -1e-12
            })
        );
        assert!(matches!(
            ImageSolver::try_new(0.1, 0.0, f64::NAN, 100),
            Err(SolverError::InvalidTolerance { name: "rtol", .. })
        ));
        assert_eq!(
            ImageSolver::try_new(0.1, 0.0, 0.0, 0),
            Err(SolverError::ZeroIterations)
        );
        assert!(ImageSolver::try_new(0.1, 0.0, 0.0, 1).is_ok());
    }

    #[test]
    fn invalid_serialized_solver_is_rejected() {
        let valid = r#"{"step":0.1,"xtol":2e-12,"rtol":1e-15,"max_iterations":100}"#;
        let solver: ImageSolver = serde_json::from_str(valid).unwrap();
        assert_eq!(solver.solve(&SieLens::new(0.5), 0.05, 0.03).len(), 4);

        for invalid in [
            r#"{"step":0.0,"xtol":2e-12,"rtol":1e-15,"max_iterations":100}"#,
            r#"{"step":-0.1,"xtol":2e-12,"rtol":1e-15,"max_iterations":100}"#,
            r#"{"step":0.1,"xtol":-2e-12,"rtol":1e-15,"max_iterations":100}"#,
            r#"{"step":0.1,"xtol":2e-12,"rtol":-1.0,"max_iterations":100}"#,
            r#"{"step":0.1,"xtol":2e-12,"rtol":1e-15,"max_iterations":0}"#,
        ] {
            assert!(
                serde_json::from_str::<ImageSolver>(invalid).is_err(),
                "{invalid}"
            );
        }
    }
}
