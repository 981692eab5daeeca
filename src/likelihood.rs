use crate::lens::LensTrait;
use crate::observation::{ImageFeatures, ObservedData, ObservedImage};
use crate::parameters::ModelParameters;
use crate::solver::{Image, ImageSolver};

use itertools::izip;
use nalgebra::{Matrix2, Rotation2, Vector2};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::{LOG10_E, TAU};

/// Image predicted by a lens model
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PredictedImage {
    /// Solution of the lens equation in the normalized lens frame
    pub image: Image,
    /// Signed magnification
    pub magnification: f64,
    /// Observable features on the sky
    pub features: ImageFeatures,
}

/// Likelihood of observed lensed images
///
/// Each predicted image is scored against the observed image of the same index with a
/// normal distribution of diagonal covariance, uncertainties are taken from the observation.
/// No image matching is performed: images are predicted in the order of their polar angle in
/// the lens frame, and the observations must follow the same order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct LensLikelihood {
    pub solver: ImageSolver,
}

impl LensLikelihood {
    pub fn new(solver: ImageSolver) -> Self {
        Self { solver }
    }

    /// Solve the lens equation and transform the images into the observable features
    ///
    /// Image positions are rotated by the lens orientation, scaled by the Einstein radius and
    /// shifted by the lens position. Image magnitude is the source magnitude corrected by the
    /// magnification. Proper motion is the source proper motion transformed by the inverse
    /// distortion matrix and rotated to the sky frame, it is NaN if the matrix is singular.
    pub fn predict_images(&self, params: &ModelParameters) -> Vec<PredictedImage> {
        let geometry = params.geometry();
        let rotation = Rotation2::new(geometry.orientation);
        self.solver
            .solve(&geometry.lens, geometry.source.x, geometry.source.y)
            .into_iter()
            .map(|image| {
                let magnification = geometry.lens.magnification(image.r, image.phi);
                let position = geometry.lens_position
                    + geometry.einstein_radius * (rotation * image.position());
                let pm = geometry.source_pm.map(|source_pm| {
                    let distortion = geometry.lens.distortion_matrix(image.r, image.phi);
                    image_proper_motion(distortion, &rotation, source_pm).into()
                });
                PredictedImage {
                    image,
                    magnification,
                    features: ImageFeatures {
                        x: position.x,
                        y: position.y,
                        pm,
                        g: geometry.source_magnitude - 2.5 * magnification.abs().log10(),
                    },
                }
            })
            .collect()
    }

    /// Decimal logarithm of the likelihood
    ///
    /// Negative infinity is returned if the number of predicted images differs from the number
    /// of observed ones, or if the observations have proper motion and the model has not, or
    /// vice versa.
    pub fn log10_likelihood(&self, params: &ModelParameters, data: &ObservedData) -> f64 {
        let kind = params.kind();
        if let Some(has_pm) = data.has_proper_motion() {
            if has_pm != kind.has_proper_motion() {
                log::debug!("{kind} model cannot be compared with observations of another layout");
                return f64::NEG_INFINITY;
            }
        }

        let predicted = self.predict_images(params);
        if predicted.len() != data.len() {
            log::debug!(
                "{} images are predicted, but {} are observed",
                predicted.len(),
                data.len()
            );
            return f64::NEG_INFINITY;
        }

        let ln_likelihood: f64 = predicted
            .iter()
            .zip(data.images())
            .map(|(predicted, observed)| ln_normal(&predicted.features, observed))
            .sum();
        ln_likelihood * LOG10_E
    }
}

/// Sky-frame proper motion of an image, NaN for a singular distortion matrix
fn image_proper_motion(
    distortion: Matrix2<f64>,
    rotation: &Rotation2<f64>,
    source_pm: Vector2<f64>,
) -> Vector2<f64> {
    distortion.try_inverse().map_or_else(
        || Vector2::repeat(f64::NAN),
        |inverse| rotation * (inverse * source_pm),
    )
}

/// Natural logarithm of the normal density with diagonal covariance, NaN features give NaN
fn ln_normal(predicted: &ImageFeatures, observed: &ObservedImage) -> f64 {
    izip!(
        predicted.to_vec(),
        observed.value().to_vec(),
        observed.sigma().to_vec()
    )
    .map(|(x, mu, sigma)| {
        let z = (x - mu) / sigma;
        -0.5 * f64::ln(TAU) - f64::ln(sigma) - 0.5 * z.powi(2)
    })
    .sum()
}
