pub use crate::likelihood::LensLikelihood;
pub use crate::observation::{ImageFeatures, ObservedData, ObservedImage, ProperMotion};
pub use crate::parameters::{ModelParameters, SisParameters};

pub use rand::prelude::*;
pub use rand_distr::StandardNormal;

/// SIS model with the source on the lens major axis, images are at `r = 1.1` and `r = 0.9`
pub fn sis_example() -> SisParameters {
    SisParameters {
        x_s: 0.1,
        y_s: 0.0,
        g_s: 19.0,
        b_l: 1.0,
        x_l: 0.0,
        y_l: 0.0,
    }
}

/// Observations equal to the model prediction, with the same uncertainty for every feature
pub fn exact_observations(
    likelihood: &LensLikelihood,
    params: &ModelParameters,
    sigma: f64,
) -> ObservedData {
    let images = likelihood
        .predict_images(params)
        .into_iter()
        .map(|predicted| {
            let sigma = ImageFeatures {
                x: sigma,
                y: sigma,
                pm: predicted
                    .features
                    .pm
                    .map(|_| ProperMotion { dx: sigma, dy: sigma }),
                g: sigma,
            };
            ObservedImage::new(predicted.features, sigma).unwrap()
        })
        .collect();
    ObservedData::new(images).unwrap()
}
