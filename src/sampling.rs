//! Adapter exposing [LensPosterior] to the `emcee` ensemble sampler

use crate::observation::ObservedData;
use crate::parameters::{ModelKind, ModelParameters};
use crate::posterior::LensPosterior;

use emcee::{Guess, Prob};
use std::f64::consts::LN_10;

/// Lens model posterior as a [Prob] target for [emcee::EnsembleSampler]
///
/// Walker positions are flat parameter vectors in the [ModelKind::parameter_names] order.
/// The sampler works with natural logarithms, so decimal log-densities are converted.
#[derive(Clone, Debug)]
pub struct EmceeTarget<'a> {
    pub posterior: &'a LensPosterior,
    pub kind: ModelKind,
    pub data: &'a ObservedData,
}

impl<'a> EmceeTarget<'a> {
    pub fn new(posterior: &'a LensPosterior, kind: ModelKind, data: &'a ObservedData) -> Self {
        Self {
            posterior,
            kind,
            data,
        }
    }

    /// Number of sampled dimensions
    pub fn ndim(&self) -> usize {
        self.kind.nparams()
    }

    fn params(&self, guess: &Guess) -> Option<ModelParameters> {
        let values: Vec<f64> = guess.values.iter().map(|&x| x as f64).collect();
        match ModelParameters::from_slice(self.kind, &values) {
            Ok(params) => Some(params),
            Err(error) => {
                log::warn!("rejecting walker position: {error}");
                None
            }
        }
    }
}

fn to_ln(log10_density: f64) -> f32 {
    (log10_density * LN_10) as f32
}

impl Prob for EmceeTarget<'_> {
    fn lnlike(&self, params: &Guess) -> f32 {
        self.params(params).map_or(f32::NEG_INFINITY, |params| {
            to_ln(self.posterior.log10_likelihood(&params, self.data))
        })
    }

    fn lnprior(&self, params: &Guess) -> f32 {
        self.params(params).map_or(f32::NEG_INFINITY, |params| {
            to_ln(self.posterior.log10_prior(&params))
        })
    }

    fn lnprob(&self, params: &Guess) -> f32 {
        self.params(params).map_or(f32::NEG_INFINITY, |params| {
            to_ln(self.posterior.log10_posterior(&params, self.data))
        })
    }
}
