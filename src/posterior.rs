use crate::error::ParametersError;
use crate::likelihood::LensLikelihood;
use crate::observation::ObservedData;
use crate::parameters::{ModelKind, ModelParameters};
use crate::prior::LensPrior;
use crate::solver::ImageSolver;

use macro_const::macro_const;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

macro_const! {
    const DOC: &str = r#"
Unnormalized posterior of a lens model given the observed lensed images

The decimal logarithm of the posterior is the sum of the decimal logarithms of the prior and
of the likelihood:

$$
\lg P(\theta | D) = \lg \pi(\theta) + \lg L(D | \theta) + \mathrm{const}.
$$

The likelihood is not evaluated for parameters out of the prior support, negative infinity
is returned instead. Models predicting a number of images different from the observed one
are rejected with negative infinity as well, so the score can be used by an optimizer or a
sampler without special handling of unphysical models. The score is never NaN.

Evaluation is pure: the same parameters and data always give the same result, and the
evaluator can be shared between threads.
"#;
}

#[doc = DOC!()]
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct LensPosterior {
    pub prior: LensPrior,
    pub likelihood: LensLikelihood,
}

impl LensPosterior {
    pub fn new(solver: ImageSolver) -> Self {
        Self {
            prior: LensPrior::default(),
            likelihood: LensLikelihood::new(solver),
        }
    }

    pub fn doc() -> &'static str {
        DOC
    }

    pub fn log10_prior(&self, params: &ModelParameters) -> f64 {
        self.prior.log10_prior(params)
    }

    pub fn log10_likelihood(&self, params: &ModelParameters, data: &ObservedData) -> f64 {
        self.likelihood.log10_likelihood(params, data)
    }

    /// Decimal logarithm of the unnormalized posterior, finite or negative infinity
    pub fn log10_posterior(&self, params: &ModelParameters, data: &ObservedData) -> f64 {
        let log10_posterior =
            combine(self.log10_prior(params), || self.log10_likelihood(params, data));
        if log10_posterior == f64::NEG_INFINITY {
            log::debug!("rejected {params:?}");
        }
        log10_posterior
    }

    /// [LensPosterior::log10_posterior] for a flat parameter vector
    ///
    /// See [ModelKind::parameter_names] for the parameter order.
    pub fn log10_posterior_flat(
        &self,
        kind: ModelKind,
        values: &[f64],
        data: &ObservedData,
    ) -> Result<f64, ParametersError> {
        let params = ModelParameters::from_slice(kind, values)?;
        Ok(self.log10_posterior(&params, data))
    }
}

/// Sum of the log-prior and the log-likelihood, the likelihood is evaluated for finite prior only
/// and NaN is replaced with negative infinity
fn combine(log10_prior: f64, log10_likelihood: impl FnOnce() -> f64) -> f64 {
    if !log10_prior.is_finite() {
        return f64::NEG_INFINITY;
    }
    let log10_posterior = log10_prior + log10_likelihood();
    if log10_posterior.is_nan() {
        return f64::NEG_INFINITY;
    }
    log10_posterior
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::SieParameters;
    use crate::tests::*;

    use approx::assert_relative_eq;
    use rayon::prelude::*;

    #[test]
    fn sum_of_prior_and_likelihood() {
        let posterior = LensPosterior::default();
        let params: ModelParameters = sis_example().into();
        let data = exact_observations(&posterior.likelihood, &params, 0.01);
        let expected = posterior.log10_prior(&params) + posterior.log10_likelihood(&params, &data);
        assert!(expected.is_finite());
        assert_relative_eq!(posterior.log10_posterior(&params, &data), expected);
    }

    #[test]
    fn three_observed_and_two_predicted_images() {
        let posterior = LensPosterior::default();
        let data = ObservedData::from_rows([
            [1.1, 0.0, 16.4, 0.01, 0.01, 0.05],
            [-0.9, 0.0, 16.6, 0.01, 0.01, 0.05],
            [0.0, 1.0, 17.0, 0.01, 0.01, 0.05],
        ])
        .unwrap();
        assert_eq!(
            posterior.log10_posterior(&sis_example().into(), &data),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn prior_short_circuit() {
        let posterior = LensPosterior::default();
        let mut params = sis_example();
        params.b_l = -1.0;
        // no observations would give zero likelihood
        let data = ObservedData::default();
        assert_eq!(
            posterior.log10_posterior(&params.into(), &data),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn nan_likelihood_is_rejected() {
        assert_eq!(combine(-3.0, || -2.0), -5.0);
        assert_eq!(combine(-3.0, || f64::NAN), f64::NEG_INFINITY);
        assert_eq!(combine(-3.0, || f64::NEG_INFINITY), f64::NEG_INFINITY);
        assert_eq!(combine(f64::NAN, || -2.0), f64::NEG_INFINITY);
        assert_eq!(
            combine(f64::NEG_INFINITY, || panic!("likelihood must not be evaluated")),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn non_finite_parameters() {
        let posterior = LensPosterior::default();
        let data = ObservedData::from_rows([[1.1, 0.0, 16.4, 0.01, 0.01, 0.05]]).unwrap();
        for values in [
            [f64::NAN, 0.0, 19.0, 1.0, 0.0, 0.0],
            [0.1, 0.0, 19.0, f64::NAN, 0.0, 0.0],
            [0.1, 0.0, 19.0, 1.0, 0.0, f64::INFINITY],
        ] {
            let score = posterior
                .log10_posterior_flat(ModelKind::Sis, &values, &data)
                .unwrap();
            assert_eq!(score, f64::NEG_INFINITY, "{values:?}");
        }
    }

    #[test]
    fn flat_parameters() {
        let posterior = LensPosterior::default();
        let params = SieParameters {
            x_s: 0.05,
            y_s: 0.03,
            g_s: 19.0,
            b_l: 1.2,
            q: 0.5,
            x_l: 0.01,
            y_l: -0.02,
            theta: 0.4,
        };
        let data = exact_observations(&posterior.likelihood, &params.into(), 0.01);
        assert_eq!(data.len(), 4);
        assert_eq!(
            posterior.log10_posterior_flat(ModelKind::Sie, &params.to_vec(), &data),
            Ok(posterior.log10_posterior(&params.into(), &data))
        );
        assert_eq!(
            posterior.log10_posterior_flat(ModelKind::Sie, &[0.0; 6], &data),
            Err(ParametersError::WrongLength {
                kind: ModelKind::Sie,
                expected: 8,
                actual: 6
            })
        );
    }

    #[test]
    fn parallel_evaluation() {
        let posterior = LensPosterior::default();
        let truth: ModelParameters = sis_example().into();
        let data = exact_observations(&posterior.likelihood, &truth, 0.02);

        let mut rng = StdRng::seed_from_u64(0);
        let candidates: Vec<Vec<f64>> = (0..256)
            .map(|_| {
                truth
                    .to_vec()
                    .into_iter()
                    .map(|x| x + 0.01 * rng.sample::<f64, _>(StandardNormal))
                    .collect()
            })
            .collect();

        let sequential: Vec<f64> = candidates
            .iter()
            .map(|values| {
                posterior
                    .log10_posterior_flat(ModelKind::Sis, values, &data)
                    .unwrap()
            })
            .collect();
        let parallel: Vec<f64> = candidates
            .par_iter()
            .map(|values| {
                posterior
                    .log10_posterior_flat(ModelKind::Sis, values, &data)
                    .unwrap()
            })
            .collect();
        assert_eq!(sequential, parallel);
        assert!(sequential.iter().all(|score| !score.is_nan()));
    }

    #[test]
    fn serialization() {
        let posterior = LensPosterior::new(ImageSolver::default().with_step(0.05));
        let json = serde_json::to_string(&posterior).unwrap();
        let restored: LensPosterior = serde_json::from_str(&json).unwrap();
        assert_eq!(posterior, restored);

        let invalid = json.replace("\"step\":0.05", "\"step\":0.0");
        assert_ne!(invalid, json);
        assert!(serde_json::from_str::<LensPosterior>(&invalid).is_err());
    }

    #[test]
    fn doc() {
        assert!(LensPosterior::doc().contains("negative infinity"));
    }
}
