mod lens_prior;
pub use lens_prior::LensPrior;

pub mod ln_prior_1d;
pub use ln_prior_1d::{LnPrior1D, LnPrior1DTrait};
