//! Posterior-predictive imputation of the unsampled ballots.
//!
//! Observed ballots are always carried into a trial unchanged; only the
//! `unsampled` remainder is drawn. Imputed ballots are kept as per-pattern
//! counts rather than materialised, so a trial costs O(patterns), not
//! O(total_cast). Pairwise resampling adds rebuilt rankings, also as counts.

mod pairwise;
mod patterns;
mod policy;
mod population;
mod sampler;

pub use pairwise::PreferenceMatrix;
pub use patterns::PatternTable;
pub use policy::{PriorConfig, ResamplingPolicy};
pub use population::SimulatedPopulation;
pub use sampler::PosteriorSampler;
