//! Monte Carlo estimate of the probability that the reported outcome is right.

mod estimator;
mod precision;
mod tally;

pub use estimator::{RiskEstimate, RiskEstimator};
pub use precision::{min_trials_for_precision, monte_carlo_standard_error, PrecisionTarget};
pub use tally::{OutcomeCount, TrialTally};
