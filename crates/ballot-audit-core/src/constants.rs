//! Default values and fixed parameters used throughout the crate.

/// Default deterministic master seed for Monte Carlo trials.
///
/// Same seed + same ballots + same trial count = same risk estimate,
/// regardless of worker count. The value is "audits" encoded in ASCII.
pub const DEFAULT_SEED: u64 = 0x6175_6469_7473;

/// Default risk limit α.
pub const DEFAULT_RISK_LIMIT: f64 = 0.05;

/// Default number of Monte Carlo trials per round.
pub const DEFAULT_TRIALS: u64 = 5_000;

/// Default pseudocount added to every observed ballot pattern.
pub const DEFAULT_PATTERN_PSEUDOCOUNT: f64 = 0.0;

/// Default gamma shape of the unseen-pattern (prior ballot) mass.
pub const DEFAULT_UNSEEN_PSEUDOCOUNT: f64 = 1.0;

/// Default size of the first sampling round.
pub const DEFAULT_INITIAL_ROUND_SIZE: u64 = 100;

/// Default relative precision of the risk estimate at the decision boundary.
pub const DEFAULT_RELATIVE_PRECISION: f64 = 0.25;

/// Default normal quantile for the precision guideline (≈95% two-sided).
pub const DEFAULT_PRECISION_Z: f64 = 1.96;

/// Discard rate above which a round carries a `HighDiscardRate` warning.
pub const DEFAULT_MAX_DISCARD_RATE: f64 = 0.01;

/// Ranked-pairs solves per trial under pairwise resampling; larger
/// populations are rebuilt in equal blocks of ballots.
pub const PAIRWISE_MAX_SOLVES: u64 = 256;

/// Win rate below which a candidate's report carries a witness trial.
pub const LOW_FREQUENCY_WIN_RATE: f64 = 0.03;

/// Tolerance for comparing fractional STV tallies.
pub const TALLY_EPSILON: f64 = 1e-9;

/// Extra tie resolutions allowed per count beyond one per candidate step.
pub const TIE_RESOLUTION_SLACK: usize = 4;
