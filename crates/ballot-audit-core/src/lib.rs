//! Core statistical engine for Bayesian ballot-polling audits.
//!
//! This crate decides, after each round of hand-transcribed ballot sampling,
//! whether the evidence confirms a reported ranked-choice outcome under a
//! risk limit α. It has no file or terminal I/O; the `ballot-audit` crate
//! layers configuration, data loading, reporting and the CLI on top.
//!
//! # Features
//!
//! - `parallel` (default): Run Monte Carlo trials on the rayon thread pool.
//!   Results are bit-identical with and without this feature, because each
//!   trial owns an RNG substream derived from the round seed and its index.
//!
//! # Pipeline
//!
//! ```text
//! BallotPool ──snapshot──▶ PosteriorSampler ──N populations──▶ OutcomeSimulator
//!                                                              (VoteCounter + TieBreakOracle)
//!                                                                      │
//!        SampleSizeAdvisor ◀── StoppingRule ◀── RiskEstimator ◀────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use ballot_audit_core::{
//!     adaptive::{audit_round, AuditState, RoundConfig, RoundContext},
//!     tabulation::Stv,
//!     tiebreak::TieBreakOracle,
//!     AuditContext,
//! };
//!
//! let state = AuditState::new(&context);
//! let ctx = RoundContext::new(&context, &config, &Stv, &oracle);
//! let outcome = audit_round(&state, &ctx, round_one_ballots)?;
//! println!("p̂ = {:.3}, status = {}", outcome.report.p_hat, outcome.report.status);
//! ```

pub mod adaptive;
pub mod constants;
pub mod contest;
pub mod error;
pub mod pool;
pub mod posterior;
pub mod result;
pub mod risk;
pub mod seed;
pub mod simulate;
pub mod tabulation;
pub mod tiebreak;
pub mod types;

// Re-export commonly used items at crate root
pub use adaptive::{
    audit_round, audit_round_cancellable, AuditState, AuditStatus, EscalationPolicy, RoundConfig,
    RoundContext, RoundOutcome, RoundRecord, SampleSizeAdvisor, StopReason, StoppingRule,
};
pub use contest::AuditContext;
pub use error::{AuditError, AuditWarning, BallotError, ConfigError, CountError, TieBreakError};
pub use pool::{AdmissionReport, BallotPool, PoolSnapshot, RejectedBallot};
pub use posterior::{PosteriorSampler, PriorConfig, ResamplingPolicy, SimulatedPopulation};
pub use result::{CandidateWinRate, OutcomeFrequency, RoundReport, TrialSummary};
pub use risk::{
    min_trials_for_precision, monte_carlo_standard_error, PrecisionTarget, RiskEstimate,
    RiskEstimator, TrialTally,
};
pub use simulate::{OutcomeSimulator, TrialOutcome};
pub use tabulation::{BallotGroup, Borda, CountInput, Stv, Tally, TieSignal, VoteCounter};
pub use tiebreak::{TieBreakOracle, TieBreakOrder, TieEvent, TieKind, TieResolution};
pub use types::{
    Ballot, Candidate, CandidateId, CandidateRoster, Provenance, Ranking, ReportedOutcome,
    WinnerOrder, WinnerSet,
};
