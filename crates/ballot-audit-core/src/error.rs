//! Error and warning types.
//!
//! Propagation policy:
//! - [`BallotError`] aborts the admission of one ballot; the round continues.
//! - [`CountError`] aborts one trial, which is counted as discarded.
//! - [`AuditWarning`] is attached to a round report and never stops the audit.
//! - Terminal audit states (confirmed, exhausted, resource limit) are
//!   reported through [`crate::AuditStatus`], not raised as errors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::CandidateId;

/// Why a transcribed ballot was refused admission to the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BallotError {
    /// The ballot names a candidate that is not on the roster.
    UnknownCandidate {
        /// The offending id.
        candidate: CandidateId,
    },

    /// The ballot ranks the same candidate more than once.
    DuplicateCandidate {
        /// The repeated id.
        candidate: CandidateId,
    },

    /// Admitting the ballot would exceed the number of ballots cast.
    PopulationFull {
        /// Official number of ballots cast.
        total_cast: u64,
    },
}

impl fmt::Display for BallotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BallotError::UnknownCandidate { candidate } => {
                write!(f, "malformed ballot: unknown candidate id {}", candidate)
            }
            BallotError::DuplicateCandidate { candidate } => {
                write!(f, "malformed ballot: candidate {} ranked more than once", candidate)
            }
            BallotError::PopulationFull { total_cast } => write!(
                f,
                "ballot pool already holds all {} cast ballots",
                total_cast
            ),
        }
    }
}

impl std::error::Error for BallotError {}

/// The vote-counting engine rejected its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountError {
    /// A ballot references a candidate outside the roster.
    UnknownCandidate(CandidateId),

    /// Seat count is zero or exceeds the number of candidates.
    InvalidSeats {
        /// Requested seats.
        seats: usize,
        /// Candidates available.
        candidates: usize,
    },

    /// No ballot expresses any preference.
    NoBallots,

    /// A supplied tie resolution does not match the tie the count reached.
    ResolutionMismatch {
        /// Index of the tie within the count.
        step: usize,
    },

    /// The count kept reporting ties beyond the allowed number of resolutions.
    TieLimitExceeded {
        /// Resolutions supplied before giving up.
        resolutions: usize,
    },
}

impl CountError {
    /// Stable short label used to bucket discard reasons in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CountError::UnknownCandidate(_) => "unknown_candidate",
            CountError::InvalidSeats { .. } => "invalid_seats",
            CountError::NoBallots => "no_ballots",
            CountError::ResolutionMismatch { .. } => "resolution_mismatch",
            CountError::TieLimitExceeded { .. } => "tie_limit_exceeded",
        }
    }
}

impl fmt::Display for CountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountError::UnknownCandidate(id) => {
                write!(f, "ballot references unknown candidate {}", id)
            }
            CountError::InvalidSeats { seats, candidates } => write!(
                f,
                "cannot fill {} seats from {} candidates",
                seats, candidates
            ),
            CountError::NoBallots => write!(f, "no ballot expresses a preference"),
            CountError::ResolutionMismatch { step } => {
                write!(f, "tie resolution {} does not match the tie reached", step)
            }
            CountError::TieLimitExceeded { resolutions } => {
                write!(f, "count still tied after {} resolutions", resolutions)
            }
        }
    }
}

impl std::error::Error for CountError {}

/// Invalid audit configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Risk limit outside (0, 1).
    RiskLimit(f64),

    /// A count parameter that must be positive was zero.
    Zero(&'static str),

    /// A real-valued parameter is out of its allowed range.
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The candidate list is empty.
    NoCandidates,

    /// Two candidates share an id.
    DuplicateCandidate(CandidateId),

    /// Seats exceed the number of candidates.
    TooManySeats {
        /// Requested seats.
        seats: usize,
        /// Candidates available.
        candidates: usize,
    },

    /// The reported outcome names a candidate not on the roster.
    UnknownReportedWinner(CandidateId),

    /// The reported outcome does not elect exactly `seats` distinct winners.
    ReportedWinnerCount {
        /// Distinct winners reported.
        reported: usize,
        /// Seats in the contest.
        seats: usize,
    },

    /// The configuration file could not be parsed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::RiskLimit(alpha) => {
                write!(f, "risk limit must be in (0, 1), got {}", alpha)
            }
            ConfigError::Zero(name) => write!(f, "{} must be > 0", name),
            ConfigError::OutOfRange { name, value } => {
                write!(f, "{} is out of range: {}", name, value)
            }
            ConfigError::NoCandidates => write!(f, "candidate list is empty"),
            ConfigError::DuplicateCandidate(id) => {
                write!(f, "candidate id {} appears more than once", id)
            }
            ConfigError::TooManySeats { seats, candidates } => write!(
                f,
                "{} seats requested but only {} candidates",
                seats, candidates
            ),
            ConfigError::UnknownReportedWinner(id) => {
                write!(f, "reported winner {} is not a candidate", id)
            }
            ConfigError::ReportedWinnerCount { reported, seats } => write!(
                f,
                "reported outcome names {} distinct winners for {} seats",
                reported, seats
            ),
            ConfigError::Parse(message) => write!(f, "config parse error: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Official tie events cannot be turned into a total order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TieBreakError {
    /// A tie event names a candidate not on the roster.
    UnknownCandidate(CandidateId),

    /// A tie event's resolution is not drawn from its tied candidates.
    MalformedEvent {
        /// Index of the event in the supplied list.
        event: usize,
    },

    /// The events imply a preference cycle.
    Cycle {
        /// A candidate on the cycle.
        candidate: CandidateId,
    },

    /// The derived order fails to reproduce a recorded resolution.
    Inconsistent {
        /// Index of the event in the supplied list.
        event: usize,
    },
}

impl fmt::Display for TieBreakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreakError::UnknownCandidate(id) => {
                write!(f, "tie event references unknown candidate {}", id)
            }
            TieBreakError::MalformedEvent { event } => {
                write!(f, "tie event {} resolves to a candidate that was not tied", event)
            }
            TieBreakError::Cycle { candidate } => write!(
                f,
                "tie events are contradictory (cycle through candidate {})",
                candidate
            ),
            TieBreakError::Inconsistent { event } => write!(
                f,
                "derived tie-break order does not reproduce tie event {}",
                event
            ),
        }
    }
}

impl std::error::Error for TieBreakError {}

/// Round-level failures.
#[derive(Debug)]
pub enum AuditError {
    /// A round was requested after the audit reached a terminal state.
    AuditConcluded,

    /// The Monte Carlo batch was cancelled; no state was committed.
    BatchAbandoned {
        /// Round whose batch was abandoned.
        round: u32,
    },

    /// Invalid configuration.
    Config(ConfigError),

    /// Tie events could not be turned into an order.
    TieBreak(TieBreakError),
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditError::AuditConcluded => write!(f, "audit has already concluded"),
            AuditError::BatchAbandoned { round } => {
                write!(f, "trial batch for round {} was abandoned", round)
            }
            AuditError::Config(e) => write!(f, "configuration error: {}", e),
            AuditError::TieBreak(e) => write!(f, "tie-break error: {}", e),
        }
    }
}

impl std::error::Error for AuditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuditError::Config(e) => Some(e),
            AuditError::TieBreak(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for AuditError {
    fn from(e: ConfigError) -> Self {
        AuditError::Config(e)
    }
}

impl From<TieBreakError> for AuditError {
    fn from(e: TieBreakError) -> Self {
        AuditError::TieBreak(e)
    }
}

/// Non-fatal conditions surfaced alongside a round's estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditWarning {
    /// Valid trials fell below the precision floor; p̂ is noisier than the
    /// configured target.
    InsufficientTrials {
        /// Trials that produced an outcome.
        valid: u64,
        /// Trials needed for the precision target.
        required: u64,
    },

    /// The engine rejected an unusually large share of simulated populations.
    HighDiscardRate {
        /// Discarded / requested.
        rate: f64,
    },

    /// Some transcribed ballots were rejected at admission.
    RejectedBallots {
        /// Number rejected this round.
        count: usize,
    },
}

impl fmt::Display for AuditWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditWarning::InsufficientTrials { valid, required } => write!(
                f,
                "only {} valid trials, {} needed for target precision",
                valid, required
            ),
            AuditWarning::HighDiscardRate { rate } => {
                write!(f, "{:.2}% of trials discarded", rate * 100.0)
            }
            AuditWarning::RejectedBallots { count } => {
                write!(f, "{} malformed ballots rejected", count)
            }
        }
    }
}
