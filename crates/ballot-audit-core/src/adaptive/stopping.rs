//! Stop / continue decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::WinnerOrder;

/// Why an operator-forced terminal state was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The operator stopped the audit.
    OperatorStop,
    /// The wall-clock budget ran out.
    TimeBudget,
    /// The configured maximum number of rounds was reached.
    MaxRounds,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::OperatorStop => write!(f, "operator stop"),
            StopReason::TimeBudget => write!(f, "time budget exhausted"),
            StopReason::MaxRounds => write!(f, "maximum rounds reached"),
        }
    }
}

/// Audit verdict after a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuditStatus {
    /// Risk limit not met; sample more ballots.
    Continue,
    /// `1 − p̂ ≤ α`: the reported outcome is confirmed.
    StopConfirmed,
    /// Every ballot has been transcribed without meeting the risk limit.
    /// The full count decides the outcome.
    StopExhausted {
        /// Outcome of counting every ballot, when the count completed.
        full_count: Option<WinnerOrder>,
    },
    /// Operator-forced or budget-forced stop.
    StopTimeOrResourceLimit {
        /// What forced the stop.
        reason: StopReason,
    },
}

impl AuditStatus {
    /// True for every state except `Continue`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuditStatus::Continue)
    }

    /// Upper-case label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            AuditStatus::Continue => "CONTINUE",
            AuditStatus::StopConfirmed => "STOP_CONFIRMED",
            AuditStatus::StopExhausted { .. } => "STOP_EXHAUSTED",
            AuditStatus::StopTimeOrResourceLimit { .. } => "STOP_TIME_OR_RESOURCE_LIMIT",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStatus::StopTimeOrResourceLimit { reason } => {
                write!(f, "{} ({})", self.label(), reason)
            }
            _ => write!(f, "{}", self.label()),
        }
    }
}

/// Compares the risk estimate against α.
#[derive(Debug, Clone, Copy)]
pub struct StoppingRule {
    risk_limit: f64,
}

impl StoppingRule {
    /// Rule for risk limit α.
    pub fn new(risk_limit: f64) -> Self {
        Self { risk_limit }
    }

    /// Apply the transition rule:
    ///
    /// 1. `1 − p̂ ≤ α` → `StopConfirmed`
    /// 2. no unsampled ballots → `StopExhausted`
    /// 3. otherwise `Continue`
    pub fn decide(&self, p_hat: f64, unsampled: u64, full_count: Option<WinnerOrder>) -> AuditStatus {
        if 1.0 - p_hat <= self.risk_limit {
            AuditStatus::StopConfirmed
        } else if unsampled == 0 {
            AuditStatus::StopExhausted { full_count }
        } else {
            AuditStatus::Continue
        }
    }
}
