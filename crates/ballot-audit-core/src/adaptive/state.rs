//! Audit state threaded through round boundaries.

use serde::{Deserialize, Serialize};

use crate::contest::AuditContext;
use crate::pool::BallotPool;

use super::{AuditStatus, StopReason};

/// One completed round, as kept in the audit history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number, from 1.
    pub round: u32,
    /// Cumulative observed ballots after the round.
    pub observed: u64,
    /// Estimated probability the reported outcome is correct.
    pub p_hat: f64,
    /// `1 − p_hat`.
    pub risk: f64,
    /// Verdict after the round.
    pub status: AuditStatus,
    /// Proposed size of the next round, when continuing.
    pub next_sample_size: Option<u64>,
}

/// Everything the audit carries between rounds.
///
/// Never mutated in place; each round produces a new state, and a state
/// that reached a terminal status accepts no further rounds.
#[derive(Debug, Clone)]
pub struct AuditState {
    round: u32,
    pool: BallotPool,
    history: Vec<RoundRecord>,
    status: AuditStatus,
    last_proposal: Option<u64>,
}

impl AuditState {
    /// Initial state: round 0, empty pool, `Continue`.
    pub fn new(context: &AuditContext) -> Self {
        Self {
            round: 0,
            pool: BallotPool::new(context.roster().clone(), context.total_cast()),
            history: Vec::new(),
            status: AuditStatus::Continue,
            last_proposal: None,
        }
    }

    /// Rounds completed.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Ballot pool after the last completed round.
    pub fn pool(&self) -> &BallotPool {
        &self.pool
    }

    /// Per-round history, oldest first.
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    /// Current verdict.
    pub fn status(&self) -> &AuditStatus {
        &self.status
    }

    /// Last proposed round size, if any.
    pub fn last_proposal(&self) -> Option<u64> {
        self.last_proposal
    }

    /// True once a terminal status has been reached.
    pub fn is_concluded(&self) -> bool {
        self.status.is_terminal()
    }

    /// Force `StopTimeOrResourceLimit`. A state that already concluded is
    /// returned unchanged.
    pub fn force_stop(mut self, reason: StopReason) -> Self {
        if !self.is_concluded() {
            self.status = AuditStatus::StopTimeOrResourceLimit { reason };
            self.last_proposal = None;
        }
        self
    }

    pub(crate) fn advance(
        mut self,
        pool: BallotPool,
        record: RoundRecord,
    ) -> Self {
        self.round = record.round;
        self.pool = pool;
        self.status = record.status.clone();
        self.last_proposal = record.next_sample_size;
        self.history.push(record);
        self
    }
}
