//! Immutable facts about the contest under audit.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::types::{Candidate, CandidateRoster, ReportedOutcome};

/// Candidate roster, seat count, ballots cast and the reported outcome.
///
/// Supplied once at audit start; every round and every trial reads the same
/// instance.
#[derive(Debug, Clone)]
pub struct AuditContext {
    roster: Arc<CandidateRoster>,
    seats: usize,
    total_cast: u64,
    reported: ReportedOutcome,
}

impl AuditContext {
    /// Validate and assemble the contest facts.
    pub fn new(
        candidates: Vec<Candidate>,
        seats: usize,
        total_cast: u64,
        reported: ReportedOutcome,
    ) -> Result<Self, ConfigError> {
        if candidates.is_empty() {
            return Err(ConfigError::NoCandidates);
        }
        let roster = CandidateRoster::new(candidates).map_err(ConfigError::DuplicateCandidate)?;
        if seats == 0 {
            return Err(ConfigError::Zero("seats"));
        }
        if seats > roster.len() {
            return Err(ConfigError::TooManySeats {
                seats,
                candidates: roster.len(),
            });
        }
        if total_cast == 0 {
            return Err(ConfigError::Zero("total_cast"));
        }
        let mut distinct = BTreeSet::new();
        for &id in &reported.order().0 {
            if !roster.contains(id) {
                return Err(ConfigError::UnknownReportedWinner(id));
            }
            distinct.insert(id);
        }
        if distinct.len() != seats || reported.order().len() != seats {
            return Err(ConfigError::ReportedWinnerCount {
                reported: distinct.len(),
                seats,
            });
        }

        Ok(Self {
            roster: Arc::new(roster),
            seats,
            total_cast,
            reported,
        })
    }

    /// Shared candidate roster.
    pub fn roster(&self) -> &Arc<CandidateRoster> {
        &self.roster
    }

    /// Seats to fill.
    pub fn seats(&self) -> usize {
        self.seats
    }

    /// Official number of ballots cast.
    pub fn total_cast(&self) -> u64 {
        self.total_cast
    }

    /// Declared outcome under test.
    pub fn reported(&self) -> &ReportedOutcome {
        &self.reported
    }
}
