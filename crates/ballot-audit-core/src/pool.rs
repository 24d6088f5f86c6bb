//! The pool of hand-transcribed ballots.
//!
//! The pool is only mutated between rounds. Trials read a [`PoolSnapshot`],
//! which shares the observed ballots through an `Arc` and can never observe a
//! later admission.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BallotError;
use crate::types::{Ballot, CandidateRoster, Ranking};

/// A ballot refused at admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedBallot {
    /// Zero-based position of the ballot within the submitted round.
    pub position: usize,
    /// The ranking as transcribed.
    pub ranking: Ranking,
    /// Why it was refused.
    pub error: BallotError,
}

/// Result of admitting one round of transcribed ballots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmissionReport {
    /// Round the ballots were submitted for.
    pub round: u32,
    /// Ballots added to the pool.
    pub admitted: usize,
    /// Ballots refused, in submission order.
    pub rejected: Vec<RejectedBallot>,
}

/// All observed ballots across rounds plus the official ballots-cast total.
///
/// Invariant: `observed_count() <= total_cast()`.
#[derive(Debug, Clone)]
pub struct BallotPool {
    roster: Arc<CandidateRoster>,
    total_cast: u64,
    observed: Arc<Vec<Ballot>>,
}

impl BallotPool {
    /// Create an empty pool.
    pub fn new(roster: Arc<CandidateRoster>, total_cast: u64) -> Self {
        Self {
            roster,
            total_cast,
            observed: Arc::new(Vec::new()),
        }
    }

    /// Official number of ballots cast.
    pub fn total_cast(&self) -> u64 {
        self.total_cast
    }

    /// Ballots admitted so far.
    pub fn observed_count(&self) -> u64 {
        self.observed.len() as u64
    }

    /// Ballots not yet sampled.
    pub fn unsampled_count(&self) -> u64 {
        self.total_cast.saturating_sub(self.observed_count())
    }

    /// Observed ballots in admission order.
    pub fn observed(&self) -> &[Ballot] {
        &self.observed
    }

    /// Admit a round of transcribed ballots.
    ///
    /// Malformed ballots are excluded and listed in the report; the remainder
    /// of the round is still admitted. Ballots beyond `total_cast` are refused
    /// with [`BallotError::PopulationFull`].
    pub fn record_round<I>(&mut self, round: u32, ballots: I) -> AdmissionReport
    where
        I: IntoIterator<Item = Ranking>,
    {
        let mut report = AdmissionReport {
            round,
            ..AdmissionReport::default()
        };
        let observed = Arc::make_mut(&mut self.observed);

        for (position, ranking) in ballots.into_iter().enumerate() {
            let verdict = if observed.len() as u64 >= self.total_cast {
                Err(BallotError::PopulationFull {
                    total_cast: self.total_cast,
                })
            } else {
                validate_against(&self.roster, &ranking)
            };

            match verdict {
                Ok(()) => {
                    observed.push(Ballot::observed(ranking, round));
                    report.admitted += 1;
                }
                Err(error) => {
                    warn!(round, position, ballot = %ranking, %error, "rejected ballot");
                    report.rejected.push(RejectedBallot {
                        position,
                        ranking,
                        error,
                    });
                }
            }
        }

        debug!(
            round,
            admitted = report.admitted,
            rejected = report.rejected.len(),
            observed = observed.len(),
            "recorded round"
        );
        report
    }

    /// Immutable view for one round of trials.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            roster: Arc::clone(&self.roster),
            total_cast: self.total_cast,
            ballots: Arc::clone(&self.observed),
        }
    }
}

fn validate_against(roster: &CandidateRoster, ranking: &Ranking) -> Result<(), BallotError> {
    let mut seen = HashSet::with_capacity(ranking.len());
    for &candidate in ranking.as_slice() {
        if !roster.contains(candidate) {
            return Err(BallotError::UnknownCandidate { candidate });
        }
        if !seen.insert(candidate) {
            return Err(BallotError::DuplicateCandidate { candidate });
        }
    }
    Ok(())
}

/// Read-only view of the pool taken at a round boundary.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    roster: Arc<CandidateRoster>,
    total_cast: u64,
    ballots: Arc<Vec<Ballot>>,
}

impl PoolSnapshot {
    /// Observed ballots.
    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    /// Shared handle to the observed ballots.
    pub fn shared_ballots(&self) -> &Arc<Vec<Ballot>> {
        &self.ballots
    }

    /// Candidate roster.
    pub fn roster(&self) -> &Arc<CandidateRoster> {
        &self.roster
    }

    /// Official number of ballots cast.
    pub fn total_cast(&self) -> u64 {
        self.total_cast
    }

    /// Observed ballots in the snapshot.
    pub fn observed_count(&self) -> u64 {
        self.ballots.len() as u64
    }

    /// Ballots still to be imputed.
    pub fn unsampled_count(&self) -> u64 {
        self.total_cast.saturating_sub(self.observed_count())
    }
}
