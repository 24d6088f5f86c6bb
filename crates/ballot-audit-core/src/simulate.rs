//! Tabulation of one simulated population.

use tracing::debug;

use crate::constants::TIE_RESOLUTION_SLACK;
use crate::error::CountError;
use crate::posterior::SimulatedPopulation;
use crate::tabulation::{BallotGroup, CountInput, Tally, VoteCounter};
use crate::tiebreak::TieBreakOracle;
use crate::types::{CandidateRoster, WinnerOrder};

/// Result of one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// The engine produced winners.
    Completed {
        /// Winners in election order.
        winners: WinnerOrder,
        /// Ties broken by the oracle along the way.
        ties_resolved: usize,
    },
    /// The engine rejected the population; the trial does not count.
    Discarded(CountError),
}

/// Runs the counting engine on simulated populations, answering every tie
/// from the audit's fixed [`TieBreakOracle`].
#[derive(Clone, Copy)]
pub struct OutcomeSimulator<'a> {
    engine: &'a dyn VoteCounter,
    oracle: &'a TieBreakOracle,
    roster: &'a CandidateRoster,
    seats: usize,
}

impl<'a> OutcomeSimulator<'a> {
    /// Bind an engine and oracle to a contest.
    pub fn new(
        engine: &'a dyn VoteCounter,
        oracle: &'a TieBreakOracle,
        roster: &'a CandidateRoster,
        seats: usize,
    ) -> Self {
        Self {
            engine,
            oracle,
            roster,
            seats,
        }
    }

    /// Count one simulated population.
    pub fn run(&self, population: &SimulatedPopulation) -> TrialOutcome {
        self.tabulate(&population.groups())
    }

    /// Count weighted ballot groups, resolving ties until the engine
    /// completes or the tie limit is reached.
    pub fn tabulate(&self, ballots: &[BallotGroup<'_>]) -> TrialOutcome {
        let input = CountInput {
            ballots,
            roster: self.roster,
            seats: self.seats,
        };
        let limit = self.roster.len() * 2 + TIE_RESOLUTION_SLACK;
        let mut resolutions = Vec::new();

        loop {
            match self.engine.count(&input, &resolutions) {
                Ok(Tally::Elected(winners)) => {
                    return TrialOutcome::Completed {
                        winners,
                        ties_resolved: resolutions.len(),
                    }
                }
                Ok(Tally::Tie(signal)) => {
                    if resolutions.len() >= limit {
                        return TrialOutcome::Discarded(CountError::TieLimitExceeded {
                            resolutions: resolutions.len(),
                        });
                    }
                    let resolution = self.oracle.resolve(&signal);
                    debug!(engine = self.engine.name(), kind = ?signal.kind, tied = ?signal.tied, "tie resolved by oracle");
                    resolutions.push(resolution);
                }
                Err(error) => {
                    debug!(engine = self.engine.name(), %error, "trial discarded");
                    return TrialOutcome::Discarded(error);
                }
            }
        }
    }
}
