//! Vote-counting engines.
//!
//! An engine is a pure function of its input: the weighted ballot groups,
//! the candidate roster, the seat count and the tie resolutions supplied so
//! far. When it reaches a tie it has no resolution for, it returns
//! [`Tally::Tie`] and the caller re-invokes it with one more resolution.

mod borda;
mod stv;

pub use borda::Borda;
pub use stv::Stv;

use serde::{Deserialize, Serialize};

use crate::constants::TALLY_EPSILON;
use crate::error::CountError;
use crate::tiebreak::{TieKind, TieResolution};
use crate::types::{CandidateId, CandidateRoster, WinnerOrder};

/// `weight` identical ballots ranking `ranking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallotGroup<'a> {
    /// Preferences, most preferred first.
    pub ranking: &'a [CandidateId],
    /// Number of ballots in the group.
    pub weight: u64,
}

/// Everything an engine counts.
#[derive(Debug, Clone, Copy)]
pub struct CountInput<'a> {
    /// Ballot population as weighted groups.
    pub ballots: &'a [BallotGroup<'a>],
    /// Candidates standing.
    pub roster: &'a CandidateRoster,
    /// Seats to fill.
    pub seats: usize,
}

impl CountInput<'_> {
    /// Check the input and convert rankings to dense roster indices.
    ///
    /// Returns `(indices, weight)` for every group that ranks somebody.
    pub fn indexed(&self) -> Result<Vec<(Vec<usize>, u64)>, CountError> {
        if self.seats == 0 || self.seats > self.roster.len() {
            return Err(CountError::InvalidSeats {
                seats: self.seats,
                candidates: self.roster.len(),
            });
        }
        let mut groups = Vec::with_capacity(self.ballots.len());
        for group in self.ballots {
            let mut indices = Vec::with_capacity(group.ranking.len());
            for &id in group.ranking {
                let idx = self.roster.index_of(id).ok_or(CountError::UnknownCandidate(id))?;
                indices.push(idx);
            }
            if !indices.is_empty() && group.weight > 0 {
                groups.push((indices, group.weight));
            }
        }
        if groups.is_empty() {
            return Err(CountError::NoBallots);
        }
        Ok(groups)
    }
}

/// A tie the engine cannot break on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieSignal {
    /// Decision the tie blocks.
    pub kind: TieKind,
    /// How many ties the count resolved before reaching this one.
    pub step: usize,
    /// Tied candidates, in roster order.
    pub tied: Vec<CandidateId>,
}

/// Engine result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tally {
    /// Count completed.
    Elected(WinnerOrder),
    /// Count needs a tie resolution to proceed.
    Tie(TieSignal),
}

/// A deterministic vote-counting engine.
pub trait VoteCounter: Send + Sync {
    /// Short engine name for logs and reports.
    fn name(&self) -> &'static str;

    /// Count `input`, consuming `resolutions` in the order ties occur.
    fn count(
        &self,
        input: &CountInput<'_>,
        resolutions: &[TieResolution],
    ) -> Result<Tally, CountError>;
}

/// Outcome of asking a [`TieCursor`] about a tie.
pub(crate) enum TieStep<'r> {
    Resolved(&'r TieResolution),
    Unresolved(TieSignal),
}

/// Hands out supplied resolutions in order.
pub(crate) struct TieCursor<'r> {
    resolutions: &'r [TieResolution],
    next: usize,
}

impl<'r> TieCursor<'r> {
    pub(crate) fn new(resolutions: &'r [TieResolution]) -> Self {
        Self {
            resolutions,
            next: 0,
        }
    }

    /// Look up the resolution for the next tie, checking it fits.
    pub(crate) fn tie(
        &mut self,
        kind: TieKind,
        roster: &CandidateRoster,
        tied: &[usize],
    ) -> Result<TieStep<'r>, CountError> {
        let mut sorted = tied.to_vec();
        sorted.sort_unstable();
        let signal = TieSignal {
            kind,
            step: self.next,
            tied: sorted.iter().filter_map(|&i| roster.get(i)).map(|c| c.id).collect(),
        };
        match self.resolutions.get(self.next) {
            None => Ok(TieStep::Unresolved(signal)),
            Some(resolution) if resolution.answers(&signal) => {
                self.next += 1;
                Ok(TieStep::Resolved(resolution))
            }
            Some(_) => Err(CountError::ResolutionMismatch { step: self.next }),
        }
    }
}

/// Dense indices for a resolution's preferred-first order.
pub(crate) fn resolution_indices(
    roster: &CandidateRoster,
    resolution: &TieResolution,
) -> Result<Vec<usize>, CountError> {
    resolution
        .order
        .iter()
        .map(|&id| roster.index_of(id).ok_or(CountError::UnknownCandidate(id)))
        .collect()
}

/// Split candidates into groups of equal tally, highest first.
///
/// Within a group candidates stay in roster order.
pub(crate) fn groups_by_tally(candidates: &[usize], tallies: &[f64]) -> Vec<Vec<usize>> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|&a, &b| tallies[b].total_cmp(&tallies[a]).then(a.cmp(&b)));

    let mut groups: Vec<Vec<usize>> = Vec::new();
    for c in sorted {
        match groups.last_mut() {
            Some(group) if (tallies[group[0]] - tallies[c]).abs() <= TALLY_EPSILON => group.push(c),
            _ => groups.push(vec![c]),
        }
    }
    for group in &mut groups {
        group.sort_unstable();
    }
    groups
}

/// Elect every candidate in `ranked_groups` in order, asking for an
/// election-order resolution for each group of equal tally.
///
/// Returns `Ok(None)` when every group was ordered, otherwise the signal
/// of the first unresolved tie.
pub(crate) fn order_groups(
    ranked_groups: &[Vec<usize>],
    roster: &CandidateRoster,
    cursor: &mut TieCursor<'_>,
    elected: &mut Vec<usize>,
) -> Result<Option<TieSignal>, CountError> {
    for group in ranked_groups {
        if group.len() == 1 {
            elected.push(group[0]);
            continue;
        }
        match cursor.tie(TieKind::ElectionOrder, roster, group)? {
            TieStep::Unresolved(signal) => return Ok(Some(signal)),
            TieStep::Resolved(resolution) => {
                elected.extend(resolution_indices(roster, resolution)?);
            }
        }
    }
    Ok(None)
}

pub(crate) fn winner_order(roster: &CandidateRoster, elected: &[usize]) -> WinnerOrder {
    WinnerOrder(elected.iter().filter_map(|&i| roster.get(i)).map(|c| c.id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candidate;

    fn roster() -> CandidateRoster {
        CandidateRoster::new(vec![
            Candidate::new(10, "A"),
            Candidate::new(20, "B"),
            Candidate::new(30, "C"),
        ])
        .unwrap()
    }

    #[test]
    fn test_groups_by_tally() {
        let groups = groups_by_tally(&[0, 1, 2], &[3.0, 5.0, 3.0 + 1e-12]);
        assert_eq!(groups, vec![vec![1], vec![0, 2]]);
    }

    #[test]
    fn test_indexed_rejects_unknown_candidate() {
        let roster = roster();
        let ranking = [CandidateId(10), CandidateId(99)];
        let ballots = [BallotGroup {
            ranking: &ranking,
            weight: 1,
        }];
        let input = CountInput {
            ballots: &ballots,
            roster: &roster,
            seats: 1,
        };
        assert_eq!(
            input.indexed().unwrap_err(),
            CountError::UnknownCandidate(CandidateId(99))
        );
    }

    #[test]
    fn test_indexed_requires_some_preference() {
        let roster = roster();
        let ballots = [BallotGroup {
            ranking: &[],
            weight: 4,
        }];
        let input = CountInput {
            ballots: &ballots,
            roster: &roster,
            seats: 1,
        };
        assert_eq!(input.indexed().unwrap_err(), CountError::NoBallots);
    }

    #[test]
    fn test_cursor_rejects_mismatched_resolution() {
        let roster = roster();
        let resolutions = [TieResolution {
            kind: TieKind::Exclusion,
            order: vec![CandidateId(10), CandidateId(20)],
        }];
        let mut cursor = TieCursor::new(&resolutions);
        let result = cursor.tie(TieKind::Election, &roster, &[0, 1]);
        assert!(matches!(result, Err(CountError::ResolutionMismatch { step: 0 })));
    }
}
