//! Single transferable vote with Droop quota and Gregory surplus transfer.

use crate::constants::TALLY_EPSILON;
use crate::error::CountError;
use crate::tiebreak::{TieKind, TieResolution};
use crate::types::CandidateRoster;

use super::{
    groups_by_tally, order_groups, resolution_indices, winner_order, CountInput, Tally, TieCursor,
    TieStep, VoteCounter,
};

/// Droop-quota STV. With one seat this is instant-runoff voting.
///
/// - Quota: `floor(valid / (seats + 1)) + 1`.
/// - A candidate reaching quota is elected; their surplus is transferred at
///   value `(tally - quota) / tally` to each ballot's next continuing
///   preference.
/// - Otherwise the lowest-tallied candidate is excluded and their ballots
///   transfer at full value.
/// - Once continuing candidates no longer outnumber open seats, all are
///   elected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stv;

struct Parcel {
    preferences: Vec<usize>,
    position: usize,
    value: f64,
}

impl Parcel {
    fn holder(&self) -> Option<usize> {
        self.preferences.get(self.position).copied()
    }

    fn advance(&mut self, continuing: &[bool]) {
        while let Some(c) = self.holder() {
            if continuing[c] {
                return;
            }
            self.position += 1;
        }
    }
}

struct Count<'a> {
    roster: &'a CandidateRoster,
    parcels: Vec<Parcel>,
    continuing: Vec<bool>,
    elected: Vec<usize>,
    quota: f64,
}

impl Count<'_> {
    fn tallies(&self) -> Vec<f64> {
        let mut tallies = vec![0.0; self.continuing.len()];
        for parcel in &self.parcels {
            if let Some(c) = parcel.holder() {
                tallies[c] += parcel.value;
            }
        }
        tallies
    }

    fn continuing(&self) -> Vec<usize> {
        (0..self.continuing.len()).filter(|&c| self.continuing[c]).collect()
    }

    fn elect(&mut self, candidate: usize) {
        let tally = self.tallies()[candidate];
        let surplus = (tally - self.quota).max(0.0);
        let factor = if tally > 0.0 { surplus / tally } else { 0.0 };
        self.continuing[candidate] = false;
        self.elected.push(candidate);
        for parcel in &mut self.parcels {
            if parcel.holder() == Some(candidate) {
                parcel.value *= factor;
                parcel.advance(&self.continuing);
            }
        }
    }

    fn exclude(&mut self, candidate: usize) {
        self.continuing[candidate] = false;
        for parcel in &mut self.parcels {
            if parcel.holder() == Some(candidate) {
                parcel.advance(&self.continuing);
            }
        }
    }
}

impl VoteCounter for Stv {
    fn name(&self) -> &'static str {
        "stv"
    }

    fn count(
        &self,
        input: &CountInput<'_>,
        resolutions: &[TieResolution],
    ) -> Result<Tally, CountError> {
        let groups = input.indexed()?;
        let valid: u64 = groups.iter().map(|(_, w)| w).sum();
        let quota = (valid / (input.seats as u64 + 1) + 1) as f64;

        let mut count = Count {
            roster: input.roster,
            parcels: groups
                .into_iter()
                .map(|(preferences, weight)| Parcel {
                    preferences,
                    position: 0,
                    value: weight as f64,
                })
                .collect(),
            continuing: vec![true; input.roster.len()],
            elected: Vec::with_capacity(input.seats),
            quota,
        };
        let mut cursor = TieCursor::new(resolutions);

        while count.elected.len() < input.seats {
            let remaining = input.seats - count.elected.len();
            let continuing = count.continuing();
            let tallies = count.tallies();

            if continuing.len() <= remaining {
                let ranked = groups_by_tally(&continuing, &tallies);
                let mut elected = std::mem::take(&mut count.elected);
                if let Some(signal) = order_groups(&ranked, count.roster, &mut cursor, &mut elected)? {
                    return Ok(Tally::Tie(signal));
                }
                return Ok(Tally::Elected(winner_order(count.roster, &elected)));
            }

            let reaching: Vec<usize> = continuing
                .iter()
                .copied()
                .filter(|&c| tallies[c] >= quota - TALLY_EPSILON)
                .collect();

            if !reaching.is_empty() {
                let top = &groups_by_tally(&reaching, &tallies)[0];
                if top.len() == 1 {
                    count.elect(top[0]);
                    continue;
                }
                match cursor.tie(TieKind::ElectionOrder, count.roster, top)? {
                    TieStep::Unresolved(signal) => return Ok(Tally::Tie(signal)),
                    TieStep::Resolved(resolution) => {
                        for c in resolution_indices(count.roster, resolution)? {
                            count.elect(c);
                        }
                    }
                }
                continue;
            }

            let lowest = groups_by_tally(&continuing, &tallies)
                .pop()
                .unwrap_or_default();
            match lowest.as_slice() {
                [] => break,
                [only] => count.exclude(*only),
                tied => {
                    let kind = if continuing.len() == 2 && remaining == 1 {
                        TieKind::Election
                    } else {
                        TieKind::Exclusion
                    };
                    let resolution = match cursor.tie(kind, count.roster, tied)? {
                        TieStep::Unresolved(signal) => return Ok(Tally::Tie(signal)),
                        TieStep::Resolved(resolution) => resolution,
                    };
                    let chosen = resolution_indices(count.roster, resolution)?;
                    match kind {
                        TieKind::Election => {
                            if let Some(&winner) = chosen.first() {
                                count.elected.push(winner);
                                count.continuing[winner] = false;
                            }
                        }
                        _ => {
                            if let Some(&excluded) = chosen.last() {
                                count.exclude(excluded);
                            }
                        }
                    }
                }
            }
        }

        Ok(Tally::Elected(winner_order(count.roster, &count.elected)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabulation::BallotGroup;
    use crate::types::{Candidate, CandidateId, WinnerOrder};

    fn roster(n: u32) -> CandidateRoster {
        CandidateRoster::new((1..=n).map(|i| Candidate::new(i, format!("C{}", i))).collect())
            .unwrap()
    }

    fn ids(v: &[u32]) -> Vec<CandidateId> {
        v.iter().copied().map(CandidateId).collect()
    }

    fn run(
        roster: &CandidateRoster,
        ballots: &[(Vec<CandidateId>, u64)],
        seats: usize,
        resolutions: &[TieResolution],
    ) -> Tally {
        let groups: Vec<BallotGroup<'_>> = ballots
            .iter()
            .map(|(r, w)| BallotGroup {
                ranking: r,
                weight: *w,
            })
            .collect();
        let input = CountInput {
            ballots: &groups,
            roster,
            seats,
        };
        Stv.count(&input, resolutions).unwrap()
    }

    #[test]
    fn test_irv_majority() {
        let roster = roster(3);
        let ballots = vec![(ids(&[1, 2, 3]), 6), (ids(&[2, 1, 3]), 3), (ids(&[3, 2]), 1)];
        assert_eq!(run(&roster, &ballots, 1, &[]), Tally::Elected(WinnerOrder(ids(&[1]))));
    }

    #[test]
    fn test_irv_transfer_changes_winner() {
        // 1 leads on first preferences, but 3's ballots all transfer to 2.
        let roster = roster(3);
        let ballots = vec![(ids(&[1]), 40), (ids(&[2]), 35), (ids(&[3, 2]), 25)];
        assert_eq!(run(&roster, &ballots, 1, &[]), Tally::Elected(WinnerOrder(ids(&[2]))));
    }

    #[test]
    fn test_surplus_transfer_elects_second() {
        // Quota 34 of 100; 1's surplus of 36 flows to 2.
        let roster = roster(4);
        let ballots = vec![
            (ids(&[1, 2]), 70),
            (ids(&[3]), 20),
            (ids(&[4]), 10),
        ];
        let Tally::Elected(order) = run(&roster, &ballots, 2, &[]) else {
            panic!("expected completed count");
        };
        assert_eq!(order.0, ids(&[1, 2]));
    }

    #[test]
    fn test_election_tie_signalled_then_resolved() {
        let roster = roster(2);
        let ballots = vec![(ids(&[1]), 3), (ids(&[2]), 3)];
        let Tally::Tie(signal) = run(&roster, &ballots, 1, &[]) else {
            panic!("expected tie");
        };
        assert_eq!(signal.kind, TieKind::Election);
        assert_eq!(signal.tied, ids(&[1, 2]));
        assert_eq!(signal.step, 0);

        let resolution = TieResolution {
            kind: TieKind::Election,
            order: ids(&[2, 1]),
        };
        assert_eq!(
            run(&roster, &ballots, 1, &[resolution]),
            Tally::Elected(WinnerOrder(ids(&[2])))
        );
    }

    #[test]
    fn test_exclusion_tie_signalled() {
        let roster = roster(4);
        let ballots = vec![
            (ids(&[1]), 10),
            (ids(&[2]), 8),
            (ids(&[3, 2]), 2),
            (ids(&[4, 1]), 2),
        ];
        let Tally::Tie(signal) = run(&roster, &ballots, 1, &[]) else {
            panic!("expected tie");
        };
        assert_eq!(signal.kind, TieKind::Exclusion);
        assert_eq!(signal.tied, ids(&[3, 4]));

        // Excluding 4 sends two votes to 1, who then has a majority.
        let resolution = TieResolution {
            kind: TieKind::Exclusion,
            order: ids(&[3, 4]),
        };
        assert_eq!(
            run(&roster, &ballots, 1, &[resolution]),
            Tally::Elected(WinnerOrder(ids(&[1])))
        );
    }

    #[test]
    fn test_election_order_tie_when_all_elected() {
        let roster = roster(2);
        let ballots = vec![(ids(&[1]), 5), (ids(&[2]), 5)];
        let Tally::Tie(signal) = run(&roster, &ballots, 2, &[]) else {
            panic!("expected tie");
        };
        assert_eq!(signal.kind, TieKind::ElectionOrder);
    }

    #[test]
    fn test_exhausted_ballots_are_ignored() {
        let roster = roster(2);
        let ballots = vec![(ids(&[1]), 2), (Vec::new(), 50), (ids(&[2]), 1)];
        assert_eq!(run(&roster, &ballots, 1, &[]), Tally::Elected(WinnerOrder(ids(&[1]))));
    }
}
