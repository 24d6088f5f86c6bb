//! Positional (Borda) count.

use crate::error::CountError;
use crate::tiebreak::{TieKind, TieResolution};

use super::{
    groups_by_tally, order_groups, resolution_indices, winner_order, CountInput, Tally, TieCursor,
    TieStep, VoteCounter,
};

/// Borda count: a ballot gives `m - 1 - i` points to its `i`-th preference,
/// where `m` is the number of candidates. Unranked candidates get nothing.
/// The `seats` highest scorers win.
///
/// Equal scores inside the winner set are election-order ties; equal scores
/// straddling the last seat are an election tie.
#[derive(Debug, Clone, Copy, Default)]
pub struct Borda;

impl VoteCounter for Borda {
    fn name(&self) -> &'static str {
        "borda"
    }

    fn count(
        &self,
        input: &CountInput<'_>,
        resolutions: &[TieResolution],
    ) -> Result<Tally, CountError> {
        let groups = input.indexed()?;
        let m = input.roster.len();
        let mut scores = vec![0.0f64; m];
        for (preferences, weight) in &groups {
            for (i, &c) in preferences.iter().enumerate() {
                scores[c] += (*weight * m.saturating_sub(1 + i) as u64) as f64;
            }
        }

        let candidates: Vec<usize> = (0..m).collect();
        let ranked = groups_by_tally(&candidates, &scores);

        let mut cursor = TieCursor::new(resolutions);
        let mut elected = Vec::with_capacity(input.seats);
        let mut filled = 0;
        let mut inside = Vec::new();
        for group in ranked {
            if filled >= input.seats {
                break;
            }
            if filled + group.len() <= input.seats {
                filled += group.len();
                inside.push(group);
                continue;
            }

            // Group straddles the last seat.
            if let Some(signal) = order_groups(&inside, input.roster, &mut cursor, &mut elected)? {
                return Ok(Tally::Tie(signal));
            }
            inside.clear();
            let needed = input.seats - filled;
            match cursor.tie(TieKind::Election, input.roster, &group)? {
                TieStep::Unresolved(signal) => return Ok(Tally::Tie(signal)),
                TieStep::Resolved(resolution) => {
                    let order = resolution_indices(input.roster, resolution)?;
                    elected.extend(order.into_iter().take(needed));
                }
            }
            filled = input.seats;
        }
        if let Some(signal) = order_groups(&inside, input.roster, &mut cursor, &mut elected)? {
            return Ok(Tally::Tie(signal));
        }

        Ok(Tally::Elected(winner_order(input.roster, &elected)))
    }
}
