//! Pairwise-preference resampling.
//!
//! Instead of resampling whole ballot patterns, each head-to-head margin of
//! the unsampled ballots is drawn from a Beta posterior over the observed
//! pairwise preferences, and a profile matching those margins is rebuilt one
//! ranked-pairs ballot at a time.

use std::collections::HashMap;

use rand::Rng;
use rand_distr::{Beta, Distribution};

use crate::constants::PAIRWISE_MAX_SOLVES;
use crate::types::{CandidateId, Ranking};

use super::PatternTable;

/// `prefer[i * m + j]`: observed ballots ranking candidate `i` above `j`.
///
/// A ranked candidate is preferred to every candidate ranked below it and to
/// every unranked candidate; two unranked candidates are not compared.
#[derive(Debug, Clone)]
pub struct PreferenceMatrix {
    candidates: Vec<CandidateId>,
    prefer: Vec<u64>,
}

impl PreferenceMatrix {
    /// Tally pairwise preferences over `candidates` from the observed patterns.
    pub fn from_patterns(patterns: &PatternTable, candidates: Vec<CandidateId>) -> Self {
        let m = candidates.len();
        let index: HashMap<CandidateId, usize> =
            candidates.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let mut prefer = vec![0u64; m * m];
        let mut ranked = vec![false; m];

        for (ranking, count) in patterns.iter() {
            ranked.iter_mut().for_each(|r| *r = false);
            let positions: Vec<usize> = ranking
                .as_slice()
                .iter()
                .filter_map(|c| index.get(c).copied())
                .collect();
            for &p in &positions {
                ranked[p] = true;
            }
            for (k, &a) in positions.iter().enumerate() {
                for &b in &positions[k + 1..] {
                    prefer[a * m + b] += count;
                }
                for b in (0..m).filter(|&b| !ranked[b]) {
                    prefer[a * m + b] += count;
                }
            }
        }

        Self { candidates, prefer }
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// True with no candidates.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Observed ballots preferring `candidates[i]` to `candidates[j]`.
    pub fn prefers(&self, i: usize, j: usize) -> u64 {
        self.prefer[i * self.len() + j]
    }

    /// Draw target margins for `n` ballots: for each pair, the share
    /// preferring `i` is `Beta(prefers(i, j) + 1, prefers(j, i) + 1)`, scaled
    /// to `0..=n`, and the opposite direction takes the rest.
    pub fn draw_margins<R: Rng + ?Sized>(&self, rng: &mut R, n: u64) -> Vec<i64> {
        let m = self.len();
        let mut needs = vec![0i64; m * m];
        for i in 0..m {
            for j in i + 1..m {
                let a = self.prefers(i, j) as f64 + 1.0;
                let b = self.prefers(j, i) as f64 + 1.0;
                let p = Beta::new(a, b).map_or(a / (a + b), |d| d.sample(rng));
                let s = ((p * (n + 1) as f64) as u64).min(n);
                needs[i * m + j] = s as i64;
                needs[j * m + i] = (n - s) as i64;
            }
        }
        needs
    }

    /// Rebuild `n` complete rankings whose pairwise margins approach `needs`.
    ///
    /// Each solve picks the ranked-pairs order of the outstanding margins and
    /// subtracts it. Ballots are emitted in equal blocks so a trial costs at
    /// most [`PAIRWISE_MAX_SOLVES`] solves; below that every ballot gets its
    /// own solve.
    pub fn rebuild<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        mut needs: Vec<i64>,
        n: u64,
    ) -> Vec<(Ranking, u64)> {
        let m = self.len();
        if m == 0 || n == 0 {
            return Vec::new();
        }
        let block = n.div_ceil(PAIRWISE_MAX_SOLVES);
        let mut counts: HashMap<Vec<usize>, u64> = HashMap::new();
        let mut first_seen: Vec<Vec<usize>> = Vec::new();

        let mut remaining = n;
        while remaining > 0 {
            let take = block.min(remaining);
            let order = ranked_pairs(&needs, m, rng);
            for (k, &a) in order.iter().enumerate() {
                for &b in &order[k + 1..] {
                    needs[a * m + b] -= take as i64;
                }
            }
            match counts.get_mut(&order) {
                Some(c) => *c += take,
                None => {
                    counts.insert(order.clone(), take);
                    first_seen.push(order);
                }
            }
            remaining -= take;
        }

        first_seen
            .into_iter()
            .map(|order| {
                let count = counts.get(&order).copied().unwrap_or(0);
                let ranking = Ranking::new(order.iter().map(|&i| self.candidates[i]).collect());
                (ranking, count)
            })
            .collect()
    }
}

/// Tideman's ranked pairs over an `m × m` margin matrix, most preferred
/// first. Equal margins are ordered at random.
fn ranked_pairs<R: Rng + ?Sized>(needs: &[i64], m: usize, rng: &mut R) -> Vec<usize> {
    let mut pairs: Vec<(i64, u64, usize, usize)> = Vec::with_capacity(m * m.saturating_sub(1));
    for i in 0..m {
        for j in 0..m {
            if i != j {
                pairs.push((needs[i * m + j], rng.random::<u64>(), i, j));
            }
        }
    }
    pairs.sort_unstable_by(|x, y| (y.0, y.1).cmp(&(x.0, x.1)));

    let mut locked: Vec<Vec<usize>> = vec![Vec::new(); m];
    let mut beats = vec![0usize; m];
    for &(_, _, i, j) in &pairs {
        if !reachable(&locked, j, i) {
            locked[i].push(j);
            beats[i] += 1;
        }
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| beats[b].cmp(&beats[a]).then(b.cmp(&a)));
    order
}

fn reachable(locked: &[Vec<usize>], from: usize, to: usize) -> bool {
    if from == to {
        return true;
    }
    let mut seen = vec![false; locked.len()];
    let mut stack = vec![from];
    seen[from] = true;
    while let Some(v) = stack.pop() {
        for &w in &locked[v] {
            if w == to {
                return true;
            }
            if !seen[w] {
                seen[w] = true;
                stack.push(w);
            }
        }
    }
    false
}
