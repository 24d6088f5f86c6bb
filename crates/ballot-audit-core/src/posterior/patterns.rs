//! Grouping of observed ballots by exact ranking.

use std::collections::HashMap;

use crate::types::{Ballot, Ranking};

/// Distinct observed rankings with their observed counts, in order of first
/// appearance.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: Vec<Ranking>,
    counts: Vec<u64>,
}

impl PatternTable {
    /// Group ballots by ranking.
    pub fn from_ballots(ballots: &[Ballot]) -> Self {
        let mut index: HashMap<&Ranking, usize> = HashMap::new();
        let mut table = Self::default();
        for ballot in ballots {
            match index.get(ballot.ranking()) {
                Some(&k) => table.counts[k] += 1,
                None => {
                    index.insert(ballot.ranking(), table.patterns.len());
                    table.patterns.push(ballot.ranking().clone());
                    table.counts.push(1);
                }
            }
        }
        table
    }

    /// Number of distinct patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Pattern `k`.
    pub fn pattern(&self, k: usize) -> &Ranking {
        &self.patterns[k]
    }

    /// Observed count of pattern `k`.
    pub fn count(&self, k: usize) -> u64 {
        self.counts[k]
    }

    /// `(pattern, observed count)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Ranking, u64)> + '_ {
        self.patterns.iter().zip(self.counts.iter().copied())
    }

    /// Sum of observed counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_in_first_appearance_order() {
        let ballots: Vec<Ballot> = [vec![2, 1], vec![1, 2], vec![2, 1], vec![2, 1]]
            .into_iter()
            .map(|r| Ballot::observed(Ranking::from(r), 1))
            .collect();
        let table = PatternTable::from_ballots(&ballots);
        assert_eq!(table.len(), 2);
        assert_eq!(table.pattern(0), &Ranking::from(vec![2, 1]));
        assert_eq!(table.count(0), 3);
        assert_eq!(table.count(1), 1);
        assert_eq!(table.total(), 4);
    }
}
