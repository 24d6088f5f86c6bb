//! One simulated full ballot population.

use std::sync::Arc;

use crate::tabulation::BallotGroup;
use crate::types::{Ballot, Ranking};

use super::PatternTable;

/// A posterior-predictive draw of the whole electorate.
///
/// Holds the observed ballots (shared, never copied) plus how many ballots of
/// each observed pattern and each prior ballot were imputed for this trial,
/// and any rankings rebuilt from pairwise margins.
/// `observed_count + imputed_count == total_cast` always.
#[derive(Debug, Clone)]
pub struct SimulatedPopulation {
    observed: Arc<Vec<Ballot>>,
    patterns: Arc<PatternTable>,
    priors: Arc<Vec<Ranking>>,
    imputed_patterns: Vec<u64>,
    imputed_priors: Vec<u64>,
    generated: Vec<(Ranking, u64)>,
    round: u32,
}

impl SimulatedPopulation {
    pub(crate) fn new(
        observed: Arc<Vec<Ballot>>,
        patterns: Arc<PatternTable>,
        priors: Arc<Vec<Ranking>>,
        imputed_patterns: Vec<u64>,
        imputed_priors: Vec<u64>,
        generated: Vec<(Ranking, u64)>,
        round: u32,
    ) -> Self {
        debug_assert_eq!(imputed_patterns.len(), patterns.len());
        debug_assert_eq!(imputed_priors.len(), priors.len());
        Self {
            observed,
            patterns,
            priors,
            imputed_patterns,
            imputed_priors,
            generated,
            round,
        }
    }

    /// Observed ballots, exactly as admitted to the pool.
    pub fn observed_ballots(&self) -> &[Ballot] {
        &self.observed
    }

    /// Number of imputed ballots.
    pub fn imputed_count(&self) -> u64 {
        self.imputed_patterns.iter().sum::<u64>()
            + self.imputed_priors.iter().sum::<u64>()
            + self.generated.iter().map(|(_, n)| n).sum::<u64>()
    }

    /// Population size: observed plus imputed.
    pub fn len(&self) -> u64 {
        self.observed.len() as u64 + self.imputed_count()
    }

    /// True if the population holds no ballots at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Imputed ballots per observed pattern, in pattern order.
    pub fn imputed_pattern_counts(&self) -> &[u64] {
        &self.imputed_patterns
    }

    /// Imputed ballots per prior (length-one) ballot, in roster order.
    pub fn imputed_prior_counts(&self) -> &[u64] {
        &self.imputed_priors
    }

    /// Imputed rankings that are neither observed patterns nor prior ballots.
    pub fn generated(&self) -> &[(Ranking, u64)] {
        &self.generated
    }

    /// Weighted groups for a counting engine: each observed pattern with its
    /// observed plus imputed count, then each prior ballot that was imputed,
    /// then the generated rankings.
    pub fn groups(&self) -> Vec<BallotGroup<'_>> {
        let mut groups =
            Vec::with_capacity(self.patterns.len() + self.priors.len() + self.generated.len());
        for (k, (ranking, observed)) in self.patterns.iter().enumerate() {
            groups.push(BallotGroup {
                ranking: ranking.as_slice(),
                weight: observed + self.imputed_patterns[k],
            });
        }
        for (ranking, &weight) in self.priors.iter().zip(&self.imputed_priors) {
            if weight > 0 {
                groups.push(BallotGroup {
                    ranking: ranking.as_slice(),
                    weight,
                });
            }
        }
        for (ranking, weight) in &self.generated {
            groups.push(BallotGroup {
                ranking: ranking.as_slice(),
                weight: *weight,
            });
        }
        groups
    }

    /// Imputed ballots, materialised with `UnobservedSimulated` provenance.
    pub fn imputed_ballots(&self) -> impl Iterator<Item = Ballot> + '_ {
        let from_patterns = self
            .patterns
            .iter()
            .zip(&self.imputed_patterns)
            .map(|((ranking, _), &n)| (ranking, n));
        let from_priors = self.priors.iter().zip(self.imputed_priors.iter().copied());
        let generated = self.generated.iter().map(|(ranking, n)| (ranking, *n));
        from_patterns
            .chain(from_priors)
            .chain(generated)
            .flat_map(move |(ranking, n)| {
                (0..n).map(move |_| Ballot::simulated(ranking.clone(), self.round))
            })
    }

    /// The full population, observed ballots first.
    pub fn ballots(&self) -> Vec<Ballot> {
        let mut all = Vec::with_capacity(self.len() as usize);
        all.extend(self.observed.iter().cloned());
        all.extend(self.imputed_ballots());
        all
    }
}
