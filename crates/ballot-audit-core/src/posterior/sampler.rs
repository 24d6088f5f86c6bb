//! Posterior-predictive draws of the unsampled ballots.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Distribution, Gamma};
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

use crate::pool::PoolSnapshot;
use crate::seed::counter_rng_seed;
use crate::types::{Ballot, Ranking};

use super::{PatternTable, PreferenceMatrix, PriorConfig, ResamplingPolicy, SimulatedPopulation};

/// Draws simulated populations from a fixed pool snapshot.
///
/// Immutable once built, so one sampler is shared by every trial of a round.
/// Each trial brings its own RNG.
#[derive(Debug, Clone)]
pub struct PosteriorSampler {
    observed: Arc<Vec<Ballot>>,
    patterns: Arc<PatternTable>,
    priors: Arc<Vec<Ranking>>,
    preferences: Option<Arc<PreferenceMatrix>>,
    unsampled: u64,
    policy: ResamplingPolicy,
    prior: PriorConfig,
    round: u32,
}

impl PosteriorSampler {
    /// Prepare a sampler for one round.
    pub fn new(
        snapshot: &PoolSnapshot,
        policy: ResamplingPolicy,
        prior: PriorConfig,
        round: u32,
    ) -> Self {
        let patterns = PatternTable::from_ballots(snapshot.ballots());
        let priors: Vec<Ranking> = snapshot.roster().ids().map(Ranking::singleton).collect();
        let preferences = (policy == ResamplingPolicy::PairwiseBeta).then(|| {
            Arc::new(PreferenceMatrix::from_patterns(
                &patterns,
                snapshot.roster().ids().collect(),
            ))
        });
        debug!(
            round,
            policy = policy.name(),
            observed = snapshot.observed_count(),
            unsampled = snapshot.unsampled_count(),
            patterns = patterns.len(),
            "posterior sampler ready"
        );
        Self {
            observed: Arc::clone(snapshot.shared_ballots()),
            patterns: Arc::new(patterns),
            priors: Arc::new(priors),
            preferences,
            unsampled: snapshot.unsampled_count(),
            policy,
            prior,
            round,
        }
    }

    /// Ballots imputed per trial.
    pub fn unsampled(&self) -> u64 {
        self.unsampled
    }

    /// Active resampling policy.
    pub fn policy(&self) -> ResamplingPolicy {
        self.policy
    }

    /// Distinct observed ranking patterns.
    pub fn patterns(&self) -> &PatternTable {
        &self.patterns
    }

    /// Draw trial `trial` of a round from its own RNG substream.
    pub fn sample_trial(&self, round_seed: u64, trial: u64) -> SimulatedPopulation {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(round_seed, trial));
        self.sample(&mut rng)
    }

    /// Draw one simulated population.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulatedPopulation {
        let (imputed_patterns, imputed_priors, generated) = match self.policy {
            ResamplingPolicy::GammaDirichlet => {
                let weights: Vec<f64> = self
                    .bucket_weights()
                    .into_iter()
                    .map(|shape| gamma_variate(rng, shape))
                    .collect();
                let (patterns, priors) = self.split_buckets(rng, &weights);
                (patterns, priors, Vec::new())
            }
            ResamplingPolicy::Bootstrap => {
                let weights = self.bucket_weights();
                let (patterns, priors) = self.split_buckets(rng, &weights);
                (patterns, priors, Vec::new())
            }
            ResamplingPolicy::PolyaUrn => {
                let (patterns, priors) = self.polya_urn(rng);
                (patterns, priors, Vec::new())
            }
            ResamplingPolicy::PairwiseBeta => (
                vec![0; self.patterns.len()],
                vec![0; self.priors.len()],
                self.pairwise(rng),
            ),
        };

        SimulatedPopulation::new(
            Arc::clone(&self.observed),
            Arc::clone(&self.patterns),
            Arc::clone(&self.priors),
            imputed_patterns,
            imputed_priors,
            generated,
            self.round,
        )
    }

    /// Rankings rebuilt from Beta-drawn pairwise margins.
    fn pairwise<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<(Ranking, u64)> {
        let Some(preferences) = &self.preferences else {
            return Vec::new();
        };
        let needs = preferences.draw_margins(rng, self.unsampled);
        preferences.rebuild(rng, needs, self.unsampled)
    }

    /// One weight per observed pattern, then the unseen-pattern bucket.
    fn bucket_weights(&self) -> Vec<f64> {
        let mut weights: Vec<f64> = self
            .patterns
            .iter()
            .map(|(_, count)| count as f64 + self.prior.pattern_pseudocount)
            .collect();
        weights.push(if self.priors.is_empty() {
            0.0
        } else {
            self.prior.unseen_pseudocount
        });
        weights
    }

    /// Multinomial over `bucket_weights`-shaped weights; the unseen bucket is
    /// then spread uniformly over the prior ballots.
    fn split_buckets<R: Rng + ?Sized>(&self, rng: &mut R, weights: &[f64]) -> (Vec<u64>, Vec<u64>) {
        let n_patterns = self.patterns.len();
        let total: f64 = weights.iter().sum();

        if !(total > 0.0) {
            // No observed ballots and no prior mass: uniform over priors.
            let uniform = vec![1.0; self.priors.len()];
            return (vec![0; n_patterns], multinomial(rng, self.unsampled, &uniform));
        }

        let mut counts = multinomial(rng, self.unsampled, weights);
        let unseen = counts.pop().unwrap_or(0);
        let uniform = vec![1.0; self.priors.len()];
        (counts, multinomial(rng, unseen, &uniform))
    }

    /// Polya urn over observed patterns and prior ballots.
    fn polya_urn<R: Rng + ?Sized>(&self, rng: &mut R) -> (Vec<u64>, Vec<u64>) {
        let n_patterns = self.patterns.len();
        let mut weights: Vec<f64> = self
            .patterns
            .iter()
            .map(|(_, count)| count as f64 + self.prior.pattern_pseudocount)
            .collect();
        let prior_weight = if self.priors.is_empty() {
            0.0
        } else {
            self.prior.unseen_pseudocount / self.priors.len() as f64
        };
        weights.extend(std::iter::repeat(prior_weight).take(self.priors.len()));

        if weights.is_empty() {
            return (Vec::new(), Vec::new());
        }
        if !(weights.iter().sum::<f64>() > 0.0) {
            let uniform = vec![1.0; self.priors.len()];
            return (vec![0; n_patterns], multinomial(rng, self.unsampled, &uniform));
        }

        let mut urn = Fenwick::from_weights(&weights);
        let mut drawn = vec![0u64; weights.len()];
        for _ in 0..self.unsampled {
            let target = rng.random::<f64>() * urn.total();
            let k = urn.find(target);
            urn.add(k, 1.0);
            drawn[k] += 1;
        }

        let priors = drawn.split_off(n_patterns);
        (drawn, priors)
    }
}

fn gamma_variate<R: Rng + ?Sized>(rng: &mut R, shape: f64) -> f64 {
    if !(shape > 0.0) {
        return 0.0;
    }
    Gamma::new(shape, 1.0).map_or(0.0, |g| g.sample(rng))
}

fn binomial<R: Rng + ?Sized>(rng: &mut R, n: u64, p: f64) -> u64 {
    if n == 0 || !(p > 0.0) {
        0
    } else if p >= 1.0 {
        n
    } else {
        Binomial::new(n, p).map_or(0, |b| b.sample(rng))
    }
}

/// Multinomial draw of `n` items over non-negative `weights` by sequential
/// conditional binomials. The last positive-weight bucket takes the remainder,
/// so counts always sum to `n` when some weight is positive.
fn multinomial<R: Rng + ?Sized>(rng: &mut R, n: u64, weights: &[f64]) -> Vec<u64> {
    let mut counts = vec![0u64; weights.len()];
    let Some(last) = weights.iter().rposition(|&w| w > 0.0) else {
        return counts;
    };

    let mut remaining = n;
    let mut remaining_mass: f64 = weights.iter().filter(|&&w| w > 0.0).sum();
    for (k, &w) in weights.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        if k == last {
            counts[k] = remaining;
            break;
        }
        if w <= 0.0 {
            continue;
        }
        let x = binomial(rng, remaining, w / remaining_mass);
        counts[k] = x;
        remaining -= x;
        remaining_mass -= w;
    }
    counts
}

/// Fenwick tree over f64 weights for O(log n) urn draws.
struct Fenwick {
    tree: Vec<f64>,
    total: f64,
    last_positive: usize,
}

impl Fenwick {
    fn from_weights(weights: &[f64]) -> Self {
        let n = weights.len();
        let mut tree = vec![0.0; n + 1];
        for (i, &w) in weights.iter().enumerate() {
            let idx = i + 1;
            tree[idx] += w;
            let parent = idx + (idx & idx.wrapping_neg());
            if parent <= n {
                tree[parent] += tree[idx];
            }
        }
        Self {
            tree,
            total: weights.iter().sum(),
            last_positive: weights.iter().rposition(|&w| w > 0.0).unwrap_or(0),
        }
    }

    fn total(&self) -> f64 {
        self.total
    }

    fn add(&mut self, index: usize, delta: f64) {
        let n = self.tree.len() - 1;
        let mut idx = index + 1;
        while idx <= n {
            self.tree[idx] += delta;
            idx += idx & idx.wrapping_neg();
        }
        self.total += delta;
        if delta > 0.0 {
            self.last_positive = self.last_positive.max(index);
        }
    }

    /// Index whose cumulative interval contains `target`. A target at or
    /// past the total, as rounding can produce, lands on the last bucket
    /// with positive weight.
    fn find(&self, target: f64) -> usize {
        let n = self.tree.len() - 1;
        let mut pos = 0;
        let mut rem = target;
        let mut step = if n == 0 { 0 } else { 1usize << (usize::BITS - 1 - n.leading_zeros()) };
        while step > 0 {
            let next = pos + step;
            if next <= n && self.tree[next] <= rem {
                pos = next;
                rem -= self.tree[next];
            }
            step >>= 1;
        }
        pos.min(self.last_positive)
    }
}
