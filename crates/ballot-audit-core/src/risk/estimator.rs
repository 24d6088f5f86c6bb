//! Parallel Monte Carlo risk estimation.

use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::posterior::PosteriorSampler;
use crate::simulate::OutcomeSimulator;
use crate::types::ReportedOutcome;

use super::{monte_carlo_standard_error, TrialTally};

/// Aggregated result of one batch of trials.
#[derive(Debug, Clone)]
pub struct RiskEstimate {
    /// Trials requested.
    pub requested: u64,
    /// Seed of the round's trial substreams.
    pub round_seed: u64,
    /// Estimated posterior probability that the reported outcome is correct.
    pub p_hat: f64,
    /// Monte Carlo standard error of `p_hat`.
    pub standard_error: f64,
    /// Raw counters and diagnostics.
    pub tally: TrialTally,
}

impl RiskEstimate {
    fn from_tally(requested: u64, round_seed: u64, tally: TrialTally) -> Self {
        let p_hat = tally.p_hat();
        Self {
            requested,
            round_seed,
            p_hat,
            standard_error: monte_carlo_standard_error(p_hat, tally.valid()),
            tally,
        }
    }

    /// Estimated probability that the reported outcome is wrong.
    pub fn risk(&self) -> f64 {
        1.0 - self.p_hat
    }

    /// Trials that produced an outcome.
    pub fn valid(&self) -> u64 {
        self.tally.valid()
    }

    /// Discarded / requested.
    pub fn discard_rate(&self) -> f64 {
        if self.requested == 0 {
            0.0
        } else {
            self.tally.discarded as f64 / self.requested as f64
        }
    }
}

/// Runs `trials` independent posterior draws through the counting engine.
///
/// Trial `i` always uses substream `counter_rng_seed(round_seed, i)`, so the
/// estimate is identical for any thread count.
pub struct RiskEstimator<'a> {
    sampler: &'a PosteriorSampler,
    simulator: OutcomeSimulator<'a>,
    reported: &'a ReportedOutcome,
    trials: u64,
    round_seed: u64,
}

impl<'a> RiskEstimator<'a> {
    /// Bind the round's sampler and simulator.
    pub fn new(
        sampler: &'a PosteriorSampler,
        simulator: OutcomeSimulator<'a>,
        reported: &'a ReportedOutcome,
        trials: u64,
        round_seed: u64,
    ) -> Self {
        Self {
            sampler,
            simulator,
            reported,
            trials,
            round_seed,
        }
    }

    /// Run the whole batch.
    pub fn estimate(&self) -> RiskEstimate {
        let tally = self.run_trials(None);
        self.finish(tally)
    }

    /// Run the batch, abandoning it if `cancel` is raised before it
    /// completes. An abandoned batch yields `None`; no partial result
    /// escapes.
    pub fn estimate_cancellable(&self, cancel: &AtomicBool) -> Option<RiskEstimate> {
        let tally = self.run_trials(Some(cancel));
        if tally.cancelled || cancel.load(Ordering::Relaxed) {
            debug!(trials = self.trials, "trial batch abandoned");
            return None;
        }
        Some(self.finish(tally))
    }

    fn finish(&self, tally: TrialTally) -> RiskEstimate {
        let estimate = RiskEstimate::from_tally(self.trials, self.round_seed, tally);
        if estimate.tally.discarded > 0 {
            warn!(
                discarded = estimate.tally.discarded,
                requested = self.trials,
                reasons = ?estimate.tally.discard_reasons,
                "trials discarded by counting engine"
            );
        }
        debug!(
            valid = estimate.valid(),
            matches = estimate.tally.matches,
            p_hat = estimate.p_hat,
            standard_error = estimate.standard_error,
            "risk estimate"
        );
        estimate
    }

    fn trial(&self, mut acc: TrialTally, i: u64, cancel: Option<&AtomicBool>) -> TrialTally {
        if acc.cancelled || cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            acc.cancelled = true;
            return acc;
        }
        let population = self.sampler.sample_trial(self.round_seed, i);
        acc.record(i, self.simulator.run(&population), self.reported);
        acc
    }

    fn run_trials(&self, cancel: Option<&AtomicBool>) -> TrialTally {
        #[cfg(feature = "parallel")]
        let tally = (0..self.trials)
            .into_par_iter()
            .fold_with(TrialTally::default(), |acc, i| self.trial(acc, i, cancel))
            .reduce(TrialTally::default, |mut a, b| {
                a.merge(b);
                a
            });

        #[cfg(not(feature = "parallel"))]
        let tally = (0..self.trials).fold(TrialTally::default(), |acc, i| self.trial(acc, i, cancel));

        tally
    }
}
