//! Simulated elections for drills and end-to-end tests.
//!
//! Ballots are biased so that candidate order `1, 2, …, m` is likely: each
//! ballot gives candidate `i` the score `i + v·U` with `U ~ Uniform(0, 1)`
//! and `v = m / 2`, then ranks candidates by increasing score. With Borda or
//! STV the reported winners `1..=seats` are therefore the expected outcome.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

use ballot_audit_core::{Candidate, CandidateId, Ranking};

use crate::audit::{AuditSummary, BayesianAudit};
use crate::config::{AuditConfig, AuditConfigBuilder};
use crate::error::Error;

/// Ballots drawn per batch when the caller does not ask for a size.
pub const DEFAULT_BATCH_SIZE: u64 = 100;

/// A synthetic contest that hands out ballots in batches.
#[derive(Debug, Clone)]
pub struct SimulatedElection {
    candidates: u32,
    total_cast: u64,
    seats: usize,
    drawn: u64,
    rng: Xoshiro256PlusPlus,
}

impl SimulatedElection {
    /// `candidates` candidates with ids `1..=candidates`, `total_cast`
    /// ballots, `seats` seats.
    ///
    /// # Panics
    ///
    /// Panics if any count is zero or `seats > candidates`.
    pub fn new(candidates: u32, total_cast: u64, seats: usize, seed: u64) -> Self {
        assert!(candidates > 0, "candidates must be > 0 (got {})", candidates);
        assert!(total_cast > 0, "total_cast must be > 0 (got {})", total_cast);
        assert!(
            seats > 0 && seats <= candidates as usize,
            "seats must be in 1..={} (got {})",
            candidates,
            seats
        );
        Self {
            candidates,
            total_cast,
            seats,
            drawn: 0,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// The candidate list.
    pub fn candidates(&self) -> Vec<Candidate> {
        (1..=self.candidates)
            .map(|id| Candidate::new(id, format!("Candidate {}", id)))
            .collect()
    }

    /// The outcome the bias makes likely: candidates `1..=seats`.
    pub fn expected_winners(&self) -> Vec<u32> {
        (1..=self.seats as u32).collect()
    }

    /// Ballots handed out so far.
    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    /// Ballots not yet handed out.
    pub fn remaining(&self) -> u64 {
        self.total_cast - self.drawn
    }

    /// A configuration builder for auditing this election, pre-filled with
    /// the candidates, seats, ballots cast and expected winners.
    pub fn config_builder(&self) -> AuditConfigBuilder {
        AuditConfig::builder()
            .candidates(self.candidates())
            .seats(self.seats)
            .total_cast(self.total_cast)
            .reported_winners(&self.expected_winners())
    }

    /// Draw up to `count` ballots, never exceeding the ballots cast.
    pub fn draw(&mut self, count: u64) -> Vec<Ranking> {
        let count = count.min(self.remaining());
        let noise = self.candidates as f64 / 2.0;
        let mut ballots = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut scored: Vec<(f64, u32)> = (1..=self.candidates)
                .map(|id| ((id - 1) as f64 + noise * self.rng.random::<f64>(), id))
                .collect();
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));
            ballots.push(Ranking::new(
                scored.into_iter().map(|(_, id)| CandidateId(id)).collect(),
            ));
        }
        self.drawn += count;
        ballots
    }

    /// Draw a default-sized batch.
    pub fn draw_batch(&mut self) -> Vec<Ranking> {
        self.draw(DEFAULT_BATCH_SIZE)
    }

    /// Run `audit` to a terminal state, drawing each round's proposed
    /// sample from this election.
    pub fn run_audit(&mut self, audit: &mut BayesianAudit) -> Result<AuditSummary, Error> {
        while let Some(size) = audit.next_sample_size() {
            let ballots = self.draw(size);
            if ballots.is_empty() {
                break;
            }
            debug!(round = audit.state().round() + 1, size = ballots.len(), "drawing simulated batch");
            audit.run_round(ballots)?;
        }
        Ok(audit.summary())
    }
}
