//! Audit configuration: builder, JSON file and environment overrides.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ballot_audit_core::{
    AuditContext, Borda, Candidate, CandidateId, ConfigError, EscalationPolicy, PrecisionTarget,
    PriorConfig, ReportedOutcome, ResamplingPolicy, RoundConfig, Stv, TieEvent, VoteCounter,
};

/// Which shipped vote-counting engine tabulates simulated populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingMethod {
    /// Droop-quota STV with Gregory surplus transfer.
    #[default]
    Stv,
    /// Positional Borda count.
    Borda,
}

impl CountingMethod {
    /// The engine implementing this method.
    pub fn engine(&self) -> Box<dyn VoteCounter> {
        match self {
            CountingMethod::Stv => Box::new(Stv),
            CountingMethod::Borda => Box::new(Borda),
        }
    }
}

/// Everything an audit needs before the first ballot is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Candidates in roster order.
    pub candidates: Vec<Candidate>,
    /// Seats to fill.
    pub seats: usize,
    /// Official number of ballots cast.
    pub total_cast: u64,
    /// Declared winners, in election order.
    pub reported_winners: Vec<CandidateId>,
    /// Counting engine.
    #[serde(default)]
    pub counting_method: CountingMethod,
    /// Public seed for the tie-break order.
    #[serde(default)]
    pub tie_break_seed: String,
    /// Tie resolutions recorded by the official count.
    #[serde(default)]
    pub tie_events: Vec<TieEvent>,
    /// Statistical parameters shared by every round.
    #[serde(flatten)]
    pub round: RoundConfig,
    /// Force a stop after this many rounds.
    #[serde(default)]
    pub max_rounds: Option<u32>,
    /// Force a stop once this much wall-clock time has passed.
    #[serde(default)]
    pub time_budget_secs: Option<u64>,
}

impl AuditConfig {
    /// Start building a configuration in code.
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Parse a JSON configuration string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Apply overrides from environment variables.
    ///
    /// Supported variables:
    /// - `AUDIT_TRIALS`: trials per round
    /// - `AUDIT_SEED`: master Monte Carlo seed
    /// - `AUDIT_RISK_LIMIT`: risk limit α
    /// - `AUDIT_MAX_ROUNDS`: maximum number of rounds
    /// - `AUDIT_TIME_BUDGET_SECS`: wall-clock budget in seconds
    ///
    /// Unparseable values are ignored; range errors surface in [`validate`](Self::validate).
    pub fn from_env(mut self) -> Self {
        if let Some(trials) = parse_u64_env("AUDIT_TRIALS") {
            self.round.trials = trials;
        }
        if let Some(seed) = parse_u64_env("AUDIT_SEED") {
            self.round.seed = seed;
        }
        if let Some(alpha) = parse_f64_env("AUDIT_RISK_LIMIT") {
            self.round.risk_limit = alpha;
        }
        if let Some(rounds) = parse_u64_env("AUDIT_MAX_ROUNDS") {
            self.max_rounds = u32::try_from(rounds).ok();
        }
        if let Some(secs) = parse_u64_env("AUDIT_TIME_BUDGET_SECS") {
            self.time_budget_secs = Some(secs);
        }
        self
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.round.validate()?;
        if self.max_rounds == Some(0) {
            return Err(ConfigError::Zero("max_rounds"));
        }
        self.contest().map(|_| ())
    }

    /// The immutable contest description.
    pub fn contest(&self) -> Result<AuditContext, ConfigError> {
        AuditContext::new(
            self.candidates.clone(),
            self.seats,
            self.total_cast,
            ReportedOutcome::new(self.reported_winners.clone()),
        )
    }

    /// The wall-clock budget, if any.
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_secs.map(Duration::from_secs)
    }
}

fn parse_u64_env(name: &str) -> Option<u64> {
    env::var(name).ok()?.trim().parse().ok()
}

fn parse_f64_env(name: &str) -> Option<f64> {
    env::var(name).ok()?.trim().parse().ok()
}

/// Builder for [`AuditConfig`].
///
/// Setters panic on arguments that can never be valid; cross-field checks
/// happen in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct AuditConfigBuilder {
    candidates: Vec<Candidate>,
    seats: usize,
    total_cast: u64,
    reported_winners: Vec<CandidateId>,
    counting_method: CountingMethod,
    tie_break_seed: String,
    tie_events: Vec<TieEvent>,
    round: RoundConfig,
    max_rounds: Option<u32>,
    time_budget_secs: Option<u64>,
}

impl AuditConfigBuilder {
    /// Add a candidate.
    pub fn candidate(mut self, id: u32, name: impl Into<String>) -> Self {
        self.candidates.push(Candidate::new(id, name));
        self
    }

    /// Replace the candidate list.
    pub fn candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Number of seats.
    ///
    /// # Panics
    ///
    /// Panics if `seats` is 0.
    pub fn seats(mut self, seats: usize) -> Self {
        assert!(seats > 0, "seats must be > 0 (got {})", seats);
        self.seats = seats;
        self
    }

    /// Official ballots cast.
    ///
    /// # Panics
    ///
    /// Panics if `total_cast` is 0.
    pub fn total_cast(mut self, total_cast: u64) -> Self {
        assert!(total_cast > 0, "total_cast must be > 0 (got {})", total_cast);
        self.total_cast = total_cast;
        self
    }

    /// Declared winners, in election order.
    pub fn reported_winners(mut self, winners: &[u32]) -> Self {
        self.reported_winners = winners.iter().copied().map(CandidateId).collect();
        self
    }

    /// Counting engine.
    pub fn counting_method(mut self, method: CountingMethod) -> Self {
        self.counting_method = method;
        self
    }

    /// Public tie-break seed.
    pub fn tie_break_seed(mut self, seed: impl Into<String>) -> Self {
        self.tie_break_seed = seed.into();
        self
    }

    /// Record an official tie resolution.
    pub fn tie_event(mut self, event: TieEvent) -> Self {
        self.tie_events.push(event);
        self
    }

    /// Risk limit α.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not in (0, 1).
    pub fn risk_limit(mut self, alpha: f64) -> Self {
        assert!(
            alpha > 0.0 && alpha < 1.0,
            "risk_limit must be in (0, 1) (got {})",
            alpha
        );
        self.round.risk_limit = alpha;
        self
    }

    /// Monte Carlo trials per round.
    ///
    /// # Panics
    ///
    /// Panics if `trials` is 0.
    pub fn trials(mut self, trials: u64) -> Self {
        assert!(trials > 0, "trials must be > 0 (got {})", trials);
        self.round.trials = trials;
        self
    }

    /// Master Monte Carlo seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.round.seed = seed;
        self
    }

    /// Posterior resampling scheme.
    pub fn policy(mut self, policy: ResamplingPolicy) -> Self {
        self.round.policy = policy;
        self
    }

    /// Prior pseudocounts.
    ///
    /// # Panics
    ///
    /// Panics if either pseudocount is negative or non-finite.
    pub fn prior(mut self, prior: PriorConfig) -> Self {
        assert!(
            prior.validate().is_ok(),
            "prior pseudocounts must be finite and >= 0 (got {:?})",
            prior
        );
        self.round.prior = prior;
        self
    }

    /// Round size escalation.
    ///
    /// # Panics
    ///
    /// Panics if the policy's parameters are out of range.
    pub fn escalation(mut self, escalation: EscalationPolicy) -> Self {
        assert!(
            escalation.validate().is_ok(),
            "invalid escalation policy {:?}",
            escalation
        );
        self.round.escalation = escalation;
        self
    }

    /// Ballots to draw in the first round.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0.
    pub fn initial_round_size(mut self, size: u64) -> Self {
        assert!(size > 0, "initial_round_size must be > 0 (got {})", size);
        self.round.initial_round_size = size;
        self
    }

    /// Precision target for the trial-count guideline.
    pub fn precision(mut self, precision: PrecisionTarget) -> Self {
        self.round.precision = precision;
        self
    }

    /// Maximum rounds before a forced stop.
    ///
    /// # Panics
    ///
    /// Panics if `rounds` is 0.
    pub fn max_rounds(mut self, rounds: u32) -> Self {
        assert!(rounds > 0, "max_rounds must be > 0 (got {})", rounds);
        self.max_rounds = Some(rounds);
        self
    }

    /// Wall-clock budget.
    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_secs = Some(budget.as_secs());
        self
    }

    /// Finish and validate.
    pub fn build(self) -> Result<AuditConfig, ConfigError> {
        let config = AuditConfig {
            candidates: self.candidates,
            seats: self.seats,
            total_cast: self.total_cast,
            reported_winners: self.reported_winners,
            counting_method: self.counting_method,
            tie_break_seed: self.tie_break_seed,
            tie_events: self.tie_events,
            round: self.round,
            max_rounds: self.max_rounds,
            time_budget_secs: self.time_budget_secs,
        };
        config.validate()?;
        Ok(config)
    }
}
