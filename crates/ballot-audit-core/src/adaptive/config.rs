//! Per-audit parameters consumed by every round.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_INITIAL_ROUND_SIZE, DEFAULT_MAX_DISCARD_RATE, DEFAULT_RISK_LIMIT, DEFAULT_SEED,
    DEFAULT_TRIALS,
};
use crate::error::ConfigError;
use crate::posterior::{PriorConfig, ResamplingPolicy};
use crate::risk::PrecisionTarget;

use super::EscalationPolicy;

/// Statistical settings for the round transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Risk limit α, in (0, 1).
    pub risk_limit: f64,
    /// Monte Carlo trials per round.
    pub trials: u64,
    /// Master seed; each round and trial derives its own substream.
    pub seed: u64,
    /// Imputation scheme.
    pub policy: ResamplingPolicy,
    /// Prior pseudocounts.
    pub prior: PriorConfig,
    /// Round-size escalation.
    pub escalation: EscalationPolicy,
    /// Ballots to draw in round one.
    pub initial_round_size: u64,
    /// Precision target behind the insufficient-trials warning.
    pub precision: PrecisionTarget,
    /// Discard rate above which a warning is attached.
    pub max_discard_rate: f64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            risk_limit: DEFAULT_RISK_LIMIT,
            trials: DEFAULT_TRIALS,
            seed: DEFAULT_SEED,
            policy: ResamplingPolicy::default(),
            prior: PriorConfig::default(),
            escalation: EscalationPolicy::default(),
            initial_round_size: DEFAULT_INITIAL_ROUND_SIZE,
            precision: PrecisionTarget::default(),
            max_discard_rate: DEFAULT_MAX_DISCARD_RATE,
        }
    }
}

impl RoundConfig {
    /// Check every parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.risk_limit > 0.0 && self.risk_limit < 1.0) {
            return Err(ConfigError::RiskLimit(self.risk_limit));
        }
        if self.trials == 0 {
            return Err(ConfigError::Zero("trials"));
        }
        if self.initial_round_size == 0 {
            return Err(ConfigError::Zero("initial_round_size"));
        }
        if !(0.0..=1.0).contains(&self.max_discard_rate) {
            return Err(ConfigError::OutOfRange {
                name: "max_discard_rate",
                value: self.max_discard_rate,
            });
        }
        self.prior.validate()?;
        self.precision.validate()?;
        self.escalation.validate()
    }

    /// Valid trials below which a round carries an insufficient-trials
    /// warning.
    pub fn min_trials(&self) -> u64 {
        self.precision.min_trials(self.risk_limit)
    }
}
