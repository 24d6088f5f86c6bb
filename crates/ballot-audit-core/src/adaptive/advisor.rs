//! Next-round sample size.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the next round's size grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EscalationPolicy {
    /// Always draw `round_size` more ballots.
    Fixed {
        /// Ballots per round.
        round_size: u64,
    },
    /// Grow the cumulative sample by `factor` each round.
    Multiplicative {
        /// Cumulative growth factor, > 1.
        factor: f64,
    },
    /// Draw `base × clamp(risk / α, 1, max_factor)` more ballots, so rounds
    /// grow while the estimate is far from the limit.
    RiskScaled {
        /// Ballots per round at the limit.
        base: u64,
        /// Cap on the scaling factor.
        max_factor: f64,
    },
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        EscalationPolicy::Multiplicative { factor: 2.0 }
    }
}

impl EscalationPolicy {
    /// Check the policy parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            EscalationPolicy::Fixed { round_size } if round_size == 0 => {
                Err(ConfigError::Zero("escalation.round_size"))
            }
            EscalationPolicy::Multiplicative { factor } if !(factor > 1.0) || !factor.is_finite() => {
                Err(ConfigError::OutOfRange {
                    name: "escalation.factor",
                    value: factor,
                })
            }
            EscalationPolicy::RiskScaled { base, .. } if base == 0 => {
                Err(ConfigError::Zero("escalation.base"))
            }
            EscalationPolicy::RiskScaled { max_factor, .. }
                if !(max_factor >= 1.0) || !max_factor.is_finite() =>
            {
                Err(ConfigError::OutOfRange {
                    name: "escalation.max_factor",
                    value: max_factor,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Proposes how many more ballots to draw.
///
/// Proposals never decrease from one round to the next, never exceed the
/// unsampled count and are never zero while ballots remain.
#[derive(Debug, Clone, Copy)]
pub struct SampleSizeAdvisor {
    policy: EscalationPolicy,
    risk_limit: f64,
}

impl SampleSizeAdvisor {
    /// Advisor for a policy and risk limit.
    pub fn new(policy: EscalationPolicy, risk_limit: f64) -> Self {
        Self { policy, risk_limit }
    }

    /// Size of the first round.
    pub fn initial(&self, initial_round_size: u64, total_cast: u64) -> u64 {
        initial_round_size.clamp(1, total_cast.max(1))
    }

    /// Additional ballots for the next round.
    pub fn propose(&self, p_hat: f64, observed: u64, unsampled: u64, previous: Option<u64>) -> u64 {
        if unsampled == 0 {
            return 0;
        }
        let raw = match self.policy {
            EscalationPolicy::Fixed { round_size } => round_size,
            EscalationPolicy::Multiplicative { factor } => {
                (observed as f64 * (factor - 1.0)).ceil() as u64
            }
            EscalationPolicy::RiskScaled { base, max_factor } => {
                let scale = ((1.0 - p_hat) / self.risk_limit).clamp(1.0, max_factor);
                (base as f64 * scale).ceil() as u64
            }
        };
        raw.max(previous.unwrap_or(0)).max(1).min(unsampled)
    }
}
