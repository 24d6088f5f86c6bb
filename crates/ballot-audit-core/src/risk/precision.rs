//! Trials needed for a trustworthy estimate.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PRECISION_Z, DEFAULT_RELATIVE_PRECISION};
use crate::error::ConfigError;

/// Desired Monte Carlo precision at the decision boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecisionTarget {
    /// Standard error as a fraction of α, before dividing by `z`.
    pub relative: f64,
    /// Normal quantile for the confidence level (1.96 ≈ 95%).
    pub z: f64,
}

impl Default for PrecisionTarget {
    fn default() -> Self {
        Self {
            relative: DEFAULT_RELATIVE_PRECISION,
            z: DEFAULT_PRECISION_Z,
        }
    }
}

impl PrecisionTarget {
    /// Valid trials needed at risk limit `risk_limit`.
    pub fn min_trials(&self, risk_limit: f64) -> u64 {
        min_trials_for_precision(risk_limit, self.relative, self.z)
    }

    /// Both parameters must be positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("precision.relative", self.relative), ("precision.z", self.z)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        Ok(())
    }
}

/// Trials `N` such that, at `p̂ = 1 − α`, the standard error
/// `sqrt(α(1−α)/N)` is at most `relative_precision · α / z`:
///
/// `N = ceil(z² (1 − α) / (relative_precision² α))`
///
/// At α = 0.05 with the defaults this is 1168 trials; at α = 0.01, 6086.
pub fn min_trials_for_precision(risk_limit: f64, relative_precision: f64, z: f64) -> u64 {
    let n = z * z * (1.0 - risk_limit) / (relative_precision * relative_precision * risk_limit);
    n.ceil().max(1.0) as u64
}

/// Binomial standard error of `p̂` over `valid` trials; 0 with no trials.
pub fn monte_carlo_standard_error(p_hat: f64, valid: u64) -> f64 {
    if valid == 0 {
        return 0.0;
    }
    (p_hat * (1.0 - p_hat) / valid as f64).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_trials_defaults() {
        let target = PrecisionTarget::default();
        assert_eq!(target.min_trials(0.05), 1168);
        assert_eq!(target.min_trials(0.01), 6086);
        assert!(target.min_trials(0.10) < target.min_trials(0.05));
    }

    #[test]
    fn test_standard_error() {
        assert_eq!(monte_carlo_standard_error(1.0, 100), 0.0);
        assert_eq!(monte_carlo_standard_error(0.5, 0), 0.0);
        assert!((monte_carlo_standard_error(0.5, 100) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_nonpositive() {
        let target = PrecisionTarget {
            relative: 0.0,
            z: 1.96,
        };
        assert!(target.validate().is_err());
    }
}
