//! Resampling strategy and prior strength.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PATTERN_PSEUDOCOUNT, DEFAULT_UNSEEN_PSEUDOCOUNT};
use crate::error::ConfigError;

/// How the unsampled ballots are imputed from the observed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingPolicy {
    /// Draw pattern probabilities from a Dirichlet posterior by normalising
    /// independent `Gamma(c_k + pseudocount, 1)` variates, then draw the
    /// unsampled ballots from those probabilities.
    #[default]
    GammaDirichlet,

    /// Polya urn: repeatedly draw a ballot from the urn (observed plus prior
    /// ballots) and return it together with a copy.
    ///
    /// Marginally the same Dirichlet-multinomial as `GammaDirichlet`, but
    /// costs one draw per imputed ballot.
    PolyaUrn,

    /// Plain bootstrap: draw the unsampled ballots with probabilities
    /// proportional to the prior-adjusted observed counts, with no Dirichlet
    /// layer. Understates posterior uncertainty; kept for comparison runs.
    Bootstrap,

    /// Draw every head-to-head margin of the unsampled ballots from
    /// `Beta(wins + 1, losses + 1)` over the observed pairwise preferences,
    /// then rebuild complete rankings meeting those margins with ranked
    /// pairs. Imputed ballots are not limited to observed patterns; the
    /// pseudocounts of [`PriorConfig`] are not used.
    PairwiseBeta,
}

impl ResamplingPolicy {
    /// Short label for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            ResamplingPolicy::GammaDirichlet => "gamma-dirichlet",
            ResamplingPolicy::PolyaUrn => "polya-urn",
            ResamplingPolicy::Bootstrap => "bootstrap",
            ResamplingPolicy::PairwiseBeta => "pairwise-beta",
        }
    }
}

/// Prior pseudocounts.
///
/// `unseen_pseudocount` is the mass of the "unseen pattern" bucket. That
/// mass is spread evenly over one length-one prior ballot per candidate, so
/// every candidate can receive first preferences the sample has not shown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorConfig {
    /// Added to each observed pattern count.
    pub pattern_pseudocount: f64,
    /// Total weight of the prior ballots.
    pub unseen_pseudocount: f64,
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            pattern_pseudocount: DEFAULT_PATTERN_PSEUDOCOUNT,
            unseen_pseudocount: DEFAULT_UNSEEN_PSEUDOCOUNT,
        }
    }
}

impl PriorConfig {
    /// Both pseudocounts must be finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("pattern_pseudocount", self.pattern_pseudocount),
            ("unseen_pseudocount", self.unseen_pseudocount),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        Ok(())
    }
}
