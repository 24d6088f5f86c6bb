//! The round transition.
//!
//! # Usage Pattern
//!
//! ```ignore
//! let mut state = AuditState::new(&contest);
//! let ctx = RoundContext::new(&contest, &config, &Stv, &oracle);
//!
//! loop {
//!     let ballots = /* transcribed by the audit team */;
//!     let outcome = audit_round(&state, &ctx, ballots)?;
//!     state = outcome.state;
//!     if outcome.report.is_terminal() {
//!         break;
//!     }
//! }
//! ```

use std::sync::atomic::AtomicBool;

use tracing::{info, warn};

use crate::contest::AuditContext;
use crate::error::{AuditError, AuditWarning};
use crate::posterior::PosteriorSampler;
use crate::result::{self, RoundReport};
use crate::risk::RiskEstimator;
use crate::seed::round_seed;
use crate::simulate::OutcomeSimulator;
use crate::tabulation::VoteCounter;
use crate::tiebreak::TieBreakOracle;
use crate::types::Ranking;

use super::{AuditState, AuditStatus, RoundConfig, RoundRecord, SampleSizeAdvisor, StoppingRule};

/// Immutable collaborators shared by every round.
#[derive(Clone, Copy)]
pub struct RoundContext<'a> {
    /// Contest facts.
    pub contest: &'a AuditContext,
    /// Statistical settings.
    pub config: &'a RoundConfig,
    /// Counting engine.
    pub engine: &'a dyn VoteCounter,
    /// Tie-break oracle.
    pub oracle: &'a TieBreakOracle,
}

impl<'a> RoundContext<'a> {
    /// Bundle the round collaborators.
    pub fn new(
        contest: &'a AuditContext,
        config: &'a RoundConfig,
        engine: &'a dyn VoteCounter,
        oracle: &'a TieBreakOracle,
    ) -> Self {
        Self {
            contest,
            config,
            engine,
            oracle,
        }
    }
}

/// New state plus the round's report.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    /// State after the round.
    pub state: AuditState,
    /// Report for the round.
    pub report: RoundReport,
}

/// Run one audit round: admit `ballots`, estimate the risk, decide.
///
/// `state` is left untouched; the new state is returned in the outcome.
pub fn audit_round(
    state: &AuditState,
    ctx: &RoundContext<'_>,
    ballots: Vec<Ranking>,
) -> Result<RoundOutcome, AuditError> {
    run_round(state, ctx, ballots, None)
}

/// As [`audit_round`], but the trial batch is abandoned if `cancel` is
/// raised while it runs. An abandoned round returns
/// [`AuditError::BatchAbandoned`] and commits nothing.
pub fn audit_round_cancellable(
    state: &AuditState,
    ctx: &RoundContext<'_>,
    ballots: Vec<Ranking>,
    cancel: &AtomicBool,
) -> Result<RoundOutcome, AuditError> {
    run_round(state, ctx, ballots, Some(cancel))
}

fn run_round(
    state: &AuditState,
    ctx: &RoundContext<'_>,
    ballots: Vec<Ranking>,
    cancel: Option<&AtomicBool>,
) -> Result<RoundOutcome, AuditError> {
    if state.is_concluded() {
        return Err(AuditError::AuditConcluded);
    }
    let config = ctx.config;
    config.validate()?;

    let round = state.round() + 1;
    let mut pool = state.pool().clone();
    let admission = pool.record_round(round, ballots);

    let snapshot = pool.snapshot();
    let sampler = PosteriorSampler::new(&snapshot, config.policy, config.prior, round);
    let roster = ctx.contest.roster();
    let simulator = OutcomeSimulator::new(ctx.engine, ctx.oracle, roster, ctx.contest.seats());
    let estimator = RiskEstimator::new(
        &sampler,
        simulator,
        ctx.contest.reported(),
        config.trials,
        round_seed(config.seed, round),
    );

    let estimate = match cancel {
        Some(flag) => estimator
            .estimate_cancellable(flag)
            .ok_or(AuditError::BatchAbandoned { round })?,
        None => estimator.estimate(),
    };

    let unsampled = pool.unsampled_count();
    let full_count = estimate
        .tally
        .most_common()
        .filter(|_| unsampled == 0)
        .map(|(_, count)| count.exemplar.clone());
    let status = StoppingRule::new(config.risk_limit).decide(estimate.p_hat, unsampled, full_count);

    let next_sample_size = match status {
        AuditStatus::Continue => Some(
            SampleSizeAdvisor::new(config.escalation, config.risk_limit).propose(
                estimate.p_hat,
                pool.observed_count(),
                unsampled,
                state.last_proposal(),
            ),
        ),
        _ => None,
    };

    let min_trials = config.min_trials();
    let mut warnings = Vec::new();
    if !admission.rejected.is_empty() {
        warnings.push(AuditWarning::RejectedBallots {
            count: admission.rejected.len(),
        });
    }
    if estimate.valid() < min_trials {
        warnings.push(AuditWarning::InsufficientTrials {
            valid: estimate.valid(),
            required: min_trials,
        });
    }
    if estimate.discard_rate() > config.max_discard_rate {
        warnings.push(AuditWarning::HighDiscardRate {
            rate: estimate.discard_rate(),
        });
    }
    for warning in &warnings {
        warn!(round, %warning, "round warning");
    }

    info!(
        round,
        observed = pool.observed_count(),
        unsampled,
        p_hat = estimate.p_hat,
        status = %status,
        next = ?next_sample_size,
        "round complete"
    );

    let report = RoundReport {
        round,
        observed: pool.observed_count(),
        unsampled,
        total_cast: pool.total_cast(),
        admitted: admission.admitted,
        rejected: admission.rejected,
        p_hat: estimate.p_hat,
        risk: estimate.risk(),
        risk_limit: config.risk_limit,
        standard_error: estimate.standard_error,
        status: status.clone(),
        next_sample_size,
        trials: result::trial_summary(&estimate, min_trials),
        most_common: result::most_common(&estimate),
        candidate_win_rates: result::candidate_win_rates(&estimate, roster),
        warnings,
    };
    let record = RoundRecord {
        round,
        observed: report.observed,
        p_hat: report.p_hat,
        risk: report.risk,
        status,
        next_sample_size,
    };

    Ok(RoundOutcome {
        state: state.clone().advance(pool, record),
        report,
    })
}
