//! Per-round report consumed by the manual audit workflow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::adaptive::{AuditState, AuditStatus};
use crate::constants::LOW_FREQUENCY_WIN_RATE;
use crate::error::AuditWarning;
use crate::pool::RejectedBallot;
use crate::risk::RiskEstimate;
use crate::types::{CandidateId, CandidateRoster};

/// Trial bookkeeping for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Trials requested.
    pub requested: u64,
    /// Seed of the round's trial substreams; trial `i` is regenerated by
    /// [`crate::PosteriorSampler::sample_trial`] with this seed and `i`.
    pub round_seed: u64,
    /// Trials that produced an outcome.
    pub valid: u64,
    /// Valid trials matching the reported outcome.
    pub matches: u64,
    /// Trials the engine rejected.
    pub discarded: u64,
    /// Discards by reason.
    pub discard_reasons: BTreeMap<String, u64>,
    /// Oracle tie resolutions used across all trials.
    pub ties_resolved: u64,
    /// Valid trials needed for the configured precision.
    pub min_trials_for_precision: u64,
}

/// The most frequent simulated winner set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeFrequency {
    /// Winners in election order, from the first trial producing the set.
    pub winners: Vec<CandidateId>,
    /// Trials producing this set.
    pub count: u64,
    /// `count / valid`.
    pub fraction: f64,
}

/// Share of valid trials electing one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateWinRate {
    /// Candidate id.
    pub candidate: CandidateId,
    /// Display name.
    pub name: String,
    /// Fraction of valid trials in which the candidate won a seat.
    pub fraction: f64,
    /// For rare winners, the lowest trial that elected them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness_trial: Option<u64>,
}

/// Everything reported after one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    /// Round number, from 1.
    pub round: u32,
    /// Cumulative observed ballots.
    pub observed: u64,
    /// Ballots not yet sampled.
    pub unsampled: u64,
    /// Official ballots cast.
    pub total_cast: u64,
    /// Ballots admitted this round.
    pub admitted: usize,
    /// Ballots rejected this round.
    pub rejected: Vec<RejectedBallot>,
    /// Estimated probability the reported outcome is correct.
    pub p_hat: f64,
    /// `1 − p_hat`.
    pub risk: f64,
    /// Risk limit α.
    pub risk_limit: f64,
    /// Monte Carlo standard error of `p_hat`.
    pub standard_error: f64,
    /// Verdict.
    pub status: AuditStatus,
    /// Ballots to draw next round, when continuing.
    pub next_sample_size: Option<u64>,
    /// Trial bookkeeping.
    pub trials: TrialSummary,
    /// Most common simulated outcome.
    pub most_common: Option<OutcomeFrequency>,
    /// Per-candidate win fractions, in roster order.
    pub candidate_win_rates: Vec<CandidateWinRate>,
    /// Non-fatal conditions.
    pub warnings: Vec<AuditWarning>,
}

impl RoundReport {
    /// True if the round ended the audit.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Report for an audit stopped at a round boundary without running a
    /// round. No ballots are admitted and no trials run; the estimate is
    /// carried over from `previous`, or is empty before the first round.
    pub fn forced_stop(state: &AuditState, risk_limit: f64, previous: Option<&RoundReport>) -> Self {
        let pool = state.pool();
        let base = match previous {
            Some(report) => report.clone(),
            None => RoundReport {
                round: 0,
                observed: 0,
                unsampled: 0,
                total_cast: 0,
                admitted: 0,
                rejected: Vec::new(),
                p_hat: 0.0,
                risk: 1.0,
                risk_limit,
                standard_error: 0.0,
                status: AuditStatus::Continue,
                next_sample_size: None,
                trials: TrialSummary {
                    requested: 0,
                    round_seed: 0,
                    valid: 0,
                    matches: 0,
                    discarded: 0,
                    discard_reasons: BTreeMap::new(),
                    ties_resolved: 0,
                    min_trials_for_precision: 0,
                },
                most_common: None,
                candidate_win_rates: Vec::new(),
                warnings: Vec::new(),
            },
        };
        RoundReport {
            round: state.round(),
            observed: pool.observed_count(),
            unsampled: pool.unsampled_count(),
            total_cast: pool.total_cast(),
            admitted: 0,
            rejected: Vec::new(),
            risk_limit,
            status: state.status().clone(),
            next_sample_size: None,
            warnings: Vec::new(),
            ..base
        }
    }
}

pub(crate) fn trial_summary(estimate: &RiskEstimate, min_trials: u64) -> TrialSummary {
    TrialSummary {
        requested: estimate.requested,
        round_seed: estimate.round_seed,
        valid: estimate.valid(),
        matches: estimate.tally.matches,
        discarded: estimate.tally.discarded,
        discard_reasons: estimate
            .tally
            .discard_reasons
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
        ties_resolved: estimate.tally.ties_resolved,
        min_trials_for_precision: min_trials,
    }
}

pub(crate) fn most_common(estimate: &RiskEstimate) -> Option<OutcomeFrequency> {
    let valid = estimate.valid();
    estimate.tally.most_common().map(|(_, count)| OutcomeFrequency {
        winners: count.exemplar.0.clone(),
        count: count.count,
        fraction: if valid == 0 {
            0.0
        } else {
            count.count as f64 / valid as f64
        },
    })
}

pub(crate) fn candidate_win_rates(
    estimate: &RiskEstimate,
    roster: &CandidateRoster,
) -> Vec<CandidateWinRate> {
    let valid = estimate.valid();
    roster
        .candidates()
        .iter()
        .map(|c| {
            let wins = estimate.tally.candidate_wins.get(&c.id).copied().unwrap_or(0);
            let fraction = if valid == 0 {
                0.0
            } else {
                wins as f64 / valid as f64
            };
            let witness_trial = estimate
                .tally
                .first_win
                .get(&c.id)
                .copied()
                .filter(|_| fraction < LOW_FREQUENCY_WIN_RATE);
            CandidateWinRate {
                candidate: c.id,
                name: c.name.clone(),
                fraction,
                witness_trial,
            }
        })
        .collect()
}
