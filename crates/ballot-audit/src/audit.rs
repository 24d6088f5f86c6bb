//! Round-by-round audit orchestration.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ballot_audit_core::{
    audit_round_cancellable, AuditContext, AuditError, AuditState, AuditStatus, CandidateId,
    Ranking, RoundContext, RoundReport, SampleSizeAdvisor, StopReason, TieBreakOracle,
    VoteCounter,
};

use crate::config::AuditConfig;
use crate::data::load_ballots;
use crate::error::Error;

/// Shared flag an operator raises to abandon a batch or stop the audit.
///
/// Raised while a round's trials are running, the batch is abandoned and
/// the audit is left exactly as before the round. Raised between rounds,
/// the next call to [`BayesianAudit::run_round`] stops the audit and
/// returns the stop report instead.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Raise the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True if the flag is raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Final account of an audit, suitable for archiving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Status after the last round.
    pub status: AuditStatus,
    /// Rounds completed.
    pub rounds: u32,
    /// Ballots transcribed across all rounds.
    pub observed: u64,
    /// Official ballots cast.
    pub total_cast: u64,
    /// Risk limit α.
    pub risk_limit: f64,
    /// Declared winners under test.
    pub reported_winners: Vec<CandidateId>,
    /// Derived tie-break order.
    pub tie_break_order: Vec<CandidateId>,
    /// Counting engine name.
    pub counting_method: String,
    /// Resampling policy name.
    pub policy: String,
    /// Every round report, in order.
    pub reports: Vec<RoundReport>,
}

/// A Bayesian ballot-polling audit of one contest.
///
/// Owns the immutable configuration, the counting engine and the tie-break
/// oracle, and threads [`AuditState`] through successive rounds.
pub struct BayesianAudit {
    config: AuditConfig,
    contest: AuditContext,
    engine: Box<dyn VoteCounter>,
    oracle: TieBreakOracle,
    state: AuditState,
    reports: Vec<RoundReport>,
    cancel: CancelHandle,
    started: Instant,
}

impl BayesianAudit {
    /// Set up an audit using the configured counting method.
    pub fn new(config: AuditConfig) -> Result<Self, Error> {
        let engine = config.counting_method.engine();
        Self::with_engine(config, engine)
    }

    /// Set up an audit with a custom counting engine.
    pub fn with_engine(config: AuditConfig, engine: Box<dyn VoteCounter>) -> Result<Self, Error> {
        config.validate()?;
        let contest = config.contest()?;
        let oracle = TieBreakOracle::new(contest.roster(), &config.tie_break_seed, &config.tie_events)?;
        let state = AuditState::new(&contest);

        info!(
            engine = engine.name(),
            policy = config.round.policy.name(),
            candidates = contest.roster().len(),
            seats = contest.seats(),
            total_cast = contest.total_cast(),
            risk_limit = config.round.risk_limit,
            trials = config.round.trials,
            "audit configured"
        );

        Ok(Self {
            config,
            contest,
            engine,
            oracle,
            state,
            reports: Vec::new(),
            cancel: CancelHandle::default(),
            started: Instant::now(),
        })
    }

    /// The configuration the audit was built from.
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// The contest under audit.
    pub fn contest(&self) -> &AuditContext {
        &self.contest
    }

    /// Current state.
    pub fn state(&self) -> &AuditState {
        &self.state
    }

    /// Reports of every completed round.
    pub fn reports(&self) -> &[RoundReport] {
        &self.reports
    }

    /// The tie-break oracle shared by every trial.
    pub fn oracle(&self) -> &TieBreakOracle {
        &self.oracle
    }

    /// A handle the operator can use from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Ballots to draw in the first round.
    pub fn initial_sample_size(&self) -> u64 {
        SampleSizeAdvisor::new(self.config.round.escalation, self.config.round.risk_limit)
            .initial(self.config.round.initial_round_size, self.contest.total_cast())
    }

    /// Ballots to draw next, or `None` once the audit has concluded.
    pub fn next_sample_size(&self) -> Option<u64> {
        if self.state.is_concluded() {
            None
        } else if self.state.round() == 0 {
            Some(self.initial_sample_size())
        } else {
            self.state.last_proposal()
        }
    }

    /// Stop the audit at the operator's request, appending a stop report.
    pub fn stop(&mut self) {
        self.force_stop(StopReason::OperatorStop);
    }

    /// Admit a round of transcribed ballots and decide whether to continue.
    ///
    /// If the cancel flag was raised since the last round, the audit stops
    /// without examining `ballots` and the stop report is returned.
    ///
    /// # Errors
    /// - `AuditConcluded` if the audit already stopped.
    /// - `BatchAbandoned` if the flag was raised while trials were running;
    ///   nothing is committed and the round may be retried.
    pub fn run_round(&mut self, ballots: Vec<Ranking>) -> Result<&RoundReport, Error> {
        if self.state.is_concluded() {
            return Err(AuditError::AuditConcluded.into());
        }
        if self.cancel.0.swap(false, Ordering::SeqCst) {
            warn!(
                round = self.state.round(),
                ignored = ballots.len(),
                "cancelled between rounds"
            );
            self.stop();
            return self.reports.last().ok_or(AuditError::AuditConcluded.into());
        }

        let ctx = RoundContext::new(
            &self.contest,
            &self.config.round,
            self.engine.as_ref(),
            &self.oracle,
        );
        let outcome = match audit_round_cancellable(&self.state, &ctx, ballots, &self.cancel.0) {
            Ok(outcome) => outcome,
            Err(e @ AuditError::BatchAbandoned { .. }) => {
                warn!(round = self.state.round() + 1, "trial batch abandoned");
                self.cancel.0.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        let mut state = outcome.state;
        let mut report = outcome.report;
        if report.status == AuditStatus::Continue {
            if let Some(reason) = self.budget_exhausted(state.round()) {
                info!(round = state.round(), %reason, "audit stopped at round boundary");
                state = state.force_stop(reason);
                report.status = state.status().clone();
                report.next_sample_size = None;
            }
        }

        self.state = state;
        self.reports.push(report);
        Ok(&self.reports[self.reports.len() - 1])
    }

    /// Load a ballot file and run it as the next round.
    pub fn run_round_from_file(&mut self, path: &Path) -> Result<&RoundReport, Error> {
        let ballots = load_ballots(path)?;
        self.run_round(ballots)
    }

    /// Summarise the audit so far.
    pub fn summary(&self) -> AuditSummary {
        AuditSummary {
            status: self.state.status().clone(),
            rounds: self.state.round(),
            observed: self.state.pool().observed_count(),
            total_cast: self.contest.total_cast(),
            risk_limit: self.config.round.risk_limit,
            reported_winners: self.contest.reported().order().0.clone(),
            tie_break_order: self.oracle.order().as_slice().to_vec(),
            counting_method: self.engine.name().to_string(),
            policy: self.config.round.policy.name().to_string(),
            reports: self.reports.clone(),
        }
    }

    fn budget_exhausted(&self, round: u32) -> Option<StopReason> {
        if let Some(max) = self.config.max_rounds {
            if round >= max {
                return Some(StopReason::MaxRounds);
            }
        }
        if let Some(budget) = self.config.time_budget() {
            if self.started.elapsed() >= budget {
                return Some(StopReason::TimeBudget);
            }
        }
        None
    }

    fn force_stop(&mut self, reason: StopReason) {
        if !self.state.is_concluded() {
            info!(round = self.state.round(), %reason, "audit stopped");
            self.state = self.state.clone().force_stop(reason);
            let report = RoundReport::forced_stop(
                &self.state,
                self.config.round.risk_limit,
                self.reports.last(),
            );
            self.reports.push(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuditConfig {
        AuditConfig::builder()
            .candidate(1, "Alice")
            .candidate(2, "Bob")
            .seats(1)
            .total_cast(1_000)
            .reported_winners(&[1])
            .trials(200)
            .initial_round_size(50)
            .build()
            .unwrap()
    }

    #[test]
    fn test_initial_sample_size() {
        let audit = BayesianAudit::new(config()).unwrap();
        assert_eq!(audit.initial_sample_size(), 50);
        assert_eq!(audit.next_sample_size(), Some(50));
    }

    #[test]
    fn test_operator_stop() {
        let mut audit = BayesianAudit::new(config()).unwrap();
        audit.stop();
        assert_eq!(
            audit.state().status(),
            &AuditStatus::StopTimeOrResourceLimit {
                reason: StopReason::OperatorStop
            }
        );
        assert_eq!(audit.next_sample_size(), None);
        let result = audit.run_round(vec![Ranking::from(vec![1])]);
        assert!(matches!(result, Err(Error::Audit(AuditError::AuditConcluded))));
    }

    #[test]
    fn test_cancel_between_rounds_reports_stop() {
        let mut audit = BayesianAudit::new(config()).unwrap();
        audit.cancel_handle().cancel();
        let report = audit.run_round(vec![Ranking::from(vec![1])]).unwrap();
        assert_eq!(
            report.status,
            AuditStatus::StopTimeOrResourceLimit {
                reason: StopReason::OperatorStop
            }
        );
        assert_eq!(report.round, 0);
        assert_eq!(report.admitted, 0);
        assert_eq!(report.observed, 0);
        assert_eq!(report.unsampled, 1_000);
        assert_eq!(report.next_sample_size, None);
        assert!(audit.state().is_concluded());
        assert_eq!(audit.state().pool().observed_count(), 0);
        assert_eq!(audit.reports().len(), 1);
        assert!(!audit.cancel_handle().is_cancelled());
    }

    #[test]
    fn test_cancel_after_round_carries_estimate() {
        let mut audit = BayesianAudit::new(config()).unwrap();
        let mut ballots = vec![Ranking::from(vec![1, 2]); 26];
        ballots.extend(vec![Ranking::from(vec![2, 1]); 24]);
        let first = audit.run_round(ballots).unwrap().clone();
        assert_eq!(first.status, AuditStatus::Continue);

        audit.cancel_handle().cancel();
        let report = audit.run_round(vec![Ranking::from(vec![1])]).unwrap();
        assert!(report.is_terminal());
        assert_eq!(report.round, 1);
        assert_eq!(report.observed, 50);
        assert_eq!(report.admitted, 0);
        assert_eq!(report.p_hat, first.p_hat);
        assert_eq!(report.trials, first.trials);
        assert_eq!(audit.summary().reports.len(), 2);
    }

    #[test]
    fn test_summary_before_any_round() {
        let audit = BayesianAudit::new(config()).unwrap();
        let summary = audit.summary();
        assert_eq!(summary.rounds, 0);
        assert_eq!(summary.status, AuditStatus::Continue);
        assert_eq!(summary.reported_winners, vec![CandidateId(1)]);
        assert_eq!(summary.tie_break_order.len(), 2);
        assert!(summary.reports.is_empty());
    }
}
