//! End-to-end audit rounds.

use std::sync::atomic::AtomicBool;

use ballot_audit_core::{
    audit_round, audit_round_cancellable, AuditContext, AuditError, AuditState, AuditStatus,
    AuditWarning, Borda, Candidate, CandidateId, EscalationPolicy, Ranking, ReportedOutcome,
    RoundConfig, RoundContext, Stv, TieBreakOracle, TieEvent, VoteCounter,
};

const A: u32 = 1;
const B: u32 = 2;
const C: u32 = 3;

fn contest(total_cast: u64, seats: usize, reported: &[u32]) -> AuditContext {
    AuditContext::new(
        vec![
            Candidate::new(A, "Alice"),
            Candidate::new(B, "Bob"),
            Candidate::new(C, "Carol"),
        ],
        seats,
        total_cast,
        ReportedOutcome::new(reported.iter().copied().map(CandidateId).collect()),
    )
    .unwrap()
}

fn config(risk_limit: f64, trials: u64) -> RoundConfig {
    RoundConfig {
        risk_limit,
        trials,
        seed: 42,
        ..RoundConfig::default()
    }
}

fn ballots(pattern: &[u32], n: usize) -> Vec<Ranking> {
    vec![Ranking::from(pattern.to_vec()); n]
}

// ============================================================================
// Scenarios with known answers
// ============================================================================

#[test]
fn unanimous_sample_confirms() {
    let contest = contest(10, 1, &[A]);
    let config = config(0.1, 1000);
    let oracle = TieBreakOracle::new(contest.roster(), "12345", &[]).unwrap();
    let ctx = RoundContext::new(&contest, &config, &Stv, &oracle);

    let state = AuditState::new(&contest);
    let outcome = audit_round(&state, &ctx, ballots(&[A, B, C], 6)).unwrap();

    assert_eq!(outcome.report.observed, 6);
    assert_eq!(outcome.report.unsampled, 4);
    assert!(outcome.report.p_hat >= 0.99, "p_hat = {}", outcome.report.p_hat);
    assert_eq!(outcome.report.status, AuditStatus::StopConfirmed);
    assert_eq!(outcome.report.next_sample_size, None);
    assert!(outcome.state.is_concluded());
}

#[test]
fn split_sample_continues() {
    let contest = contest(10, 1, &[A]);
    let config = config(0.1, 1000);
    let oracle = TieBreakOracle::new(contest.roster(), "12345", &[]).unwrap();
    let ctx = RoundContext::new(&contest, &config, &Stv, &oracle);

    let mut round_one = ballots(&[A, B, C], 3);
    round_one.extend(ballots(&[B, A, C], 3));
    let state = AuditState::new(&contest);
    let outcome = audit_round(&state, &ctx, round_one).unwrap();

    let report = &outcome.report;
    assert!(report.p_hat < 0.9, "p_hat = {}", report.p_hat);
    assert_eq!(report.status, AuditStatus::Continue);
    let next = report.next_sample_size.unwrap();
    assert!((1..=4).contains(&next), "next = {}", next);
}

#[test]
fn full_count_is_deterministic() {
    // Six ballots, all observed, split 3/3: the oracle decides the tie.
    for (elected, expected_p) in [(A, 1.0), (B, 0.0)] {
        let contest = contest(6, 1, &[A]);
        let config = config(0.1, 200);
        let events = [TieEvent::Election {
            tied: vec![CandidateId(A), CandidateId(B)],
            elected: CandidateId(elected),
        }];
        let oracle = TieBreakOracle::new(contest.roster(), "dice", &events).unwrap();
        let ctx = RoundContext::new(&contest, &config, &Stv, &oracle);

        let mut all = ballots(&[A, B, C], 3);
        all.extend(ballots(&[B, A, C], 3));
        let state = AuditState::new(&contest);
        let outcome = audit_round(&state, &ctx, all).unwrap();

        assert_eq!(outcome.report.unsampled, 0);
        assert_eq!(outcome.report.p_hat, expected_p);
        assert_eq!(outcome.report.standard_error, 0.0);
        if expected_p == 1.0 {
            assert_eq!(outcome.report.status, AuditStatus::StopConfirmed);
        } else {
            assert_eq!(
                outcome.report.status,
                AuditStatus::StopExhausted {
                    full_count: Some(ballot_audit_core::WinnerOrder(vec![CandidateId(B)]))
                }
            );
        }
    }
}

#[test]
fn risk_limit_comes_from_round_config() {
    // One starting state judged under two risk limits.
    let contest = contest(100, 1, &[A]);
    let oracle = TieBreakOracle::new(contest.roster(), "12345", &[]).unwrap();
    let state = AuditState::new(&contest);
    let mut sample = ballots(&[A, B], 6);
    sample.extend(ballots(&[B, A], 4));

    let loose = config(0.99, 500);
    let ctx = RoundContext::new(&contest, &loose, &Stv, &oracle);
    let outcome = audit_round(&state, &ctx, sample.clone()).unwrap();
    assert_eq!(outcome.report.risk_limit, 0.99);
    assert_eq!(outcome.report.status, AuditStatus::StopConfirmed);

    let strict = config(0.001, 500);
    let ctx = RoundContext::new(&contest, &strict, &Stv, &oracle);
    let outcome = audit_round(&state, &ctx, sample).unwrap();
    assert_eq!(outcome.report.risk_limit, 0.001);
    assert_eq!(outcome.report.status, AuditStatus::Continue);
}

#[test]
fn malformed_ballot_is_rejected() {
    let contest = contest(10, 1, &[A]);
    let config = config(0.1, 200);
    let oracle = TieBreakOracle::new(contest.roster(), "12345", &[]).unwrap();
    let ctx = RoundContext::new(&contest, &config, &Stv, &oracle);

    let mut round_one = ballots(&[A, B], 2);
    round_one.push(Ranking::from(vec![A, 9]));
    let state = AuditState::new(&contest);
    let outcome = audit_round(&state, &ctx, round_one).unwrap();

    assert_eq!(outcome.report.observed, 2);
    assert_eq!(outcome.report.admitted, 2);
    assert_eq!(outcome.report.rejected.len(), 1);
    assert!(outcome
        .report
        .warnings
        .contains(&AuditWarning::RejectedBallots { count: 1 }));
}

// ============================================================================
// Round mechanics
// ============================================================================

#[test]
fn concluded_audit_refuses_rounds() {
    let contest = contest(10, 1, &[A]);
    let config = config(0.1, 500);
    let oracle = TieBreakOracle::new(contest.roster(), "12345", &[]).unwrap();
    let ctx = RoundContext::new(&contest, &config, &Stv, &oracle);

    let state = AuditState::new(&contest);
    let outcome = audit_round(&state, &ctx, ballots(&[A, B, C], 6)).unwrap();
    let again = audit_round(&outcome.state, &ctx, ballots(&[A], 1));
    assert!(matches!(again, Err(AuditError::AuditConcluded)));
}

#[test]
fn abandoned_batch_commits_nothing() {
    let contest = contest(100, 1, &[A]);
    let config = config(0.05, 500);
    let oracle = TieBreakOracle::new(contest.roster(), "12345", &[]).unwrap();
    let ctx = RoundContext::new(&contest, &config, &Stv, &oracle);

    let state = AuditState::new(&contest);
    let cancel = AtomicBool::new(true);
    let result = audit_round_cancellable(&state, &ctx, ballots(&[A], 10), &cancel);

    assert!(matches!(result, Err(AuditError::BatchAbandoned { round: 1 })));
    assert_eq!(state.round(), 0);
    assert_eq!(state.pool().observed_count(), 0);
}

#[test]
fn rounds_are_reproducible() {
    let contest = contest(500, 1, &[A]);
    let config = config(0.05, 400);
    let oracle = TieBreakOracle::new(contest.roster(), "12345", &[]).unwrap();
    let ctx = RoundContext::new(&contest, &config, &Stv, &oracle);

    let mut sample = ballots(&[A, B], 11);
    sample.extend(ballots(&[B, A], 9));
    let state = AuditState::new(&contest);
    let a = audit_round(&state, &ctx, sample.clone()).unwrap();
    let b = audit_round(&state, &ctx, sample).unwrap();
    assert_eq!(a.report.p_hat, b.report.p_hat);
    assert_eq!(a.report.trials, b.report.trials);
}

#[test]
fn p_hat_rises_as_sample_grows() {
    // True electorate: 60% A-first, 40% B-first. The reported winner is right.
    let contest = contest(2000, 1, &[A]);
    let config = RoundConfig {
        escalation: EscalationPolicy::Fixed { round_size: 100 },
        ..config(0.01, 400)
    };
    let oracle = TieBreakOracle::new(contest.roster(), "12345", &[]).unwrap();
    let ctx = RoundContext::new(&contest, &config, &Stv, &oracle);

    let mut state = AuditState::new(&contest);
    let mut p_hats = Vec::new();
    for size in [20usize, 80, 400] {
        let mut round = ballots(&[A, B, C], size * 3 / 5);
        round.extend(ballots(&[B, A, C], size * 2 / 5));
        let outcome = audit_round(&state, &ctx, round).unwrap();
        p_hats.push(outcome.report.p_hat);
        state = outcome.state;
        if state.is_concluded() {
            break;
        }
    }

    assert!(p_hats.iter().all(|p| (0.0..=1.0).contains(p)));
    let first = p_hats[0];
    let last = *p_hats.last().unwrap();
    assert!(last + 0.05 >= first, "p_hats = {:?}", p_hats);
    assert!(last > 0.95, "p_hats = {:?}", p_hats);
    assert_eq!(state.history().len(), p_hats.len());
}

#[test]
fn borda_engine_runs_rounds() {
    let contest = contest(50, 2, &[A, B]);
    let config = config(0.1, 300);
    let oracle = TieBreakOracle::new(contest.roster(), "12345", &[]).unwrap();
    let engine: &dyn VoteCounter = &Borda;
    let ctx = RoundContext::new(&contest, &config, engine, &oracle);

    let state = AuditState::new(&contest);
    let outcome = audit_round(&state, &ctx, ballots(&[A, B, C], 40)).unwrap();
    assert_eq!(outcome.report.status, AuditStatus::StopConfirmed);
    let rates = &outcome.report.candidate_win_rates;
    assert_eq!(rates.len(), 3);
    assert_eq!(rates[2].fraction, 0.0);
}
