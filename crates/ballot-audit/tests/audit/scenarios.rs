//! Complete audits through the orchestrator.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use ballot_audit::output::{summary_to_json_pretty, to_json};
use ballot_audit::{
    AuditConfig, AuditConfigBuilder, AuditError, AuditStatus, AuditWarning, BayesianAudit,
    CandidateId, CountingMethod, Error, Ranking, SimulatedElection, StopReason, TieEvent,
};
use ballot_audit_core::WinnerOrder;
use tempfile::NamedTempFile;

const A: u32 = 1;
const B: u32 = 2;
const C: u32 = 3;

fn three_way(total_cast: u64) -> AuditConfigBuilder {
    AuditConfig::builder()
        .candidate(A, "Alice")
        .candidate(B, "Bob")
        .candidate(C, "Carol")
        .seats(1)
        .total_cast(total_cast)
        .reported_winners(&[A])
        .trials(300)
        .seed(17)
}

fn split(a_first: usize, b_first: usize) -> Vec<Ranking> {
    let mut ballots = vec![Ranking::from(vec![A, B, C]); a_first];
    ballots.extend(vec![Ranking::from(vec![B, A, C]); b_first]);
    ballots
}

// ============================================================================
// Drills
// ============================================================================

#[test]
fn drill_confirms_expected_winner() {
    let mut election = SimulatedElection::new(4, 5_000, 1, 5);
    let config = election
        .config_builder()
        .counting_method(CountingMethod::Borda)
        .trials(300)
        .build()
        .unwrap();
    let mut audit = BayesianAudit::new(config).unwrap();

    let summary = election.run_audit(&mut audit).unwrap();

    assert_eq!(summary.status, AuditStatus::StopConfirmed);
    assert!(summary.rounds >= 1);
    assert!(summary.observed < 5_000, "observed = {}", summary.observed);
    assert_eq!(summary.observed, election.drawn());
    assert_eq!(summary.reports.len() as u32, summary.rounds);
    assert_eq!(audit.next_sample_size(), None);
}

#[test]
fn drill_with_stv_runs_to_a_verdict() {
    let mut election = SimulatedElection::new(5, 600, 2, 9);
    let config = election
        .config_builder()
        .counting_method(CountingMethod::Stv)
        .trials(200)
        .initial_round_size(50)
        .build()
        .unwrap();
    let mut audit = BayesianAudit::new(config).unwrap();

    let summary = election.run_audit(&mut audit).unwrap();

    assert!(summary.status.is_terminal());
    assert!(summary.observed <= 600);
    let sizes: Vec<u64> = summary.reports.iter().map(|r| r.observed).collect();
    assert!(sizes.windows(2).all(|w| w[0] < w[1]), "sizes = {:?}", sizes);
}

// ============================================================================
// Forced stops
// ============================================================================

#[test]
fn max_rounds_forces_stop() {
    let config = three_way(1_000).max_rounds(1).build().unwrap();
    let mut audit = BayesianAudit::new(config).unwrap();

    let report = audit.run_round(split(10, 10)).unwrap();
    assert_eq!(
        report.status,
        AuditStatus::StopTimeOrResourceLimit {
            reason: StopReason::MaxRounds
        }
    );
    assert_eq!(report.next_sample_size, None);

    let again = audit.run_round(split(5, 0));
    assert!(matches!(again, Err(Error::Audit(AuditError::AuditConcluded))));
    assert_eq!(audit.state().pool().observed_count(), 20);
}

#[test]
fn exhausted_time_budget_forces_stop() {
    let config = three_way(1_000)
        .time_budget(Duration::ZERO)
        .build()
        .unwrap();
    let mut audit = BayesianAudit::new(config).unwrap();

    let report = audit.run_round(split(10, 10)).unwrap();
    assert_eq!(
        report.status,
        AuditStatus::StopTimeOrResourceLimit {
            reason: StopReason::TimeBudget
        }
    );
}

#[test]
fn confirmed_round_is_not_overridden_by_budget() {
    let config = three_way(10).max_rounds(1).build().unwrap();
    let mut audit = BayesianAudit::new(config).unwrap();

    let report = audit.run_round(split(6, 0)).unwrap();
    assert_eq!(report.status, AuditStatus::StopConfirmed);
}

#[test]
fn exhausted_audit_reports_full_count() {
    // Every ballot examined, tied 3/3; the official tie resolution elected Bob.
    let config = three_way(6)
        .tie_break_seed("ceremony")
        .tie_event(TieEvent::Election {
            tied: vec![CandidateId(A), CandidateId(B)],
            elected: CandidateId(B),
        })
        .build()
        .unwrap();
    let mut audit = BayesianAudit::new(config).unwrap();

    let report = audit.run_round(split(3, 3)).unwrap();
    assert_eq!(report.unsampled, 0);
    assert_eq!(report.p_hat, 0.0);
    assert_eq!(
        report.status,
        AuditStatus::StopExhausted {
            full_count: Some(WinnerOrder(vec![CandidateId(B)]))
        }
    );
}

// ============================================================================
// Ballot files
// ============================================================================

#[test]
fn rounds_load_from_ballot_files() {
    let mut round_one = NamedTempFile::new().unwrap();
    writeln!(round_one, "# box 3").unwrap();
    writeln!(round_one, "ranking").unwrap();
    for _ in 0..8 {
        writeln!(round_one, "1,2,3").unwrap();
    }
    for _ in 0..7 {
        writeln!(round_one, "2,1,3").unwrap();
    }
    writeln!(round_one, "1,9").unwrap();
    writeln!(round_one, "-").unwrap();

    let config = three_way(1_000).build().unwrap();
    let mut audit = BayesianAudit::new(config).unwrap();
    let report = audit.run_round_from_file(round_one.path()).unwrap();

    assert_eq!(report.round, 1);
    assert_eq!(report.admitted, 16);
    assert_eq!(report.observed, 16);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].position, 15);
    assert!(report
        .warnings
        .contains(&AuditWarning::RejectedBallots { count: 1 }));
    assert_eq!(report.status, AuditStatus::Continue);
}

#[test]
fn unreadable_ballot_file_leaves_state_untouched() {
    let config = three_way(1_000).build().unwrap();
    let mut audit = BayesianAudit::new(config).unwrap();

    let result = audit.run_round_from_file(Path::new("/nonexistent/round.csv"));
    assert!(matches!(result, Err(Error::Data(_))));
    assert_eq!(audit.state().round(), 0);
    assert!(audit.reports().is_empty());
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn reports_serialize_for_archiving() {
    let config = three_way(10).build().unwrap();
    let mut audit = BayesianAudit::new(config).unwrap();
    let report = audit.run_round(split(6, 0)).unwrap().clone();

    let json = to_json(&report).unwrap();
    assert!(json.contains("\"state\":\"stop_confirmed\""));

    let summary = summary_to_json_pretty(&audit.summary()).unwrap();
    assert!(summary.contains("\"rounds\": 1"));
    assert!(summary.contains("\"counting_method\": \"stv\""));
}

#[test]
fn identical_audits_agree() {
    let run = || {
        let config = three_way(1_000).build().unwrap();
        let mut audit = BayesianAudit::new(config).unwrap();
        audit.run_round(split(12, 8)).unwrap().clone()
    };
    let a = run();
    let b = run();
    assert_eq!(a.p_hat, b.p_hat);
    assert_eq!(a.next_sample_size, b.next_sample_size);
}
