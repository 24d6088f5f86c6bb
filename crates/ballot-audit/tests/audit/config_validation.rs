//! Configuration loading and rejection of unusable contests.

use std::env;
use std::io::Write;

use ballot_audit::{
    AuditConfig, AuditError, BayesianAudit, CandidateId, ConfigError, CountingMethod,
    EscalationPolicy, Error, ResamplingPolicy, TieEvent,
};
use ballot_audit_core::TieBreakError;
use tempfile::NamedTempFile;

const CONTEST_JSON: &str = r#"{
    "candidates": [
        {"id": 1, "name": "Alice"},
        {"id": 2, "name": "Bob"},
        {"id": 3, "name": "Carol"}
    ],
    "seats": 2,
    "total_cast": 40000,
    "reported_winners": [2, 1],
    "counting_method": "borda",
    "tie_break_seed": "0x5eed",
    "tie_events": [
        {"kind": "exclusion", "tied": [1, 3], "excluded": 3}
    ],
    "risk_limit": 0.01,
    "trials": 2500,
    "seed": 7,
    "policy": "polya_urn",
    "escalation": {"kind": "fixed", "round_size": 250},
    "prior": {"unseen_pseudocount": 0.5},
    "max_rounds": 12
}"#;

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", json).unwrap();
    file
}

#[test]
fn config_file_round_trip() {
    let file = write_config(CONTEST_JSON);
    let config = AuditConfig::from_json_file(file.path()).unwrap();

    assert_eq!(config.candidates.len(), 3);
    assert_eq!(config.reported_winners, vec![CandidateId(2), CandidateId(1)]);
    assert_eq!(config.counting_method, CountingMethod::Borda);
    assert_eq!(config.round.risk_limit, 0.01);
    assert_eq!(config.round.trials, 2500);
    assert_eq!(config.round.seed, 7);
    assert_eq!(config.round.policy, ResamplingPolicy::PolyaUrn);
    assert_eq!(config.round.escalation, EscalationPolicy::Fixed { round_size: 250 });
    assert_eq!(config.round.prior.unseen_pseudocount, 0.5);
    assert_eq!(config.round.prior.pattern_pseudocount, 0.0);
    assert_eq!(config.max_rounds, Some(12));
    assert_eq!(
        config.tie_events,
        vec![TieEvent::Exclusion {
            tied: vec![CandidateId(1), CandidateId(3)],
            excluded: CandidateId(3),
        }]
    );
    assert!(config.validate().is_ok());

    let json = serde_json::to_string(&config).unwrap();
    let reparsed = AuditConfig::from_json_str(&json).unwrap();
    assert_eq!(reparsed, config);

    let audit = BayesianAudit::new(config).unwrap();
    let order = audit.oracle().order();
    assert!(order.position(CandidateId(1)) < order.position(CandidateId(3)));
}

#[test]
fn missing_config_file_is_parse_error() {
    let result = AuditConfig::from_json_file("/nonexistent/contest.json");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn environment_overrides_file_values() {
    let file = write_config(CONTEST_JSON);
    env::set_var("AUDIT_TRIALS", "321");
    env::set_var("AUDIT_SEED", "99");
    env::set_var("AUDIT_RISK_LIMIT", "0.2");
    env::set_var("AUDIT_MAX_ROUNDS", "not-a-number");
    env::set_var("AUDIT_TIME_BUDGET_SECS", "30");

    let config = AuditConfig::from_json_file(file.path()).unwrap().from_env();

    for name in [
        "AUDIT_TRIALS",
        "AUDIT_SEED",
        "AUDIT_RISK_LIMIT",
        "AUDIT_MAX_ROUNDS",
        "AUDIT_TIME_BUDGET_SECS",
    ] {
        env::remove_var(name);
    }

    assert_eq!(config.round.trials, 321);
    assert_eq!(config.round.seed, 99);
    assert_eq!(config.round.risk_limit, 0.2);
    assert_eq!(config.max_rounds, Some(12));
    assert_eq!(config.time_budget_secs, Some(30));
}

#[test]
fn out_of_range_values_from_file_are_rejected() {
    let json = CONTEST_JSON.replace("\"risk_limit\": 0.01", "\"risk_limit\": 1.5");
    let config = AuditConfig::from_json_str(&json).unwrap();
    assert_eq!(config.validate(), Err(ConfigError::RiskLimit(1.5)));
    assert!(matches!(
        BayesianAudit::new(config),
        Err(Error::Audit(AuditError::Config(ConfigError::RiskLimit(_))))
    ));
}

#[test]
fn reported_outcome_must_fill_every_seat() {
    let json = CONTEST_JSON.replace("\"reported_winners\": [2, 1]", "\"reported_winners\": [2]");
    let config = AuditConfig::from_json_str(&json).unwrap();
    assert_eq!(
        config.validate(),
        Err(ConfigError::ReportedWinnerCount {
            reported: 1,
            seats: 2
        })
    );
}

#[test]
fn duplicate_candidate_ids_are_rejected() {
    let result = AuditConfig::builder()
        .candidate(1, "Alice")
        .candidate(1, "Alicia")
        .seats(1)
        .total_cast(10)
        .reported_winners(&[1])
        .build();
    assert_eq!(result, Err(ConfigError::DuplicateCandidate(CandidateId(1))));
}

#[test]
fn contradictory_tie_events_are_rejected() {
    let config = AuditConfig::builder()
        .candidate(1, "Alice")
        .candidate(2, "Bob")
        .seats(1)
        .total_cast(10)
        .reported_winners(&[1])
        .tie_event(TieEvent::Election {
            tied: vec![CandidateId(1), CandidateId(2)],
            elected: CandidateId(1),
        })
        .tie_event(TieEvent::Election {
            tied: vec![CandidateId(1), CandidateId(2)],
            elected: CandidateId(2),
        })
        .build()
        .unwrap();

    let result = BayesianAudit::new(config);
    assert!(matches!(
        result,
        Err(Error::Audit(AuditError::TieBreak(TieBreakError::Cycle { .. })))
    ));
}
