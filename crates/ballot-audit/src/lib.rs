//! Bayesian ballot-polling audits of ranked-choice elections.
//!
//! This crate drives the statistics in `ballot-audit-core` from the outside
//! world: it loads configuration and transcribed ballots, runs rounds under
//! an operator's control and renders reports.
//!
//! # Quick start
//!
//! ```ignore
//! use ballot_audit::{AuditConfig, BayesianAudit};
//! use std::path::Path;
//!
//! let config = AuditConfig::from_json_file("contest.json")?.from_env();
//! let mut audit = BayesianAudit::new(config)?;
//!
//! println!("draw {} ballots", audit.initial_sample_size());
//! let report = audit.run_round_from_file(Path::new("round1.csv"))?;
//! if report.is_terminal() {
//!     println!("{}", report.status);
//! }
//! ```
//!
//! # Drills
//!
//! [`simulation::SimulatedElection`] generates a synthetic contest whose
//! ballots can be fed through a full audit, which is how the CLI's
//! `simulate` subcommand and the integration tests exercise the pipeline.

pub mod audit;
pub mod config;
pub mod data;
pub mod error;
pub mod output;
pub mod simulation;

pub use audit::{AuditSummary, BayesianAudit, CancelHandle};
pub use config::{AuditConfig, AuditConfigBuilder, CountingMethod};
pub use data::{load_ballots, DataError};
pub use error::Error;
pub use simulation::SimulatedElection;

// Core types most callers need without a second import
pub use ballot_audit_core::{
    AuditError, AuditStatus, AuditWarning, Candidate, CandidateId, ConfigError,
    EscalationPolicy, PriorConfig, Ranking, ResamplingPolicy, RoundReport, StopReason, TieEvent,
};
