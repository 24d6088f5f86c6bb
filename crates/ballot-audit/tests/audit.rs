//! Front-end audit tests
//!
//! - `scenarios`: complete audits driven through `BayesianAudit`
//! - `config_validation`: configuration files, environment overrides and
//!   rejection of unusable contests

#[path = "audit/config_validation.rs"]
mod config_validation;
#[path = "audit/scenarios.rs"]
mod scenarios;
