//! JSON serialization for round reports and audit summaries.

use ballot_audit_core::RoundReport;

use crate::audit::AuditSummary;

/// Serialize a round report to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for RoundReport).
pub fn to_json(report: &RoundReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a round report to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for RoundReport).
pub fn to_json_pretty(report: &RoundReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Serialize an audit summary to a pretty-printed JSON string.
pub fn summary_to_json_pretty(summary: &AuditSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}
