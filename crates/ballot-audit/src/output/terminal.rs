//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use ballot_audit_core::{AuditStatus, CandidateId, CandidateRoster, RoundReport};

use crate::audit::AuditSummary;

const WIDTH: usize = 62;

/// Format one round's report for the audit team.
///
/// # Example output
///
/// ```text
/// ┌─ Round 2 ────────────────────────────────────────────────────
/// │ Sample     300 of 1000 ballots (700 unsampled)
/// │ P(correct) 96.40% ± 0.59%   risk 3.60% (limit 5.00%)
/// │ Status     CONFIRMED
/// │
/// │ Most common outcome: Alice, Carol (964 / 1000 trials)
/// │ Win rate by candidate:
/// │   Alice            99.9%
/// │   ...
/// └──────────────────────────────────────────────────────────────
/// ```
pub fn format_round(report: &RoundReport, roster: &CandidateRoster) -> String {
    let mut out = String::new();
    out.push_str(&top_rule(&format!("Round {}", report.round)));

    out.push_str(&format!(
        "\u{2502} Sample     {} of {} ballots ({} unsampled)\n",
        report.observed, report.total_cast, report.unsampled
    ));
    if !report.rejected.is_empty() {
        out.push_str(&format!(
            "\u{2502}            {} admitted, {} rejected this round\n",
            report.admitted,
            report.rejected.len().to_string().red()
        ));
    }
    out.push_str(&format!(
        "\u{2502} P(correct) {:.2}% \u{00B1} {:.2}%   risk {:.2}% (limit {:.2}%)\n",
        report.p_hat * 100.0,
        report.standard_error * 100.0,
        report.risk * 100.0,
        report.risk_limit * 100.0
    ));
    out.push_str(&format!("\u{2502} Status     {}\n", status_label(&report.status, roster)));
    if let Some(next) = report.next_sample_size {
        out.push_str(&format!("\u{2502} Next round draw {} more ballots\n", next));
    }

    out.push_str("\u{2502}\n");
    if let Some(most_common) = &report.most_common {
        out.push_str(&format!(
            "\u{2502} Most common outcome: {} ({} / {} trials)\n",
            names(&most_common.winners, roster),
            most_common.count,
            report.trials.valid
        ));
    }
    if !report.candidate_win_rates.is_empty() {
        out.push_str("\u{2502} Win rate by candidate:\n");
        for rate in &report.candidate_win_rates {
            out.push_str(&format!(
                "\u{2502}   {:<16} {:>5.1}%",
                rate.name,
                rate.fraction * 100.0
            ));
            if let Some(trial) = rate.witness_trial {
                out.push_str(&format!("   witness: trial {}", trial));
            }
            out.push('\n');
        }
    }

    out.push_str(&format!(
        "\u{2502} Trials     {} valid of {} ({} discarded, {} ties resolved)\n",
        report.trials.valid,
        report.trials.requested,
        report.trials.discarded,
        report.trials.ties_resolved
    ));
    for (reason, count) in &report.trials.discard_reasons {
        out.push_str(&format!("\u{2502}   {:<20} {}\n", reason, count));
    }

    if !report.warnings.is_empty() {
        out.push_str(&format!("\u{2502}\n\u{2502} {} Warnings\n", "\u{26A0}".yellow()));
        for warning in &report.warnings {
            out.push_str(&format!("\u{2502}   \u{2022} {}\n", warning));
        }
    }
    for rejected in &report.rejected {
        out.push_str(&format!(
            "\u{2502}   ballot #{} {}: {}\n",
            rejected.position + 1,
            rejected.ranking,
            rejected.error
        ));
    }

    out.push_str(&bottom_rule());
    out
}

/// Format the closing summary of an audit.
pub fn format_summary(summary: &AuditSummary, roster: &CandidateRoster) -> String {
    let mut out = String::new();
    out.push_str(&top_rule("Audit summary"));
    out.push_str(&format!(
        "\u{2502} Reported   {}\n",
        names(&summary.reported_winners, roster)
    ));
    out.push_str(&format!(
        "\u{2502} Engine     {} ({} resampling)\n",
        summary.counting_method, summary.policy
    ));
    out.push_str(&format!(
        "\u{2502} Rounds     {}, {} of {} ballots examined\n",
        summary.rounds, summary.observed, summary.total_cast
    ));
    out.push_str(&format!(
        "\u{2502} Result     {}\n",
        status_label(&summary.status, roster)
    ));
    out.push_str(&bottom_rule());
    out
}

fn status_label(status: &AuditStatus, roster: &CandidateRoster) -> String {
    match status {
        AuditStatus::Continue => "CONTINUE".yellow().bold().to_string(),
        AuditStatus::StopConfirmed => "CONFIRMED".green().bold().to_string(),
        AuditStatus::StopExhausted { full_count } => {
            let label = "ALL BALLOTS EXAMINED".cyan().bold();
            match full_count {
                Some(order) => format!("{} (full count: {})", label, names(&order.0, roster)),
                None => format!("{} (full count incomplete)", label),
            }
        }
        AuditStatus::StopTimeOrResourceLimit { reason } => {
            format!("{} ({})", "STOPPED".red().bold(), reason)
        }
    }
}

fn names(ids: &[CandidateId], roster: &CandidateRoster) -> String {
    ids.iter()
        .map(|&id| roster.name_of(id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn top_rule(title: &str) -> String {
    let used = title.chars().count() + 3;
    format!(
        "\u{250C}\u{2500} {} {}\n",
        title.bold(),
        "\u{2500}".repeat(WIDTH.saturating_sub(used))
    )
}

fn bottom_rule() -> String {
    format!("\u{2514}{}\n", "\u{2500}".repeat(WIDTH))
}
