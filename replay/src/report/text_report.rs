//! @ai:module:intent Human-readable replay output
//! @ai:module:layer infrastructure
//! @ai:module:public_api format_text
//! @ai:module:stateless true

use crate::metrics::{Decision, LimitStats, ReplayReport, ReplaySummary};
use colored::Colorize;
use std::fmt::Write;

/// @ai:intent Format a report as decision lines followed by a per-limit table
/// @ai:effects pure
pub fn format_text(report: &ReplayReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{} {}", "Replay started at".dimmed(), report.start);
    output.push('\n');

    for decision in &report.decisions {
        output.push_str(&format_decision(decision));
    }

    if !report.decisions.is_empty() {
        output.push('\n');
    }

    output.push_str(&format_summary(&report.summary));
    output
}

/// @ai:intent Format one decision line
/// @ai:effects pure
fn format_decision(decision: &Decision) -> String {
    let verdict = if decision.allowed {
        "ALLOW".green().bold()
    } else {
        "DENY ".red().bold()
    };

    format!(
        "{} {:>8} ms  {}:{}  {}\n",
        verdict,
        decision.offset_ms,
        decision.limit,
        decision.key,
        format!("({} left)", decision.tokens_left).dimmed()
    )
}

/// @ai:intent Format the per-limit table and the totals line
/// @ai:effects pure
fn format_summary(summary: &ReplaySummary) -> String {
    let mut output = String::new();

    if !summary.by_limit.is_empty() {
        let _ = writeln!(
            output,
            "{:<16} {:>9} {:>9} {:>9} {:>6} {:>8}",
            "limit", "requests", "allowed", "denied", "keys", "denied%"
        );
        for stats in &summary.by_limit {
            output.push_str(&format_limit_row(stats));
        }
        output.push('\n');
    }

    let denied = if summary.has_denials() {
        summary.denied.to_string().red().bold()
    } else {
        summary.denied.to_string().green()
    };

    let _ = writeln!(
        output,
        "{} requests, {} allowed, {} denied",
        summary.requests,
        summary.allowed.to_string().green(),
        denied
    );

    output
}

fn format_limit_row(stats: &LimitStats) -> String {
    format!(
        "{:<16} {:>9} {:>9} {:>9} {:>6} {:>7.1}%\n",
        stats.limit, stats.requests, stats.allowed, stats.denied, stats.keys, stats.denial_rate
    )
}
