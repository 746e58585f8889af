//! End-of-run report formatting
//!
//! Renders a [`RunReport`] as the plain-text summary printed after a run.

use crate::catalog::{EntityKind, StopReason};
use crate::engine::RunReport;

/// Formats a run report for the terminal
///
/// # Arguments
///
/// * `report` - The finished run's report
///
/// # Returns
///
/// A multi-line summary ending in a newline
pub fn format_run_report(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str("=== Harvest Report ===\n\n");
    out.push_str(&format!("Final phase: {}\n", report.phase));
    out.push_str(&format!(
        "Requests used: {} / {}\n",
        report.requests_used, report.request_ceiling
    ));
    if report.terminated_early {
        out.push_str("Stopped early: request budget margin reached\n");
    }

    out.push_str("\nDiscovered:\n");
    out.push_str(&format!(
        "  Foods: {} ({} new)\n",
        report.discovered.foods, report.new_foods
    ));
    out.push_str(&format!("  Brands: {}\n", report.discovered.brands));
    out.push_str(&format!("  Restaurants: {}\n", report.discovered.restaurants));
    out.push_str(&format!("  Categories: {}\n", report.discovered.categories));

    out.push_str("\nExtracted:\n");
    for kind in EntityKind::all() {
        let outcomes: Vec<_> = report.outcomes.iter().filter(|o| o.kind == kind).collect();
        let persisted = outcomes.iter().filter(|o| o.persisted).count();
        out.push_str(&format!(
            "  {}: {} attempted, {} written, {} items\n",
            kind.dir_name(),
            outcomes.len(),
            persisted,
            report.extraction_results.total(kind)
        ));
    }
    out.push_str(&format!(
        "  Files written: {} ({} items)\n",
        report.files_written,
        report.items_extracted()
    ));

    let truncated: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| o.persisted && o.stop_reason.is_truncated())
        .collect();
    if !truncated.is_empty() {
        out.push_str(&format!("\nPossibly incomplete ({}):\n", truncated.len()));
        for outcome in truncated {
            out.push_str(&format!(
                "  - {} '{}': {} of {} remote results ({})\n",
                outcome.kind,
                outcome.name,
                outcome.items,
                outcome.total_remote_count,
                reason_label(outcome.stop_reason)
            ));
        }
    }

    out
}

fn reason_label(reason: StopReason) -> &'static str {
    match reason {
        StopReason::RemoteExhausted => "remote exhausted",
        StopReason::PageCap => "page cap",
        StopReason::Patience => "no recent matches",
        StopReason::NoData => "no data",
        StopReason::BudgetExhausted => "budget",
    }
}

/// Prints a run report to stdout
pub fn print_run_report(report: &RunReport) {
    print!("{}", format_run_report(report));
}
