// Report generation from a finished traversal

use colored::Colorize;
use farlink_scanner::{Link, PageOutcome, PageReport, TraversalOutcome};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    visited: Vec<&'a Link>,
    rounds: usize,
    cancelled: bool,
    pages: &'a [PageReport],
}

fn sorted_visited(outcome: &TraversalOutcome) -> Vec<&Link> {
    let mut visited: Vec<&Link> = outcome.visited.iter().collect();
    visited.sort();
    visited
}

pub fn render_report(
    outcome: &TraversalOutcome,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_visited_report(outcome)),
        ReportFormat::Json => generate_json_report(outcome),
    }
}

pub fn generate_json_report(outcome: &TraversalOutcome) -> Result<String, serde_json::Error> {
    let report = JsonReport {
        visited: sorted_visited(outcome),
        rounds: outcome.rounds,
        cancelled: outcome.cancelled,
        pages: &outcome.pages,
    };
    serde_json::to_string_pretty(&report)
}

/// Lists every visited URL (sorted) with a status mark, followed by a summary.
pub fn generate_visited_report(outcome: &TraversalOutcome) -> String {
    let by_url: HashMap<&Link, &PageReport> =
        outcome.pages.iter().map(|page| (&page.url, page)).collect();

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Visited links:\n");

    for url in sorted_visited(outcome) {
        let mark = match by_url.get(url).map(|page| &page.outcome) {
            Some(PageOutcome::Fetched) => "✓".green().to_string(),
            Some(PageOutcome::Timeout) => "⏱".yellow().to_string(),
            Some(PageOutcome::Failed(_)) => "✗".red().to_string(),
            None => "·".bright_black().to_string(),
        };
        report.push_str(&format!("  {} {}\n", mark, url));
    }

    let fetched = outcome
        .pages
        .iter()
        .filter(|page| page.outcome.is_fetched())
        .count();

    report.push_str("\n# Summary:\n");
    report.push_str(&format!("  URLs visited: {}\n", outcome.visited.len()));
    report.push_str(&format!("  Rounds: {}\n", outcome.rounds));
    report.push_str(&format!("  Pages fetched: {}\n", fetched));
    report.push_str(&format!("  Failed requests: {}\n", outcome.failures().count()));
    report.push_str(&format!(
        "  External links found: {}\n",
        outcome.total_links()
    ));
    if outcome.cancelled {
        report.push_str("  Crawl was cancelled before finishing\n");
    }

    report
}
