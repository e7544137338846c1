// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal output for the dispatch table and run reports.

use colored::Colorize;
use courier_config::{ALL_SOURCES_CODE, CourierConfig};
use courier_pipeline::{RunReport, SourceOutcome};

/// Prints every runnable short code with the source it selects.
pub fn print_sources(config: &CourierConfig) {
    if config.sources.is_empty() {
        println!("no sources configured");
        return;
    }
    let width = config
        .sources
        .iter()
        .map(|s| s.short_code.len())
        .max()
        .unwrap_or(0)
        .max(ALL_SOURCES_CODE.len());

    for source in &config.sources {
        println!(
            "  {}  {}  {}",
            format!("{:<width$}", source.short_code).bold(),
            source.name,
            format!("({} → {}, {})", source.kind, source.transform, source.batch).dimmed(),
        );
    }
    println!("  {}  every source", format!("{ALL_SOURCES_CODE:<width$}").bold());
}

/// Prints one line per source and the abort reason, if any.
pub fn print_report(report: &RunReport) {
    for source in &report.sources {
        let stats = &source.stats;
        let status = match &source.outcome {
            SourceOutcome::Succeeded => "ok".green().to_string(),
            SourceOutcome::Failed(error) => format!("{}: {error}", "failed".red()),
            SourceOutcome::NotRun => "not run".yellow().to_string(),
        };
        println!(
            "{} {}: {} delivered, {} new, {} skipped as too old, {} pruned",
            source.name.bold(),
            status,
            stats.delivered,
            stats.new,
            stats.too_old,
            stats.pruned,
        );
    }
    if let Some(reason) = &report.aborted {
        eprintln!("{}: run aborted: {reason}", "error".red());
    }
}
