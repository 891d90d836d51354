//! `pdmcat index`: ingest one file or a whole directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use pdmcat_types::ingest::{FileOutcome, IngestReport};

use super::Output;
use crate::state::AppState;

/// Run ingestion on `path`, or on the configured model directory.
///
/// Returns an error after printing the report when any file failed.
pub async fn run_index(state: &AppState, path: Option<PathBuf>, out: Output) -> Result<()> {
    let target = path.unwrap_or_else(|| state.config.pdm_dir(&state.data_dir));
    let metadata = tokio::fs::metadata(&target)
        .await
        .with_context(|| format!("Cannot access {}", target.display()))?;

    let spinner = spinner(out, &target);

    let report = if metadata.is_dir() {
        state.indexer.index_all(&target).await?
    } else {
        let mut report = IngestReport::new();
        report.outcomes.push(state.indexer.index_file(&target).await);
        report
    };

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let failed = report.failed().count();

    if out.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !out.quiet {
        print_report(&report, &target);
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} file(s) failed to index", report.outcomes.len());
    }
    Ok(())
}

fn spinner(out: Output, target: &Path) -> Option<ProgressBar> {
    if out.json || out.quiet {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Indexing {}...", target.display()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Some(spinner)
}

fn print_report(report: &IngestReport, target: &Path) {
    println!();
    if report.outcomes.is_empty() {
        println!(
            "  {} No model files found in {}",
            style("i").blue().bold(),
            style(target.display()).dim(),
        );
        println!();
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("File").fg(Color::White),
        Cell::new("Stage").fg(Color::White),
        Cell::new("Tables").fg(Color::White),
        Cell::new("Columns").fg(Color::White),
        Cell::new("Refs").fg(Color::White),
        Cell::new("Docs").fg(Color::White),
        Cell::new("Error").fg(Color::White),
    ]);

    for outcome in &report.outcomes {
        table.add_row(outcome_row(outcome));
    }

    println!("{table}");
    println!();

    let succeeded = report.succeeded().count();
    let failed = report.failed().count();
    if failed == 0 {
        println!(
            "  {} Indexed {} file(s)",
            style("✓").green().bold(),
            succeeded,
        );
    } else {
        println!(
            "  {} Indexed {} file(s), {} failed",
            style("!").yellow().bold(),
            succeeded,
            style(failed).red(),
        );
    }
    println!("  {}", style(format!("run {}", report.run_id)).dim());
    println!();
}

fn outcome_row(outcome: &FileOutcome) -> Vec<Cell> {
    let (stage, error) = match &outcome.error {
        Some(err) => (
            Cell::new(outcome.stage).fg(Color::Red),
            Cell::new(err).fg(Color::Red),
        ),
        None => (Cell::new(outcome.stage).fg(Color::Green), Cell::new("")),
    };
    vec![
        Cell::new(&outcome.file_name).fg(Color::Cyan),
        stage,
        Cell::new(outcome.tables),
        Cell::new(outcome.columns),
        Cell::new(outcome.references),
        Cell::new(outcome.documents),
        error,
    ]
}
