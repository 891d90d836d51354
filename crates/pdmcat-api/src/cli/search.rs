//! `pdmcat search`: semantic table lookup.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use pdmcat_core::index::semantic::SemanticIndex;
use pdmcat_types::index::DocumentKind;

use super::Output;
use crate::state::AppState;

/// Search table documents closest in meaning to `text`.
pub async fn search_tables(
    state: &AppState,
    text: &str,
    top_k: Option<usize>,
    out: Output,
) -> Result<()> {
    let top_k = top_k.unwrap_or(state.config.search_top_k);
    let hits = state
        .index()?
        .query(text, top_k, Some(DocumentKind::Table))
        .await?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if out.quiet {
        return Ok(());
    }

    println!();
    if hits.is_empty() {
        println!(
            "  {} No tables match '{}'.",
            style("i").blue().bold(),
            style(text).cyan(),
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Code").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("File").fg(Color::White),
        Cell::new("Distance").fg(Color::White),
        Cell::new("Document").fg(Color::White),
    ]);
    for (rank, hit) in hits.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&hit.code).fg(Color::Cyan),
            Cell::new(&hit.name),
            Cell::new(&hit.file).fg(Color::DarkGrey),
            Cell::new(format!("{:.3}", hit.distance)),
            Cell::new(&hit.text).fg(Color::DarkGrey),
        ]);
    }
    println!("  Tables matching '{}'", style(text).cyan());
    println!();
    println!("{table}");
    println!();
    Ok(())
}
