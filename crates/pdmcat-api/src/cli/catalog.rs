//! Catalog lookups: `tables`, `schema`, `relations` and `files`.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use pdmcat_core::catalog::CatalogRepository;
use pdmcat_types::schema::RelationshipDirection;

use super::Output;
use crate::state::AppState;

/// Comment width in the table listing.
const COMMENT_WIDTH: usize = 50;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::White))
            .collect::<Vec<_>>(),
    );
    table
}

fn print_not_found(code: &str) {
    println!();
    println!(
        "  {} No table with code '{}'",
        style("i").blue().bold(),
        style(code).cyan(),
    );
    println!("     List codes with: pdmcat tables");
    println!();
}

/// List all tables ordered by code.
pub async fn list_tables(state: &AppState, out: Output) -> Result<()> {
    let tables = state.catalog()?.list_tables().await?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }
    if out.quiet {
        return Ok(());
    }

    if tables.is_empty() {
        println!();
        println!("  {} The catalog is empty.", style("i").blue().bold());
        println!("     Ingest models with: pdmcat index <path>");
        println!();
        return Ok(());
    }

    let mut table = new_table(&["Code", "Name", "Comment"]);
    for t in &tables {
        table.add_row(vec![
            Cell::new(&t.code).fg(Color::Cyan),
            Cell::new(&t.name),
            Cell::new(t.short_comment(COMMENT_WIDTH)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  Tables ({})", tables.len());
    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Show one table's columns.
pub async fn show_schema(state: &AppState, code: &str, out: Output) -> Result<()> {
    let schema = state.catalog()?.get_table_schema(code).await?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }
    if out.quiet {
        return Ok(());
    }

    let Some(schema) = schema else {
        print_not_found(code);
        return Ok(());
    };

    println!();
    println!(
        "  {} {} {}",
        style(&schema.code).cyan().bold(),
        style(&schema.name).bold(),
        style(format!("({})", schema.file_name)).dim(),
    );
    if !schema.comment.is_empty() {
        println!("  {}", schema.comment);
    }
    println!();

    let mut table = new_table(&["Code", "Name", "Type", "Null", "Comment"]);
    for c in &schema.columns {
        table.add_row(vec![
            Cell::new(&c.code).fg(Color::Cyan),
            Cell::new(&c.name),
            Cell::new(c.type_display()),
            Cell::new(if c.mandatory { "NOT NULL" } else { "" }),
            Cell::new(&c.comment).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
    println!();
    Ok(())
}

/// Show relationships of one table, with its role in each.
pub async fn show_relations(state: &AppState, code: &str, out: Output) -> Result<()> {
    let relationships = state.catalog()?.find_relationships(code).await?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&relationships)?);
        return Ok(());
    }
    if out.quiet {
        return Ok(());
    }

    let Some(relationships) = relationships else {
        print_not_found(code);
        return Ok(());
    };

    println!();
    if relationships.is_empty() {
        println!(
            "  {} '{}' has no relationships.",
            style("i").blue().bold(),
            style(code).cyan(),
        );
        println!();
        return Ok(());
    }

    let mut table = new_table(&["Code", "Name", "Role", "Parent", "Child"]);
    for r in &relationships {
        let role = match r.direction {
            RelationshipDirection::Parent => Cell::new("parent").fg(Color::Green),
            RelationshipDirection::Child => Cell::new("child").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(&r.code).fg(Color::Cyan),
            Cell::new(&r.name),
            role,
            endpoint_cell(r.parent_code.as_deref()),
            endpoint_cell(r.child_code.as_deref()),
        ]);
    }
    println!("  Relationships of {}", style(code).cyan());
    println!();
    println!("{table}");
    println!();
    Ok(())
}

fn endpoint_cell(code: Option<&str>) -> Cell {
    match code {
        Some(code) => Cell::new(code),
        None => Cell::new("(unresolved)").fg(Color::DarkGrey),
    }
}

/// List ingested model files.
pub async fn list_files(state: &AppState, out: Output) -> Result<()> {
    let files = state.catalog()?.list_files().await?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }
    if out.quiet {
        return Ok(());
    }

    if files.is_empty() {
        println!();
        println!("  {} No model files ingested yet.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = new_table(&["ID", "File", "Last indexed"]);
    for f in &files {
        table.add_row(vec![
            Cell::new(f.id),
            Cell::new(&f.file_name).fg(Color::Cyan),
            Cell::new(f.last_indexed.format("%Y-%m-%d %H:%M:%S UTC")).fg(Color::DarkGrey),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}
