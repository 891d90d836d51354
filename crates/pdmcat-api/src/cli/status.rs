//! Store status dashboard command.

use anyhow::Result;
use console::style;

use pdmcat_core::catalog::CatalogRepository;
use pdmcat_core::index::embedder::Embedder;
use pdmcat_core::index::semantic::SemanticIndex;
use pdmcat_types::schema::CatalogCounts;

use super::Output;
use crate::state::AppState;

/// Display per-store availability and row counts.
pub async fn status(state: &AppState, out: Output) -> Result<()> {
    let catalog = match state.catalog() {
        Ok(catalog) => catalog.counts().await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    let index = match state.index() {
        Ok(index) => index
            .count()
            .await
            .map(|n| (n, index.embedder().model_name().to_string()))
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    if out.json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "pdm_dir": state.config.pdm_dir(&state.data_dir).display().to_string(),
            "catalog": match &catalog {
                Ok(counts) => serde_json::json!({ "available": true, "counts": counts }),
                Err(e) => serde_json::json!({ "available": false, "error": e }),
            },
            "index": match &index {
                Ok((documents, model)) => serde_json::json!({
                    "available": true,
                    "collection": state.config.collection,
                    "documents": documents,
                    "embedding_model": model,
                }),
                Err(e) => serde_json::json!({ "available": false, "error": e }),
            },
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }
    if out.quiet {
        return Ok(());
    }

    println!();
    println!(
        "  {} pdmcat v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Catalog ──").dim());
    match &catalog {
        Ok(counts) => print_counts(counts),
        Err(e) => println!("  {} {}", style("✗").red(), e),
    }
    println!();

    println!("  {}", style("── Semantic index ──").dim());
    match &index {
        Ok((documents, model)) => {
            println!("  Collection: {}", style(&state.config.collection).cyan());
            println!("  Documents:  {}", style(documents).bold());
            println!("  Model:      {}", model);
        }
        Err(e) => println!("  {} {}", style("✗").red(), e),
    }
    println!();

    println!("  {}", style("── System ──").dim());
    println!(
        "  Data dir:   {}",
        style(state.data_dir.display()).dim()
    );
    println!(
        "  PDM dir:    {}",
        style(state.config.pdm_dir(&state.data_dir).display()).dim()
    );
    println!();

    Ok(())
}

fn print_counts(counts: &CatalogCounts) {
    println!("  Files:      {}", style(counts.files).bold());
    println!("  Tables:     {}", style(counts.tables).bold());
    println!("  Columns:    {}", counts.columns);
    println!("  References: {}", counts.references);
}
