//! pdmcat CLI entry point.
//!
//! Parses CLI arguments, opens the catalog and the semantic index, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, Output};
use pdmcat_infra::config::resolve_data_dir;
use pdmcat_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet && cli.verbose == 0 {
        "error"
    } else {
        filter_for_verbosity(cli.verbose)
    };
    init_tracing(filter, cli.otel).map_err(|e| anyhow::anyhow!(e))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "pdmcat", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(resolve_data_dir(cli.data_dir)).await?;
    let out = Output {
        json: cli.json,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Index { path } => cli::index::run_index(&state, path, out).await,
        Commands::Tables => cli::catalog::list_tables(&state, out).await,
        Commands::Schema { code } => cli::catalog::show_schema(&state, &code, out).await,
        Commands::Search { text, top_k } => {
            cli::search::search_tables(&state, &text, top_k, out).await
        }
        Commands::Relations { code } => cli::catalog::show_relations(&state, &code, out).await,
        Commands::Files => cli::catalog::list_files(&state, out).await,
        Commands::Status => cli::status::status(&state, out).await,
        Commands::Completions { .. } => Ok(()),
    };

    shutdown_tracing();
    result
}
