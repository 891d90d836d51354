//! CLI command definitions for the `pdmcat` binary.
//!
//! Uses clap derive macros for argument parsing. Every command accepts
//! `--json` for machine-readable output.

pub mod catalog;
pub mod index;
pub mod search;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Catalog and semantically index PowerDesigner physical data models.
#[derive(Parser)]
#[command(name = "pdmcat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Data directory holding the catalog, the vector store and config.toml.
    #[arg(long, global = true, env = "PDMCAT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest one model file, or every model file in a directory.
    Index {
        /// File or directory (defaults to the configured pdm_dir).
        path: Option<PathBuf>,
    },

    /// List all cataloged tables.
    #[command(alias = "ls")]
    Tables,

    /// Show the columns of one table.
    Schema {
        /// Table code (e.g. CUST).
        code: String,
    },

    /// Find tables by meaning.
    Search {
        /// Free-text query.
        text: String,

        /// Number of results (defaults to the configured search_top_k).
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show the foreign-key relationships of one table.
    Relations {
        /// Table code (e.g. CUST).
        code: String,
    },

    /// List ingested model files.
    Files,

    /// Store status dashboard.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Output options shared by every command handler.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}
