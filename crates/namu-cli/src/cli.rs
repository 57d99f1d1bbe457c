//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments for `namu`.
#[derive(Parser, Debug)]
#[command(name = "namu", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "NAMU_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Commands understood by `namu`.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server.
    Serve,

    /// Ingest a JSON Lines dataset in the foreground.
    Ingest {
        /// Dataset path (overrides `ingest.dataset_path`).
        #[arg(short, long)]
        path: Option<String>,

        /// Stop after this many rows (overrides `ingest.limit`).
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Plain vector search.
    Search {
        /// Query text.
        query: String,

        /// Maximum results.
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Hybrid vector and full-text search.
    Hybrid {
        /// Query text.
        query: String,

        /// Disable the vector signal.
        #[arg(long)]
        no_vector: bool,

        /// Disable the full-text signal.
        #[arg(long)]
        no_text: bool,

        /// Keyword weight in [0, 1].
        #[arg(short, long, default_value = "0.5")]
        keyword_weight: f64,

        /// Maximum results.
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Print the stored document count.
    Stats,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Print the effective configuration as TOML.
    Show,
}

// ============================================================================
// Tests
// ============================================================================
