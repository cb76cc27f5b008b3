//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Gantry - Revision-cached build and test pipeline runner
///
/// Runs pipelines across a matrix of cells, gating expensive build steps
/// behind a cache keyed on the upstream revision. The `about` token below
/// makes clap print the package description, so keep the two in sync.
#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "GANTRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pipeline file path (defaults to gantry.toml in the project directory)
    #[arg(long, global = true, env = "GANTRY_PIPELINE")]
    pub pipeline: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline across all matrix cells
    Run(RunArgs),

    /// List the pipeline's steps
    Steps(StepsArgs),

    /// Initialize a project-local gantry.toml
    Init(InitArgs),

    /// Manage the artifact cache store
    Cache(CacheArgs),

    /// Check VCS clients and configured paths
    Status,

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Steps to run, by name or 1-based number (defaults to all)
    pub steps: Vec<String>,

    /// Only run the given matrix cells (OS/VERSION, repeatable)
    #[arg(long)]
    pub cell: Vec<String>,

    /// Project directory (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Bypass the cache gate entirely (no lookup, no store)
    #[arg(long)]
    pub no_cache: bool,

    /// Ignore existing cache entries but store the new build
    #[arg(long, conflicts_with = "no_cache")]
    pub fresh: bool,
}

/// Arguments for the steps command
#[derive(Parser, Debug)]
pub struct StepsArgs {
    /// Project directory (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing gantry.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List all cache entries
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the cache key and state for the current project
    Info {
        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },

    /// Remove entries older than N days
    Gc {
        /// Remove entries older than N days (default: from config)
        #[arg(long)]
        days: Option<u32>,

        /// Dry run - show what would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove every cache entry
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.gc_days)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
