//! Gantry - Revision-cached pipeline runner
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use gantry::cli::{Cli, Commands};
use gantry::config::ConfigManager;
use gantry::error::GantryResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> GantryResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // Logging: 0 = warn (spinners only), 1 = info, 2+ = debug.
    // config.general.verbose raises the floor to info.
    let verbosity = if cli.verbose == 0 && config.general.verbose {
        1
    } else {
        cli.verbose
    };
    let filter = match verbosity {
        0 => EnvFilter::new("gantry=warn"),
        1 => EnvFilter::new("gantry=info"),
        _ => EnvFilter::new("gantry=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();
    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    let pipeline_override = cli.pipeline.as_deref();

    match cli.command {
        Commands::Run(args) => {
            gantry::cli::commands::run(args, &config, pipeline_override).await
        }
        Commands::Steps(args) => gantry::cli::commands::steps(args, pipeline_override).await,
        Commands::Init(args) => gantry::cli::commands::init(args).await,
        Commands::Cache(args) => {
            gantry::cli::commands::cache(args.action, &config, pipeline_override).await
        }
        Commands::Status => gantry::cli::commands::status(&config, config_manager.path()).await,
        Commands::Config(args) => {
            gantry::cli::commands::config(args.action, &config, &config_manager).await
        }
    }
}
