//! Config command - show or edit configuration

use crate::cli::args::ConfigAction;
use crate::config::{Config, ConfigManager};
use crate::error::{GantryError, GantryResult};
use console::style;
use std::path::PathBuf;

/// Execute a config subcommand
pub async fn execute(
    action: Option<ConfigAction>,
    config: &Config,
    manager: &ConfigManager,
) -> GantryResult<()> {
    match action {
        None | Some(ConfigAction::Show) => show_config(config),
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }
    Ok(())
}

fn show_config(config: &Config) {
    let toml =
        toml::to_string_pretty(config).unwrap_or_else(|_| "Error serializing config".to_string());
    println!("{}", toml);
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> GantryResult<()> {
    let mut config = config.clone();

    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(GantryError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },

        ["cache", "enabled"] => config.cache.enabled = parse_bool(value)?,
        ["cache", "dir"] => config.cache.dir = Some(PathBuf::from(value)),
        ["cache", "gc_days"] => config.cache.gc_days = parse_u32(value)?,

        ["run", "state_dir"] => config.run.state_dir = value.to_string(),

        _ => {
            eprintln!("Unknown config key: {}", key);
            eprintln!("Valid keys:");
            print_valid_keys();
            return Err(GantryError::User(format!("Unknown config key: {}", key)));
        }
    }

    manager.save(&config).await?;
    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

fn parse_bool(value: &str) -> GantryResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(GantryError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u32(value: &str) -> GantryResult<u32> {
    value
        .parse()
        .map_err(|_| GantryError::User(format!("Invalid number: {}", value)))
}

fn print_valid_keys() {
    let keys = [
        "general.verbose",
        "general.log_format",
        "cache.enabled",
        "cache.dir",
        "cache.gc_days",
        "run.state_dir",
    ];
    for key in keys {
        eprintln!("  {}", key);
    }
}
