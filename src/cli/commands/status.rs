//! Status command - environment and store overview

use crate::cache::{format_bytes, CacheStore};
use crate::config::{Config, ConfigManager};
use crate::error::GantryResult;
use crate::vcs::{GitClient, HgClient, VcsClient};
use console::style;
use std::path::Path;

/// Execute the status command
pub async fn execute(config: &Config, config_path: &Path) -> GantryResult<()> {
    println!("{}", style("Gantry status").cyan().bold());
    println!();

    let git = GitClient::new();
    let hg = HgClient::new();
    print_client(&git, git.is_available().await);
    print_client(&hg, hg.is_available().await);
    println!();

    println!("Config:  {}", config_path.display());

    let store = CacheStore::new(ConfigManager::cache_dir(config));
    if config.cache.enabled {
        let entries = store.list().await?;
        let total: u64 = entries.iter().map(|e| e.size_bytes).sum();
        println!(
            "Cache:   {} ({} entries, {})",
            store.root().display(),
            entries.len(),
            format_bytes(total)
        );
    } else {
        println!("Cache:   {}", style("disabled").yellow());
    }
    Ok(())
}

fn print_client(client: &dyn VcsClient, available: bool) {
    let mark = if available {
        style("✓").green()
    } else {
        style("✗").red()
    };
    println!("{} {} client", mark, client.client_name());
}
