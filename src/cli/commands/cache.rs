//! Cache command - inspect and maintain the artifact store

use crate::cache::{format_bytes, CacheEntry, CacheKey, CacheLookup, CacheStore};
use crate::cli::args::{CacheAction, OutputFormat};
use crate::cli::commands::{load_pipeline, resolve_project_dir};
use crate::config::{Config, ConfigManager};
use crate::error::{GantryError, GantryResult};
use crate::vcs::create_client;
use console::style;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Execute a cache subcommand
pub async fn execute(
    action: CacheAction,
    config: &Config,
    pipeline_override: Option<&Path>,
) -> GantryResult<()> {
    let store = CacheStore::new(ConfigManager::cache_dir(config));

    match action {
        CacheAction::List { format } => list(&store, format).await,
        CacheAction::Info { project } => {
            info(&store, project.as_deref(), pipeline_override).await
        }
        CacheAction::Gc { days, dry_run } => {
            gc(&store, days.unwrap_or(config.cache.gc_days), dry_run).await
        }
        CacheAction::Clear { yes } => clear(&store, yes).await,
    }
}

#[derive(Serialize)]
struct EntryRow<'a> {
    key: &'a str,
    platform: Option<&'a str>,
    revision: Option<&'a str>,
    size_bytes: u64,
    complete: bool,
    created_at: Option<String>,
}

impl<'a> EntryRow<'a> {
    fn from_entry(entry: &'a CacheEntry) -> Self {
        Self {
            key: &entry.name,
            platform: entry.metadata.as_ref().map(|m| m.platform.as_str()),
            revision: entry.metadata.as_ref().map(|m| m.revision.as_str()),
            size_bytes: entry.size_bytes,
            complete: entry.complete,
            created_at: entry
                .metadata
                .as_ref()
                .map(|m| m.created_at.format("%Y-%m-%d %H:%M UTC").to_string()),
        }
    }
}

async fn list(store: &CacheStore, format: OutputFormat) -> GantryResult<()> {
    let entries = store.list().await?;

    match format {
        OutputFormat::Json => {
            let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from_entry).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}", entry.name);
            }
        }
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("Cache is empty ({})", store.root().display());
                return Ok(());
            }
            println!("Store: {}", style(store.root().display()).dim());
            println!();
            println!("{:<44} {:<10} {:<10} {}", "KEY", "SIZE", "STATE", "CREATED");
            println!("{}", "-".repeat(80));
            let mut total = 0u64;
            for entry in &entries {
                let row = EntryRow::from_entry(entry);
                let state = if entry.complete {
                    style("complete").green().to_string()
                } else {
                    style("partial").yellow().to_string()
                };
                println!(
                    "{:<44} {:<10} {:<10} {}",
                    row.key,
                    format_bytes(entry.size_bytes),
                    state,
                    row.created_at.as_deref().unwrap_or("-")
                );
                total += entry.size_bytes;
            }
            println!();
            println!("{} entries, {}", entries.len(), format_bytes(total));
        }
    }
    Ok(())
}

/// Show the keys the current project would use and whether each is cached
async fn info(
    store: &CacheStore,
    project: Option<&Path>,
    pipeline_override: Option<&Path>,
) -> GantryResult<()> {
    let project_dir = resolve_project_dir(project)?;
    let pipeline = load_pipeline(&project_dir, pipeline_override).await?;

    let upstream = pipeline
        .upstream
        .as_ref()
        .ok_or(GantryError::UpstreamMissing)?;

    let client = create_client(upstream);
    if !client.is_available().await {
        return Err(GantryError::VcsNotFound {
            name: client.client_name().to_string(),
            hint: format!("the pipeline's [upstream] uses vcs = \"{}\"", upstream.vcs),
        });
    }
    let revision = client
        .remote_revision(&upstream.url, &upstream.reference)
        .await?;

    println!("Upstream:  {}", style(&upstream.url).cyan());
    println!("Ref:       {} ({})", upstream.reference, &revision);
    println!("Store:     {}", store.root().display());
    println!();

    for os in &pipeline.matrix.os {
        let key = CacheKey::with_options(os, &revision, &upstream.build_options);
        let state = match store.lookup(&key).await? {
            CacheLookup::Hit => style("hit").green(),
            CacheLookup::Miss => style("miss").yellow(),
        };
        println!("{:<44} {}", key, state);
    }
    Ok(())
}

async fn gc(store: &CacheStore, days: u32, dry_run: bool) -> GantryResult<()> {
    if days == 0 {
        println!("Retention is 0 days; nothing to collect");
        return Ok(());
    }

    let removed = store.gc(days, dry_run).await?;
    if removed.is_empty() {
        println!("No entries older than {} days", days);
        return Ok(());
    }

    let verb = if dry_run { "Would remove" } else { "Removed" };
    for name in &removed {
        println!("{} {}", verb, name);
    }
    println!("{} {} entries", verb, removed.len());
    Ok(())
}

async fn clear(store: &CacheStore, yes: bool) -> GantryResult<()> {
    let entries = store.list().await?;
    if entries.is_empty() {
        println!("Cache is already empty");
        return Ok(());
    }

    if !yes {
        print!("Remove all {} cache entries? [y/N] ", entries.len());
        io::stdout()
            .flush()
            .map_err(|e| GantryError::io("flushing stdout", e))?;
        let mut answer = String::new();
        io::stdin()
            .read_line(&mut answer)
            .map_err(|e| GantryError::io("reading confirmation", e))?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Aborted");
            return Ok(());
        }
    }

    let removed = store.clear().await?;
    println!("{} Removed {} entries", style("✓").green(), removed);
    Ok(())
}
