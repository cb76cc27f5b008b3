//! Directory-backed artifact store
//!
//! One entry per cache key, holding the stored build tree plus a small JSON
//! metadata file. The sentinel file is written last: an entry without it is
//! treated as a plain miss and removed, never reported as an error.

use crate::cache::key::CacheKey;
use crate::error::{GantryError, GantryResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Marks an entry as fully stored; checked on every lookup
pub const SENTINEL_FILE: &str = "store_complete";

const METADATA_FILE: &str = "entry.json";
const TREE_DIR: &str = "tree";

/// Format bytes as human-readable size (e.g., "1.5 GB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    /// A complete entry exists for the key
    Hit,
    /// No usable entry (absent, or incomplete and now removed)
    Miss,
}

/// Metadata stored beside each entry's tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Full key text (also the directory name)
    pub key: String,
    /// Platform half of the key
    pub platform: String,
    /// Revision half of the key
    pub revision: String,
    /// When the entry was stored
    pub created_at: DateTime<Utc>,
}

/// One entry as seen by `cache list`
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Directory name under the store root
    pub name: String,
    /// Parsed metadata, if the entry has any
    pub metadata: Option<EntryMetadata>,
    /// Total size on disk
    pub size_bytes: u64,
    /// Whether the sentinel is present
    pub complete: bool,
}

impl CacheEntry {
    /// Check if this entry is older than the given number of days
    pub fn is_older_than_days(&self, days: u32) -> bool {
        match &self.metadata {
            Some(meta) => {
                let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
                meta.created_at < cutoff
            }
            // No metadata means the save never finished; always collectable.
            None => true,
        }
    }
}

/// Directory-backed store of build artifacts, one directory per cache key
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at the given directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The store root
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.dir_name())
    }

    /// Look up a key. Entries without the sentinel are removed and reported
    /// as a miss; there is no separate "corrupt" outcome.
    pub async fn lookup(&self, key: &CacheKey) -> GantryResult<CacheLookup> {
        let dir = self.entry_dir(key);
        if !dir.exists() {
            debug!("Cache miss for {}", key);
            return Ok(CacheLookup::Miss);
        }

        if dir.join(SENTINEL_FILE).exists() {
            debug!("Cache hit for {}", key);
            return Ok(CacheLookup::Hit);
        }

        info!("Removing incomplete cache entry {}", key);
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| GantryError::io(format!("removing {}", dir.display()), e))?;
        Ok(CacheLookup::Miss)
    }

    /// Restore a stored tree into `dest`, replacing whatever is there
    pub async fn restore(&self, key: &CacheKey, dest: &Path) -> GantryResult<()> {
        let tree = self.entry_dir(key).join(TREE_DIR);
        if !tree.exists() {
            return Err(GantryError::CacheRestore {
                key: key.to_string(),
                reason: "entry has no stored tree".to_string(),
            });
        }

        if dest.exists() {
            fs::remove_dir_all(dest)
                .await
                .map_err(|e| GantryError::io(format!("clearing {}", dest.display()), e))?;
        }

        copy_tree(&tree, dest).map_err(|e| GantryError::CacheRestore {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        info!("Restored cache entry {} to {}", key, dest.display());
        Ok(())
    }

    /// Store `src` under the key. The tree is staged beside the final
    /// location and renamed into place, sentinel written last; a concurrent
    /// save of the same key is last-writer-wins.
    pub async fn save(&self, key: &CacheKey, src: &Path) -> GantryResult<()> {
        if !src.exists() {
            return Err(GantryError::CacheStore {
                key: key.to_string(),
                reason: format!("source path {} does not exist", src.display()),
            });
        }

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| GantryError::io(format!("creating {}", self.root.display()), e))?;

        let staging = self.root.join(format!(".staging-{}", Uuid::new_v4()));
        let store_err = |reason: String| GantryError::CacheStore {
            key: key.to_string(),
            reason,
        };

        let result = async {
            copy_tree(src, &staging.join(TREE_DIR)).map_err(|e| store_err(e.to_string()))?;

            let metadata = EntryMetadata {
                key: key.dir_name(),
                platform: key.platform.clone(),
                revision: key.revision.clone(),
                created_at: Utc::now(),
            };
            let content = serde_json::to_string_pretty(&metadata)?;
            fs::write(staging.join(METADATA_FILE), content)
                .await
                .map_err(|e| store_err(format!("writing metadata: {e}")))?;

            fs::write(staging.join(SENTINEL_FILE), b"")
                .await
                .map_err(|e| store_err(format!("writing sentinel: {e}")))?;

            let dir = self.entry_dir(key);
            if dir.exists() {
                fs::remove_dir_all(&dir)
                    .await
                    .map_err(|e| store_err(format!("replacing existing entry: {e}")))?;
            }
            fs::rename(&staging, &dir)
                .await
                .map_err(|e| store_err(format!("publishing entry: {e}")))?;

            Ok(())
        }
        .await;

        if result.is_err() && staging.exists() {
            let _ = fs::remove_dir_all(&staging).await;
        }
        if result.is_ok() {
            info!("Stored cache entry {}", key);
        }
        result
    }

    /// List all entries, newest first
    pub async fn list(&self) -> GantryResult<Vec<CacheEntry>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut entries = vec![];
        let mut dir_entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| GantryError::io(format!("reading {}", self.root.display()), e))?;

        while let Some(entry) = dir_entries
            .next_entry()
            .await
            .map_err(|e| GantryError::io("reading cache store entry", e))?
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(".staging-") {
                continue;
            }

            let metadata = std::fs::read_to_string(path.join(METADATA_FILE))
                .ok()
                .and_then(|content| serde_json::from_str(&content).ok());

            entries.push(CacheEntry {
                name,
                metadata,
                size_bytes: dir_size(&path),
                complete: path.join(SENTINEL_FILE).exists(),
            });
        }

        entries.sort_by(|a, b| {
            let a_time = a.metadata.as_ref().map(|m| m.created_at);
            let b_time = b.metadata.as_ref().map(|m| m.created_at);
            b_time.cmp(&a_time)
        });

        Ok(entries)
    }

    /// Remove entries older than `days`. Returns the removed entry names;
    /// with `dry_run` nothing is deleted.
    pub async fn gc(&self, days: u32, dry_run: bool) -> GantryResult<Vec<String>> {
        let mut removed = vec![];
        for entry in self.list().await? {
            if !entry.is_older_than_days(days) {
                continue;
            }
            if !dry_run {
                let path = self.root.join(&entry.name);
                fs::remove_dir_all(&path)
                    .await
                    .map_err(|e| GantryError::io(format!("removing {}", path.display()), e))?;
                info!("Removed cache entry {}", entry.name);
            }
            removed.push(entry.name);
        }
        Ok(removed)
    }

    /// Remove every entry. Returns the number removed.
    pub async fn clear(&self) -> GantryResult<usize> {
        let entries = self.list().await?;
        for entry in &entries {
            let path = self.root.join(&entry.name);
            fs::remove_dir_all(&path)
                .await
                .map_err(|e| GantryError::io(format!("removing {}", path.display()), e))?;
        }
        Ok(entries.len())
    }
}

/// Recursively copy a directory tree
fn copy_tree(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Total size of a directory tree in bytes
fn dir_size(path: &Path) -> u64 {
    let mut total = 0;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                total += dir_size(&path);
            } else if let Ok(meta) = entry.metadata() {
                total += meta.len();
            }
        }
    }
    total
}
