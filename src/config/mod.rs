//! Configuration management for Gantry

pub mod schema;

pub use schema::Config;

use crate::error::{GantryError, GantryResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default pipeline file name looked up in the project directory
pub const PIPELINE_FILE: &str = "gantry.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gantry")
            .join("config.toml")
    }

    /// Get the default cache store root
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gantry")
            .join("store")
    }

    /// Resolve the cache store root for a loaded config
    pub fn cache_dir(config: &Config) -> PathBuf {
        config
            .cache
            .dir
            .clone()
            .unwrap_or_else(Self::default_cache_dir)
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> GantryResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> GantryResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| GantryError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| GantryError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> GantryResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            GantryError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> GantryResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| GantryError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Locate the pipeline file for a project directory
    pub fn pipeline_path(project_dir: &Path) -> PathBuf {
        project_dir.join(PIPELINE_FILE)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert!(config.cache.enabled);
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.cache.gc_days = 14;

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.cache.gc_days, 14);
    }

    #[tokio::test]
    async fn load_invalid_toml_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "not [valid").unwrap();
        let manager = ConfigManager::with_path(path);

        assert!(manager.load().await.is_err());
    }

    #[test]
    fn cache_dir_override() {
        let mut config = Config::default();
        assert_eq!(
            ConfigManager::cache_dir(&config),
            ConfigManager::default_cache_dir()
        );

        config.cache.dir = Some(PathBuf::from("/tmp/store"));
        assert_eq!(
            ConfigManager::cache_dir(&config),
            PathBuf::from("/tmp/store")
        );
    }
}
