//! Global configuration schema for Gantry
//!
//! Configuration is stored at `~/.config/gantry/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache store settings
    pub cache: CacheConfig,

    /// Run directory settings
    pub run: RunConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Cache store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the revision cache gate (default: true)
    pub enabled: bool,

    /// Cache store root (default: ~/.cache/gantry/store)
    pub dir: Option<PathBuf>,

    /// Auto-remove entries older than N days with `gantry cache gc` (0 = disabled)
    pub gc_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            gc_days: 30,
        }
    }
}

/// Run directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Project-relative directory for run state (env files, logs, summaries)
    pub state_dir: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            state_dir: ".gantry".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[cache]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.gc_days, 30);
        assert_eq!(config.run.state_dir, ".gantry");
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [cache]
            gc_days = 7
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.gc_days, 7);
        assert_eq!(config.general.log_format, "text"); // default preserved
    }
}
