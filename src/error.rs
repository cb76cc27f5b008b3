//! Error types for Gantry
//!
//! All modules use `GantryResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Gantry operations
pub type GantryResult<T> = Result<T, GantryError>;

/// All errors that can occur in Gantry
#[derive(Error, Debug)]
pub enum GantryError {
    // Environment errors
    #[error("VCS client not found: {name}. {hint}")]
    VcsNotFound { name: String, hint: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Pipeline errors
    #[error("Pipeline file not found: {0}")]
    PipelineNotFound(PathBuf),

    #[error("Invalid pipeline at {path}: {reason}")]
    PipelineInvalid { path: PathBuf, reason: String },

    #[error("There is no step named or numbered \"{0}\"")]
    StepNotFound(String),

    #[error("There is no matrix cell \"{0}\"")]
    CellNotFound(String),

    #[error("Invalid cell selector \"{0}\": expected OS/VERSION")]
    CellSelectorInvalid(String),

    #[error("{failed} of {total} matrix cells failed")]
    RunFailed { failed: usize, total: usize },

    // Upstream errors
    #[error("Upstream revision query failed for {url}: {reason}")]
    RevisionQuery { url: String, reason: String },

    #[error("Upstream ref \"{reference}\" not found at {url}")]
    RefNotFound { url: String, reference: String },

    #[error("No [upstream] section in pipeline, cannot compute a cache key")]
    UpstreamMissing,

    // Cache errors
    #[error("Failed to store cache entry {key}: {reason}")]
    CacheStore { key: String, reason: String },

    #[error("Failed to restore cache entry {key}: {reason}")]
    CacheRestore { key: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl GantryError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PipelineNotFound(_) => Some("Run: gantry init"),
            Self::VcsNotFound { .. } => Some("Install the VCS client or change [upstream] vcs"),
            Self::UpstreamMissing => {
                Some("Add an [upstream] section to gantry.toml or run with --no-cache")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GantryError::RevisionQuery {
            url: "https://example.org/repo.git".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("example.org"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn error_hint() {
        let err = GantryError::PipelineNotFound(PathBuf::from("gantry.toml"));
        assert_eq!(err.hint(), Some("Run: gantry init"));
        assert_eq!(GantryError::User("oops".to_string()).hint(), None);
    }

    #[test]
    fn run_failed_display() {
        let err = GantryError::RunFailed {
            failed: 1,
            total: 4,
        };
        assert_eq!(err.to_string(), "1 of 4 matrix cells failed");
    }
}
