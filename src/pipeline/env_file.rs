//! Run-scoped environment file
//!
//! Each cell run owns one env file whose path is exported to every step as
//! `GANTRY_ENV`. Steps append `KEY=VALUE` lines to it; after each step the
//! runner re-reads the file and injects the pairs into all later steps of
//! the same run. Cells never share env files.

use crate::error::{GantryError, GantryResult};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Environment variable holding the env file path inside step processes
pub const ENV_FILE_VAR: &str = "GANTRY_ENV";

/// The env file of one cell run
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    /// Create an empty env file inside the run directory
    pub async fn create(run_dir: &Path) -> GantryResult<Self> {
        let path = run_dir.join("env");
        fs::write(&path, b"")
            .await
            .map_err(|e| GantryError::io(format!("creating env file {}", path.display()), e))?;
        Ok(Self { path })
    }

    /// Path exported to step processes
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all pairs currently in the file, in appearance order
    pub async fn read(&self) -> GantryResult<Vec<(String, String)>> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| GantryError::io(format!("reading env file {}", self.path.display()), e))?;
        Ok(parse_env_lines(&content))
    }
}

/// Parse `KEY=VALUE` lines; blank lines, comments and lines without '='
/// or with an empty key are ignored.
pub fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match line.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    Some((key.to_string(), value.to_string()))
                }
                _ => None,
            }
        })
        .collect()
}
