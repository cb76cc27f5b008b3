//! Mercurial client
//!
//! Resolves remote references with `hg identify --id`, which prints the
//! short node hash of the requested revision.

use crate::error::{GantryError, GantryResult};
use crate::vcs::VcsClient;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// VCS client shelling out to hg
pub struct HgClient;

impl HgClient {
    /// Create a new hg client
    pub fn new() -> Self {
        Self
    }
}

impl Default for HgClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VcsClient for HgClient {
    async fn is_available(&self) -> bool {
        Command::new("hg")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn remote_revision(&self, url: &str, reference: &str) -> GantryResult<String> {
        debug!("Querying hg revision for {} ({})", url, reference);

        // "HEAD" is git vocabulary; hg calls the default head "default".
        let rev = if reference == "HEAD" {
            "default"
        } else {
            reference
        };

        let output = Command::new("hg")
            .args(["identify", "--id", "--rev", rev, url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GantryError::command_failed(format!("hg identify {url}"), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GantryError::RevisionQuery {
                url: url.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let hash = stdout.trim();
        if hash.is_empty() {
            return Err(GantryError::RefNotFound {
                url: url.to_string(),
                reference: reference.to_string(),
            });
        }
        Ok(hash.to_string())
    }

    fn client_name(&self) -> &'static str {
        "hg"
    }
}
