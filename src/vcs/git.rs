//! Git client
//!
//! Resolves remote references with `git ls-remote`, which prints one
//! `<hash>\t<refname>` line per matching ref without cloning anything.

use crate::error::{GantryError, GantryResult};
use crate::vcs::VcsClient;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// VCS client shelling out to git
pub struct GitClient;

impl GitClient {
    /// Create a new git client
    pub fn new() -> Self {
        Self
    }
}

impl Default for GitClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VcsClient for GitClient {
    async fn is_available(&self) -> bool {
        Command::new("git")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn remote_revision(&self, url: &str, reference: &str) -> GantryResult<String> {
        debug!("Querying git revision for {} ({})", url, reference);

        let output = Command::new("git")
            .args(["ls-remote", url, reference])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GantryError::command_failed(format!("git ls-remote {url}"), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GantryError::RevisionQuery {
                url: url.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ls_remote(&stdout).ok_or_else(|| GantryError::RefNotFound {
            url: url.to_string(),
            reference: reference.to_string(),
        })
    }

    fn client_name(&self) -> &'static str {
        "git"
    }
}

/// Extract the hash from the first `<hash>\t<refname>` line
fn parse_ls_remote(output: &str) -> Option<String> {
    output
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().next())
        .filter(|hash| !hash.is_empty())
        .map(|hash| hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_ref() {
        let output = "f4c2a1b0e9d8c7b6a5f4e3d2c1b0a9f8e7d6c5b4\trefs/heads/main\n";
        assert_eq!(
            parse_ls_remote(output).as_deref(),
            Some("f4c2a1b0e9d8c7b6a5f4e3d2c1b0a9f8e7d6c5b4")
        );
    }

    #[test]
    fn takes_first_of_multiple_refs() {
        let output = "aaaa\trefs/heads/main\nbbbb\trefs/tags/v1\n";
        assert_eq!(parse_ls_remote(output).as_deref(), Some("aaaa"));
    }

    #[test]
    fn empty_output_is_none() {
        assert_eq!(parse_ls_remote(""), None);
        assert_eq!(parse_ls_remote("\n"), None);
    }
}
