//! Version control clients
//!
//! Provides a trait for querying upstream repositories that can be
//! implemented by different clients (git, hg). The only operation the
//! pipeline needs is resolving a remote reference to a revision identifier;
//! a failed query is fatal to the run, with no fallback key.

pub mod git;
pub mod hg;

pub use git::GitClient;
pub use hg::HgClient;

use crate::error::GantryResult;
use crate::pipeline::def::{Upstream, VcsKind};
use async_trait::async_trait;

/// Abstract VCS client interface
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Check if the client binary is available on this system
    async fn is_available(&self) -> bool;

    /// Resolve a remote reference to a revision identifier (content hash)
    async fn remote_revision(&self, url: &str, reference: &str) -> GantryResult<String>;

    /// The client name for display ("git", "hg")
    fn client_name(&self) -> &'static str;
}

/// Create the client for an upstream section
pub fn create_client(upstream: &Upstream) -> Box<dyn VcsClient> {
    match upstream.vcs {
        VcsKind::Git => Box::new(GitClient::new()),
        VcsKind::Hg => Box::new(HgClient::new()),
    }
}
