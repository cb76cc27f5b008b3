//! Cache key construction
//!
//! A cache key is the deterministic concatenation of a platform label and an
//! upstream revision identifier, optionally extended with a digest of the
//! build options. Entries are reused only on an exact key match.

use sha2::{Digest, Sha256};
use std::fmt;

/// Composite key indexing stored build artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    /// Operating-system label of the matrix cell
    pub platform: String,
    /// Upstream revision identifier
    pub revision: String,
    /// Build options folded into the key
    pub options: Vec<String>,
}

impl CacheKey {
    /// Create a key without build options
    pub fn new(platform: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            revision: revision.into(),
            options: vec![],
        }
    }

    /// Create a key with build options
    pub fn with_options(
        platform: impl Into<String>,
        revision: impl Into<String>,
        options: &[String],
    ) -> Self {
        Self {
            platform: platform.into(),
            revision: revision.into(),
            options: options.to_vec(),
        }
    }

    /// Directory name for this key: `{platform}-{revision}[-{options digest}]`
    pub fn dir_name(&self) -> String {
        match self.options_digest() {
            Some(digest) => format!("{}-{}-{}", self.platform, self.revision, digest),
            None => format!("{}-{}", self.platform, self.revision),
        }
    }

    /// Short hex digest over the build options, None when there are none.
    ///
    /// Options may contain characters that are unusable in directory names,
    /// so they enter the key as a SHA256 prefix rather than verbatim.
    fn options_digest(&self) -> Option<String> {
        if self.options.is_empty() {
            return None;
        }
        let mut hasher = Sha256::new();
        for option in &self.options {
            hasher.update(option.as_bytes());
            hasher.update([0]);
        }
        let result = hasher.finalize();
        Some(hex::encode(&result[..6]))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}
