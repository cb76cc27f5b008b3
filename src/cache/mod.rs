//! Revision cache gate
//!
//! Decides, per (platform, upstream revision) pair, whether previously
//! stored build artifacts can be reused or must be regenerated.

pub mod key;
pub mod store;

pub use key::CacheKey;
pub use store::{format_bytes, CacheEntry, CacheLookup, CacheStore, EntryMetadata};
