//! Gantry - Revision-cached pipeline runner
//!
//! Runs build-and-test pipelines across a matrix of cells, gating
//! expensive build steps behind a cache keyed on the upstream revision.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod vcs;

pub use error::{GantryError, GantryResult};
