//! CLI command implementations

pub mod cache;
pub mod config;
pub mod init;
pub mod run;
pub mod status;
pub mod steps;

pub use cache::execute as cache;
pub use config::execute as config;
pub use init::execute as init;
pub use run::execute as run;
pub use status::execute as status;
pub use steps::execute as steps;

use crate::config::ConfigManager;
use crate::error::{GantryError, GantryResult};
use crate::pipeline::Pipeline;
use std::path::{Path, PathBuf};

/// Resolve the project directory from an optional --project flag
pub(crate) fn resolve_project_dir(project: Option<&Path>) -> GantryResult<PathBuf> {
    match project {
        Some(path) => path
            .canonicalize()
            .map_err(|e| GantryError::io(format!("resolving project path {}", path.display()), e)),
        None => std::env::current_dir()
            .map_err(|e| GantryError::io("getting current directory", e)),
    }
}

/// Load the pipeline for a project, honoring a --pipeline override
pub(crate) async fn load_pipeline(
    project_dir: &Path,
    pipeline_override: Option<&Path>,
) -> GantryResult<Pipeline> {
    let path = match pipeline_override {
        Some(path) => path.to_path_buf(),
        None => ConfigManager::pipeline_path(project_dir),
    };
    Pipeline::load(&path).await
}
