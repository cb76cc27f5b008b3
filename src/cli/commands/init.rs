//! Init command - write a starter pipeline file into the project

use crate::cli::args::InitArgs;
use crate::cli::commands::resolve_project_dir;
use crate::config::ConfigManager;
use crate::error::{GantryError, GantryResult};
use console::style;
use tokio::fs;

const INIT_TEMPLATE: &str = r#"# Gantry pipeline definition
name = "my-pipeline"

# Upstream repository whose revision keys the build cache.
# Remove this section to run without caching.
[upstream]
url = "https://github.com/example/project.git"
ref = "main"
# vcs = "git"
# build_options = []

[matrix]
os = ["ubuntu-20.04"]
version = ["default"]

[cache]
enabled = true
# Directory (relative to the project) that cached steps populate
# and cache hits restore.
path = "builds"

[[steps]]
name = "build"
command = ["sh", "-c", "echo building && mkdir -p builds && touch builds/artifact"]
cached = true

[[steps]]
name = "test"
command = ["sh", "-c", "echo testing"]
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> GantryResult<()> {
    let project_dir = resolve_project_dir(args.path.as_deref())?;
    let pipeline_path = ConfigManager::pipeline_path(&project_dir);

    if pipeline_path.exists() && !args.force {
        return Err(GantryError::User(format!(
            "{} already exists (use --force to overwrite)",
            pipeline_path.display()
        )));
    }

    fs::write(&pipeline_path, INIT_TEMPLATE)
        .await
        .map_err(|e| GantryError::io("writing pipeline file", e))?;

    println!(
        "{} Created {}",
        style("✓").green(),
        style(pipeline_path.display()).cyan()
    );
    println!(
        "Edit it to describe your steps, then run {}",
        style("gantry run").cyan()
    );
    Ok(())
}
