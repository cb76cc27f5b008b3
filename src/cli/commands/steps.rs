//! Steps command - list the pipeline's steps without running them

use crate::cli::args::StepsArgs;
use crate::cli::commands::{load_pipeline, resolve_project_dir};
use crate::error::GantryResult;
use crate::pipeline::Gate;
use console::style;
use std::path::Path;

/// Execute the steps command
pub async fn execute(args: StepsArgs, pipeline_override: Option<&Path>) -> GantryResult<()> {
    let project_dir = resolve_project_dir(args.project.as_deref())?;
    let pipeline = load_pipeline(&project_dir, pipeline_override).await?;

    println!("Pipeline: {}", style(pipeline.display_name(&project_dir)).cyan());
    println!();

    for (index, step) in pipeline.steps.iter().enumerate() {
        let mut tags = Vec::new();
        if step.cached {
            tags.push("cached".to_string());
        }
        match &step.gate {
            Gate::All => {}
            Gate::First => tags.push("first cell only".to_string()),
            Gate::Cell(sel) => tags.push(format!("cell {}", sel)),
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            style(format!(" [{}]", tags.join(", "))).dim().to_string()
        };

        println!(
            "{:>3}. {:<20} {}{}",
            index + 1,
            step.name,
            style(step.command.join(" ")).dim(),
            tags
        );
    }
    println!();
    println!(
        "Run all with {} or a subset with {}",
        style("gantry run").cyan(),
        style("gantry run <name|number>...").cyan()
    );
    Ok(())
}
