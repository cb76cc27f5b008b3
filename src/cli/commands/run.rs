//! Run command - execute the pipeline across matrix cells

use crate::cache::CacheStore;
use crate::cli::args::RunArgs;
use crate::cli::commands::{load_pipeline, resolve_project_dir};
use crate::config::{Config, ConfigManager};
use crate::error::{GantryError, GantryResult};
use crate::pipeline::{
    CacheOutcome, CellRunner, CellSelector, MatrixCell, RunSummary, StepStatus,
};
use crate::vcs::create_client;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{debug, info};

/// Execute the run command
pub async fn execute(
    args: RunArgs,
    config: &Config,
    pipeline_override: Option<&Path>,
) -> GantryResult<()> {
    let project_dir = resolve_project_dir(args.project.as_deref())?;
    debug!("Project directory: {}", project_dir.display());

    let pipeline = load_pipeline(&project_dir, pipeline_override).await?;
    let pipeline_name = pipeline.display_name(&project_dir);
    let step_indexes = pipeline.resolve_steps(&args.steps)?;
    let cells = select_cells(&pipeline.matrix.cells(), &args.cell)?;

    // The gate is consulted only when the pipeline tracks an upstream and
    // caching is enabled on both levels. --no-cache bypasses it entirely.
    let gate_enabled = config.cache.enabled && pipeline.cache.enabled && !args.no_cache;
    let revision = match (&pipeline.upstream, gate_enabled) {
        (Some(upstream), true) => {
            let client = create_client(upstream);
            if !client.is_available().await {
                return Err(GantryError::VcsNotFound {
                    name: client.client_name().to_string(),
                    hint: format!("the pipeline's [upstream] uses vcs = \"{}\"", upstream.vcs),
                });
            }
            let pb = create_progress_bar(&format!(
                "Querying upstream revision ({})...",
                client.client_name()
            ));
            // A failed query fails the whole run; there is no fallback key.
            let result = client
                .remote_revision(&upstream.url, &upstream.reference)
                .await;
            pb.finish_and_clear();
            let revision = result?;
            info!("Upstream {} is at {}", upstream.url, revision);
            Some(revision)
        }
        _ => None,
    };

    let store = revision
        .is_some()
        .then(|| CacheStore::new(ConfigManager::cache_dir(config)));

    let run_root = project_dir.join(&config.run.state_dir).join("runs");
    let runner = CellRunner::new(
        &pipeline,
        pipeline_name.clone(),
        &project_dir,
        run_root,
        revision,
        store.as_ref(),
        args.fresh,
    );

    let mut summaries = Vec::with_capacity(cells.len());
    for cell in &cells {
        let pb = create_progress_bar(&format!("Running cell {}...", cell));
        let result = runner.run_cell(cell, &step_indexes).await;
        pb.finish_and_clear();
        summaries.push(result?);
    }

    print_results(&pipeline_name, &summaries);

    let failed = summaries.iter().filter(|s| !s.passed).count();
    if failed > 0 {
        return Err(GantryError::RunFailed {
            failed,
            total: summaries.len(),
        });
    }
    Ok(())
}

/// Apply --cell filters; every selector must match at least one cell
fn select_cells(cells: &[MatrixCell], filters: &[String]) -> GantryResult<Vec<MatrixCell>> {
    if filters.is_empty() {
        return Ok(cells.to_vec());
    }

    let mut selectors = Vec::with_capacity(filters.len());
    for filter in filters {
        let selector: CellSelector = filter
            .parse()
            .map_err(|_| GantryError::CellSelectorInvalid(filter.clone()))?;
        if !cells.iter().any(|c| selector.matches(c)) {
            return Err(GantryError::CellNotFound(filter.clone()));
        }
        selectors.push(selector);
    }

    Ok(cells
        .iter()
        .filter(|c| selectors.iter().any(|s| s.matches(c)))
        .cloned()
        .collect())
}

fn print_results(pipeline_name: &str, summaries: &[RunSummary]) {
    println!("Pipeline: {}", style(pipeline_name).cyan());
    println!();
    println!("{:<28} {:<10} {:<8} {}", "CELL", "CACHE", "RESULT", "STEPS");
    println!("{}", "-".repeat(64));

    for summary in summaries {
        let result = if summary.passed {
            style("passed").green().to_string()
        } else {
            style("failed").red().to_string()
        };
        let cache = match summary.cache {
            CacheOutcome::Hit => style("hit").green().to_string(),
            CacheOutcome::Miss => style("miss").yellow().to_string(),
            CacheOutcome::Disabled => style("off").dim().to_string(),
        };
        let passed = summary
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Passed)
            .count();
        let skipped = summary
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Skipped)
            .count();

        println!(
            "{:<28} {:<10} {:<8} {} passed, {} skipped",
            summary.cell, cache, result, passed, skipped
        );

        for step in summary.steps.iter().filter(|s| s.status == StepStatus::Failed) {
            println!(
                "  {} step {} exited with code {} (see {})",
                style("✗").red(),
                step.name,
                step.exit_code.unwrap_or(-1),
                step.log.as_deref().unwrap_or("-")
            );
        }
    }
    println!();
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells() -> Vec<MatrixCell> {
        vec![
            MatrixCell {
                os: "ubuntu-20.04".to_string(),
                version: "3.7".to_string(),
            },
            MatrixCell {
                os: "ubuntu-20.04".to_string(),
                version: "3.8".to_string(),
            },
        ]
    }

    #[test]
    fn no_filter_selects_all() {
        let selected = select_cells(&cells(), &[]).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn filter_selects_matching_cell() {
        let selected = select_cells(&cells(), &["ubuntu-20.04/3.8".to_string()]).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].version, "3.8");
    }

    #[test]
    fn unknown_cell_is_an_error() {
        let result = select_cells(&cells(), &["macos-11/3.8".to_string()]);
        assert!(matches!(result, Err(GantryError::CellNotFound(_))));
    }

    #[test]
    fn malformed_selector_is_an_error() {
        let result = select_cells(&cells(), &["ubuntu-20.04".to_string()]);
        assert!(matches!(result, Err(GantryError::CellSelectorInvalid(_))));
    }
}
