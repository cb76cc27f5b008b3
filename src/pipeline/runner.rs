//! Cell runner
//!
//! Executes the steps of one matrix cell strictly sequentially. The first
//! non-zero exit aborts all remaining steps of the cell; there are no
//! retries and no partial-success path. The cache gate is consulted before
//! the first step and the store is written only after a fully successful
//! miss run.

use crate::cache::{CacheKey, CacheLookup, CacheStore};
use crate::error::{GantryError, GantryResult};
use crate::pipeline::def::Pipeline;
use crate::pipeline::env_file::{EnvFile, ENV_FILE_VAR};
use crate::pipeline::matrix::MatrixCell;
use crate::pipeline::summary::{CacheOutcome, RunSummary, StepReport, StepStatus};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Exit code recorded when the step binary cannot be started
const EXIT_NOT_RUNNABLE: i32 = 127;

/// Runs matrix cells for one pipeline invocation
pub struct CellRunner<'a> {
    pipeline: &'a Pipeline,
    pipeline_name: String,
    project_dir: &'a Path,
    run_root: PathBuf,
    revision: Option<String>,
    store: Option<&'a CacheStore>,
    fresh: bool,
}

impl<'a> CellRunner<'a> {
    /// Create a runner. `store` is None when the cache gate is bypassed;
    /// `fresh` skips lookups but still stores the new build.
    pub fn new(
        pipeline: &'a Pipeline,
        pipeline_name: String,
        project_dir: &'a Path,
        run_root: PathBuf,
        revision: Option<String>,
        store: Option<&'a CacheStore>,
        fresh: bool,
    ) -> Self {
        Self {
            pipeline,
            pipeline_name,
            project_dir,
            run_root,
            revision,
            store,
            fresh,
        }
    }

    /// The project-relative cache path, absolutized
    fn cache_path(&self) -> PathBuf {
        self.project_dir.join(&self.pipeline.cache.path)
    }

    fn cache_key(&self, cell: &MatrixCell) -> Option<CacheKey> {
        match (&self.revision, &self.pipeline.upstream) {
            (Some(revision), Some(upstream)) => Some(CacheKey::with_options(
                &cell.os,
                revision,
                &upstream.build_options,
            )),
            _ => None,
        }
    }

    /// Run the selected steps in one cell and write its summary
    pub async fn run_cell(
        &self,
        cell: &MatrixCell,
        step_indexes: &[usize],
    ) -> GantryResult<RunSummary> {
        let started_at = Utc::now();
        let run_dir = self.run_root.join(cell.dir_name());

        // Each invocation starts from a clean run directory
        if run_dir.exists() {
            fs::remove_dir_all(&run_dir)
                .await
                .map_err(|e| GantryError::io(format!("clearing {}", run_dir.display()), e))?;
        }
        fs::create_dir_all(&run_dir)
            .await
            .map_err(|e| GantryError::io(format!("creating {}", run_dir.display()), e))?;

        let env_file = EnvFile::create(&run_dir).await?;
        let cache_path = self.cache_path();
        let key = self.cache_key(cell);

        let outcome = match (self.store, &key) {
            (Some(store), Some(key)) => {
                if self.fresh {
                    debug!("Ignoring existing cache entry for {} (--fresh)", key);
                    CacheOutcome::Miss
                } else {
                    match store.lookup(key).await? {
                        CacheLookup::Hit => {
                            store.restore(key, &cache_path).await?;
                            CacheOutcome::Hit
                        }
                        CacheLookup::Miss => CacheOutcome::Miss,
                    }
                }
            }
            _ => CacheOutcome::Disabled,
        };
        info!("Cell {}: cache {}", cell, outcome);

        let first_cell = self.pipeline.matrix.first_cell();
        let mut file_env: Vec<(String, String)> = vec![];
        let mut reports = Vec::with_capacity(step_indexes.len());
        let mut passed_indexes = std::collections::HashSet::new();
        let mut aborted = false;

        for &index in step_indexes {
            let step = &self.pipeline.steps[index];

            if !step.applies_to(cell, first_cell.as_ref()) {
                debug!("Step {} gated away from cell {}", step.name, cell);
                reports.push(StepReport::skipped(
                    &step.name,
                    format!("gated to {}", step.gate),
                ));
                continue;
            }
            if outcome == CacheOutcome::Hit && step.cached {
                debug!("Step {} skipped, artifacts restored from cache", step.name);
                reports.push(StepReport::skipped(&step.name, "cache hit"));
                continue;
            }
            if aborted {
                reports.push(StepReport::skipped(&step.name, "earlier step failed"));
                continue;
            }

            debug!("Cell {}: running step {}", cell, step.name);
            // Numbered by pipeline position so a subset run writes the
            // same log name as a full run.
            let log_name = format!("{:02}-{}.log", index + 1, step.name);
            let started = Instant::now();

            let mut command = Command::new(&step.command[0]);
            command
                .args(&step.command[1..])
                .current_dir(match &step.workdir {
                    Some(workdir) => self.project_dir.join(workdir),
                    None => self.project_dir.to_path_buf(),
                })
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .env(ENV_FILE_VAR, env_file.path())
                .env("GANTRY_OS", &cell.os)
                .env("GANTRY_VERSION", &cell.version)
                .env(
                    "GANTRY_CACHE_HIT",
                    if outcome == CacheOutcome::Hit {
                        "true"
                    } else {
                        "false"
                    },
                )
                .env("GANTRY_CACHE_PATH", &cache_path);
            if let Some(revision) = &self.revision {
                command.env("GANTRY_REVISION", revision);
            }
            for (k, v) in &file_env {
                command.env(k, v);
            }
            for (k, v) in &step.env {
                command.env(k, v);
            }

            let (code, log_bytes) = match command.output().await {
                Ok(output) => {
                    let mut bytes = output.stdout;
                    bytes.extend_from_slice(&output.stderr);
                    (output.status.code().unwrap_or(-1), bytes)
                }
                Err(e) => (
                    EXIT_NOT_RUNNABLE,
                    format!("failed to start {}: {e}\n", step.command[0]).into_bytes(),
                ),
            };

            let log_path = run_dir.join(&log_name);
            fs::write(&log_path, &log_bytes)
                .await
                .map_err(|e| GantryError::io(format!("writing {}", log_path.display()), e))?;

            let status = if code == 0 {
                passed_indexes.insert(index);
                StepStatus::Passed
            } else {
                warn!("Cell {}: step {} exited with code {}", cell, step.name, code);
                aborted = true;
                StepStatus::Failed
            };
            reports.push(StepReport {
                name: step.name.clone(),
                status,
                exit_code: Some(code),
                duration_ms: started.elapsed().as_millis() as u64,
                log: Some(log_name),
                skip_reason: None,
            });

            // Pick up KEY=VALUE lines the step appended for later steps
            file_env = env_file.read().await?;
        }

        let passed = !aborted;

        if passed && outcome == CacheOutcome::Miss {
            if let (Some(store), Some(key)) = (self.store, &key) {
                if self.cached_steps_complete(cell, first_cell.as_ref(), &passed_indexes) {
                    store.save(key, &cache_path).await?;
                }
            }
        }

        let summary = RunSummary {
            id: Uuid::new_v4(),
            pipeline: self.pipeline_name.clone(),
            cell: cell.label(),
            os: cell.os.clone(),
            version: cell.version.clone(),
            revision: self.revision.clone(),
            cache: outcome,
            passed,
            steps: reports,
            started_at,
            finished_at: Utc::now(),
        };
        summary.write(&run_dir).await?;
        Ok(summary)
    }

    /// The store is only written when every cached step applying to this
    /// cell ran and passed in this invocation; a step subset that skipped a
    /// cached step leaves the artifact tree incomplete.
    fn cached_steps_complete(
        &self,
        cell: &MatrixCell,
        first_cell: Option<&MatrixCell>,
        passed_indexes: &std::collections::HashSet<usize>,
    ) -> bool {
        let applying: Vec<usize> = self
            .pipeline
            .steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.cached && s.applies_to(cell, first_cell))
            .map(|(i, _)| i)
            .collect();
        !applying.is_empty() && applying.iter().all(|i| passed_indexes.contains(i))
    }
}
