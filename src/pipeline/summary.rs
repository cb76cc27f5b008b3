//! Run summaries
//!
//! One JSON summary per cell run, written into the cell's run directory.

use crate::error::{GantryError, GantryResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

/// File name of the per-cell summary
pub const SUMMARY_FILE: &str = "summary.json";

/// How the cache gate resolved for a cell run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOutcome {
    /// Stored artifacts were restored; cached steps skipped
    Hit,
    /// No usable entry; the full build ran
    Miss,
    /// The gate was not consulted
    Disabled,
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "hit"),
            Self::Miss => write!(f, "miss"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// Outcome of one step within a cell run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-step record in a cell summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Step name
    pub name: String,

    /// Final status
    pub status: StepStatus,

    /// Exit code, when the step actually ran
    pub exit_code: Option<i32>,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,

    /// Log file name inside the run directory, when the step ran
    pub log: Option<String>,

    /// Why the step was skipped
    pub skip_reason: Option<String>,
}

impl StepReport {
    /// Record for a step that never ran
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Skipped,
            exit_code: None,
            duration_ms: 0,
            log: None,
            skip_reason: Some(reason.into()),
        }
    }
}

/// Summary of one cell run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run ID
    pub id: Uuid,

    /// Pipeline name
    pub pipeline: String,

    /// Cell label ("os/version")
    pub cell: String,

    /// Operating-system label
    pub os: String,

    /// Version label
    pub version: String,

    /// Upstream revision, when one was queried
    pub revision: Option<String>,

    /// Cache gate outcome
    pub cache: CacheOutcome,

    /// Whether every executed step passed
    pub passed: bool,

    /// Per-step records, in execution order
    pub steps: Vec<StepReport>,

    /// When the cell run started
    pub started_at: DateTime<Utc>,

    /// When the cell run finished
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Write the summary into a run directory
    pub async fn write(&self, run_dir: &Path) -> GantryResult<()> {
        let path = run_dir.join(SUMMARY_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .await
            .map_err(|e| GantryError::io(format!("writing summary {}", path.display()), e))?;
        Ok(())
    }

    /// Load the summary from a run directory
    pub async fn load(run_dir: &Path) -> GantryResult<Option<Self>> {
        let path = run_dir.join(SUMMARY_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| GantryError::io(format!("reading summary {}", path.display()), e))?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}
