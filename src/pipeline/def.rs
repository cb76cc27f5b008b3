//! Pipeline definition
//!
//! A pipeline is described by a project-local `gantry.toml`: an optional
//! upstream repository to key the cache on, the matrix axes, the cache
//! section, and an ordered list of steps.

use crate::error::{GantryError, GantryResult};
use crate::pipeline::matrix::{CellSelector, Matrix, MatrixCell};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// A complete pipeline definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pipeline {
    /// Pipeline name (defaults to the project directory name)
    pub name: Option<String>,

    /// Upstream repository whose revision keys the cache
    pub upstream: Option<Upstream>,

    /// Matrix axes
    pub matrix: Matrix,

    /// Cache gate settings
    pub cache: CacheSection,

    /// Ordered steps
    pub steps: Vec<StepSpec>,
}

/// Upstream repository section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upstream {
    /// Repository URL (anything the VCS client accepts)
    pub url: String,

    /// Reference to resolve (branch, tag, or HEAD)
    #[serde(rename = "ref", default = "default_reference")]
    pub reference: String,

    /// Version control system hosting the upstream
    #[serde(default)]
    pub vcs: VcsKind,

    /// Build options folded into the cache key
    #[serde(default)]
    pub build_options: Vec<String>,
}

fn default_reference() -> String {
    "HEAD".to_string()
}

/// Supported version control systems
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    /// Git (queried with `git ls-remote`)
    #[default]
    Git,
    /// Mercurial (queried with `hg identify`)
    Hg,
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Git => write!(f, "git"),
            Self::Hg => write!(f, "hg"),
        }
    }
}

/// Cache gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Enable the revision cache gate for this pipeline
    pub enabled: bool,

    /// Project-relative directory that gets stored and restored
    pub path: String,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "builds".to_string(),
        }
    }
}

/// One pipeline step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    /// Step name, unique within the pipeline
    pub name: String,

    /// Command as an argv vector
    pub command: Vec<String>,

    /// Working directory relative to the project (defaults to the project root)
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Extra environment variables for this step
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Whether this step produces the cached tree (skipped on a cache hit)
    #[serde(default)]
    pub cached: bool,

    /// Which matrix cells run this step
    #[serde(default)]
    pub gate: Gate,
}

impl StepSpec {
    /// Whether this step runs in the given cell
    pub fn applies_to(&self, cell: &MatrixCell, first: Option<&MatrixCell>) -> bool {
        match &self.gate {
            Gate::All => true,
            Gate::First => first.is_some_and(|f| f == cell),
            Gate::Cell(sel) => sel.matches(cell),
        }
    }
}

/// Step gate: which cells a step runs in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Gate {
    /// Run in every cell
    #[default]
    All,
    /// Run only in the first matrix cell
    First,
    /// Run only in one explicit cell
    Cell(CellSelector),
}

impl TryFrom<String> for Gate {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "all" => Ok(Self::All),
            "first" => Ok(Self::First),
            other => other.parse::<CellSelector>().map(Self::Cell),
        }
    }
}

impl From<Gate> for String {
    fn from(gate: Gate) -> Self {
        gate.to_string()
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::First => write!(f, "first"),
            Self::Cell(sel) => write!(f, "{sel}"),
        }
    }
}

impl Pipeline {
    /// Load and validate a pipeline file
    pub async fn load(path: &Path) -> GantryResult<Self> {
        if !path.exists() {
            return Err(GantryError::PipelineNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| GantryError::io(format!("reading pipeline from {}", path.display()), e))?;

        let pipeline: Pipeline =
            toml::from_str(&content).map_err(|e| GantryError::PipelineInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        pipeline.validate(path)?;
        debug!(
            "Loaded pipeline with {} steps from {}",
            pipeline.steps.len(),
            path.display()
        );
        Ok(pipeline)
    }

    fn validate(&self, path: &Path) -> GantryResult<()> {
        let invalid = |reason: String| GantryError::PipelineInvalid {
            path: path.to_path_buf(),
            reason,
        };

        if self.steps.is_empty() {
            return Err(invalid("pipeline has no steps".to_string()));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.name.is_empty() {
                return Err(invalid("step names must not be empty".to_string()));
            }
            if !seen.insert(step.name.as_str()) {
                return Err(invalid(format!("duplicate step name \"{}\"", step.name)));
            }
            if step.command.is_empty() {
                return Err(invalid(format!("step \"{}\" has an empty command", step.name)));
            }
        }

        if self.matrix.os.is_empty() || self.matrix.version.is_empty() {
            return Err(invalid(
                "matrix axes must not be empty (omit [matrix] for a single local cell)"
                    .to_string(),
            ));
        }

        if Path::new(&self.cache.path).is_absolute() {
            return Err(invalid(format!(
                "cache path \"{}\" must be project-relative",
                self.cache.path
            )));
        }

        Ok(())
    }

    /// Pipeline name, derived from the project directory if unset
    pub fn display_name(&self, project_dir: &Path) -> String {
        self.name.clone().unwrap_or_else(|| {
            project_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "pipeline".to_string())
        })
    }

    /// Whether any step is marked `cached = true`
    pub fn has_cached_steps(&self) -> bool {
        self.steps.iter().any(|s| s.cached)
    }

    /// Resolve step selectors (names or 1-based numbers) to step indexes.
    ///
    /// An empty selection means all steps, in pipeline order.
    pub fn resolve_steps(&self, selectors: &[String]) -> GantryResult<Vec<usize>> {
        if selectors.is_empty() {
            return Ok((0..self.steps.len()).collect());
        }

        let mut indexes = Vec::with_capacity(selectors.len());
        for selector in selectors {
            if selector == "all" {
                indexes.extend(0..self.steps.len());
                continue;
            }
            let index = if let Ok(number) = selector.parse::<usize>() {
                (1..=self.steps.len())
                    .contains(&number)
                    .then(|| number - 1)
            } else {
                self.steps.iter().position(|s| &s.name == selector)
            };
            match index {
                Some(i) => indexes.push(i),
                None => return Err(GantryError::StepNotFound(selector.clone())),
            }
        }
        Ok(indexes)
    }
}
