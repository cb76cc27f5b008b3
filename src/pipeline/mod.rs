//! Pipeline definition and execution

pub mod def;
pub mod env_file;
pub mod matrix;
pub mod runner;
pub mod summary;

pub use def::{Gate, Pipeline, StepSpec, Upstream, VcsKind};
pub use matrix::{CellSelector, Matrix, MatrixCell};
pub use runner::CellRunner;
pub use summary::{CacheOutcome, RunSummary, StepStatus};
