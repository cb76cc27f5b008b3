//! Matrix expansion
//!
//! A pipeline's matrix is the cross product of operating-system labels and
//! version labels. Each combination is one cell, executed as an independent
//! run that shares nothing with its siblings except the cache store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Matrix axes from the pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Matrix {
    /// Operating-system labels (e.g. "ubuntu-20.04")
    pub os: Vec<String>,

    /// Version labels (e.g. "3.8")
    pub version: Vec<String>,
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            os: vec![std::env::consts::OS.to_string()],
            version: vec!["default".to_string()],
        }
    }
}

impl Matrix {
    /// Expand the matrix into cells, os-major order
    pub fn cells(&self) -> Vec<MatrixCell> {
        let mut cells = Vec::with_capacity(self.os.len() * self.version.len());
        for os in &self.os {
            for version in &self.version {
                cells.push(MatrixCell {
                    os: os.clone(),
                    version: version.clone(),
                });
            }
        }
        cells
    }

    /// The cell that `gate = "first"` steps are pinned to
    pub fn first_cell(&self) -> Option<MatrixCell> {
        self.cells().into_iter().next()
    }
}

/// One concrete (operating system, version) combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixCell {
    /// Operating-system label, also the platform half of the cache key
    pub os: String,
    /// Version label
    pub version: String,
}

impl MatrixCell {
    /// Human-readable cell label ("os/version")
    pub fn label(&self) -> String {
        format!("{}/{}", self.os, self.version)
    }

    /// Directory name for this cell's run state ("os-version")
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.os, self.version)
    }
}

impl fmt::Display for MatrixCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.version)
    }
}

/// Cell selector parsed from "OS/VERSION" (used by `--cell` and step gates)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSelector {
    pub os: String,
    pub version: String,
}

impl CellSelector {
    /// Whether this selector names the given cell
    pub fn matches(&self, cell: &MatrixCell) -> bool {
        self.os == cell.os && self.version == cell.version
    }
}

impl FromStr for CellSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((os, version)) if !os.is_empty() && !version.is_empty() => Ok(Self {
                os: os.to_string(),
                version: version.to_string(),
            }),
            _ => Err(format!("invalid cell selector \"{s}\": expected OS/VERSION")),
        }
    }
}

impl fmt::Display for CellSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(os: &[&str], version: &[&str]) -> Matrix {
        Matrix {
            os: os.iter().map(|s| s.to_string()).collect(),
            version: version.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn cells_cross_product() {
        let m = matrix(&["ubuntu-20.04", "macos-11"], &["3.7", "3.8"]);
        let cells = m.cells();

        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].label(), "ubuntu-20.04/3.7");
        assert_eq!(cells[1].label(), "ubuntu-20.04/3.8");
        assert_eq!(cells[3].label(), "macos-11/3.8");
    }

    #[test]
    fn first_cell_is_stable() {
        let m = matrix(&["ubuntu-20.04", "macos-11"], &["3.7", "3.8"]);
        let first = m.first_cell().unwrap();
        assert_eq!(first.label(), "ubuntu-20.04/3.7");
    }

    #[test]
    fn empty_axis_yields_no_cells() {
        let m = matrix(&[], &["3.8"]);
        assert!(m.cells().is_empty());
        assert!(m.first_cell().is_none());
    }

    #[test]
    fn cell_dir_name() {
        let cell = MatrixCell {
            os: "ubuntu-20.04".to_string(),
            version: "3.8".to_string(),
        };
        assert_eq!(cell.dir_name(), "ubuntu-20.04-3.8");
    }

    #[test]
    fn selector_parses() {
        let sel: CellSelector = "ubuntu-20.04/3.8".parse().unwrap();
        assert_eq!(sel.os, "ubuntu-20.04");
        assert_eq!(sel.version, "3.8");

        assert!("ubuntu-20.04".parse::<CellSelector>().is_err());
        assert!("/3.8".parse::<CellSelector>().is_err());
    }

    #[test]
    fn selector_matches() {
        let sel: CellSelector = "ubuntu-20.04/3.8".parse().unwrap();
        let cell = MatrixCell {
            os: "ubuntu-20.04".to_string(),
            version: "3.8".to_string(),
        };
        assert!(sel.matches(&cell));

        let other = MatrixCell {
            os: "ubuntu-20.04".to_string(),
            version: "3.7".to_string(),
        };
        assert!(!sel.matches(&other));
    }
}
