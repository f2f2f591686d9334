//! Chart metadata (dependency declarations only)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Chart metadata file name
pub const CHART_FILE: &str = "Chart.yaml";

/// Legacy (apiVersion v1) dependency file
pub const REQUIREMENTS_FILE: &str = "requirements.yaml";

/// Directory dependencies are materialized into
pub const SUBCHARTS_DIR: &str = "charts";

/// A dependency entry of `Chart.yaml`
///
/// Only `name` is interpreted; the rest is handed to the dependency build
/// tool as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartDependency {
    pub name: String,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default)]
    pub alias: Option<String>,

    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DependencyFile {
    #[serde(default)]
    dependencies: Option<Vec<ChartDependency>>,
}

/// Declared dependencies of a chart directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartDependencySpec {
    pub dependencies: Vec<ChartDependency>,
}

impl ChartDependencySpec {
    /// Load the dependency declarations of a chart directory
    ///
    /// Returns `Ok(None)` when the directory holds no `Chart.yaml`. A chart
    /// that declares nothing in `Chart.yaml` falls back to
    /// `requirements.yaml`.
    pub fn load<P: AsRef<Path>>(chart_dir: P) -> Result<Option<Self>> {
        let chart_dir = chart_dir.as_ref();
        let chart_file = chart_dir.join(CHART_FILE);

        if !chart_file.is_file() {
            return Ok(None);
        }

        let mut dependencies = read_dependencies(&chart_file)?;

        if dependencies.is_empty() {
            let requirements = chart_dir.join(REQUIREMENTS_FILE);
            if requirements.is_file() {
                dependencies = read_dependencies(&requirements)?;
            }
        }

        Ok(Some(Self { dependencies }))
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.name.as_str())
    }
}

fn read_dependencies(path: &Path) -> Result<Vec<ChartDependency>> {
    let content = std::fs::read_to_string(path)?;

    // An empty file deserializes to null
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let file: DependencyFile =
        serde_yaml::from_str(&content).map_err(|e| CoreError::InvalidChart {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    Ok(file.dependencies.unwrap_or_default())
}
