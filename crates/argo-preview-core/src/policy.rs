//! Orchestration policies shared by the engine and configuration

use serde::{Deserialize, Serialize};

/// What to do when a chart dependency build fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyFailurePolicy {
    /// Log the failure and let templating report missing dependencies (default)
    #[default]
    Warn,
    /// Abort the application
    Fail,
}

impl std::fmt::Display for DependencyFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warn => write!(f, "warn"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for DependencyFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            other => Err(format!(
                "unknown policy '{}', expected 'warn' or 'fail'",
                other
            )),
        }
    }
}
