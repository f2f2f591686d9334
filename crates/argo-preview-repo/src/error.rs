//! Error types for repository operations

use std::path::PathBuf;
use thiserror::Error;

/// Failures of configuration, credentials and local checkout handling
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Credentials unavailable: {message}")]
    AuthFailed { message: String },

    #[error("git {operation} failed: {message}")]
    GitCommand { operation: String, message: String },

    #[error("Local checkout for {repo_url} not usable: {message}")]
    LocalCheckout { repo_url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Chart dependencies could not be materialized
///
/// Carries the tool output so the failure can be diagnosed without rerunning
/// the build by hand.
#[derive(Debug, Error)]
#[error("failed to build dependencies for chart {}: {message}{}", .chart_path.display(), format_output(.output))]
pub struct DependencyBuildError {
    pub chart_path: PathBuf,
    pub message: String,
    pub output: String,
}

impl DependencyBuildError {
    pub fn new(chart_path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            chart_path: chart_path.into(),
            message: message.into(),
            output: String::new(),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }
}

fn format_output(output: &str) -> String {
    let output = output.trim();
    if output.is_empty() {
        String::new()
    } else {
        format!("\n{}", output)
    }
}

pub type Result<T> = std::result::Result<T, RepoError>;
