//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Application definition not found: {path}")]
    NotFound { path: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid chart metadata in {path}: {message}")]
    InvalidChart { path: String, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejection of a multi-source application before any work is done for it
///
/// Indices are positions in the application's `sources` list (0-based).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("source at index {index} has an empty repoURL")]
    EmptyRepoUrl { index: usize },

    #[error(
        "all Git repository sources must use the same repository: \
         source at index {baseline_index} uses {baseline_repo}, \
         source at index {index} uses {repo}"
    )]
    DivergentRepositories {
        baseline_index: usize,
        baseline_repo: String,
        index: usize,
        repo: String,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
