//! Engine error types

use argo_preview_core::ValidationError;
use argo_preview_repo::{DependencyBuildError, RepoError};
use miette::Diagnostic;
use thiserror::Error;

/// Failure to produce manifests for one application
///
/// Every variant names the source (by index in the application's source
/// list) or repository it concerns.
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error("application {app} declares no sources")]
    #[diagnostic(
        code(argo_preview::application::no_sources),
        help("set spec.source or spec.sources")
    )]
    NoSources { app: String },

    #[error(transparent)]
    #[diagnostic(
        code(argo_preview::validation),
        help("Git sources of one application share a working tree; point them at the same repoURL")
    )]
    Validation(#[from] ValidationError),

    #[error("source at index {index}: {source}")]
    #[diagnostic(code(argo_preview::dependency_build))]
    DependencyBuild {
        index: usize,
        #[source]
        source: DependencyBuildError,
    },

    #[error("source at index {index}: local checkout detection failed for {repo_url}: {source}")]
    #[diagnostic(code(argo_preview::local_checkout))]
    LocalCheckout {
        index: usize,
        repo_url: String,
        #[source]
        source: RepoError,
    },

    #[error("source at index {index}: {message}")]
    #[diagnostic(code(argo_preview::generate))]
    Generation {
        index: usize,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("IO error: {0}")]
    #[diagnostic(code(argo_preview::io))]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Generation failure for one source
    pub fn generation(index: usize, message: impl Into<String>) -> Self {
        Self::Generation {
            index,
            message: message.into(),
            help: None,
        }
    }

    /// Generation failure with a hint for the user
    pub fn generation_with_help(
        index: usize,
        message: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        Self::Generation {
            index,
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
