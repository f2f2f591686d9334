//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use argo_preview_core::CoreError;
use argo_preview_engine::EngineError;
use argo_preview_repo::RepoError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Application definitions break the multi-source rules
    #[error("Validation failed: {message}")]
    #[diagnostic(code(argo_preview::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Configuration file could not be used
    #[error("Configuration error: {message}")]
    #[diagnostic(code(argo_preview::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid arguments
    #[error("{message}")]
    #[diagnostic(code(argo_preview::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// One or more applications failed; each was reported as it failed
    #[error("{failed} of {total} application(s) failed")]
    #[diagnostic(code(argo_preview::cli::failed))]
    ApplicationsFailed {
        failed: usize,
        total: usize,
        exit_code: i32,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(argo_preview::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(argo_preview::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Config { .. } => exit_codes::ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::ApplicationsFailed { exit_code, .. } => *exit_code,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { .. } | CoreError::Io(_) => CliError::Io {
                message: err.to_string(),
            },
            CoreError::Parse { .. }
            | CoreError::InvalidChart { .. }
            | CoreError::Validation(_) => CliError::Validation {
                message: err.to_string(),
                help: None,
            },
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::InvalidConfig { .. } => CliError::Config {
                message: err.to_string(),
                help: Some(
                    "expected top-level keys: helm, dependencies, localRepos, credentials"
                        .to_string(),
                ),
            },
            RepoError::Io(e) => e.into(),
            other => CliError::Other {
                message: other.to_string(),
            },
        }
    }
}

/// Exit code for an application that failed to render
pub fn engine_exit_code(err: &EngineError) -> i32 {
    match err {
        EngineError::NoSources { .. } | EngineError::Validation(_) => exit_codes::VALIDATION_ERROR,
        EngineError::Generation { .. } => exit_codes::GENERATION_ERROR,
        EngineError::DependencyBuild { .. } => exit_codes::DEPENDENCY_ERROR,
        EngineError::Io(_) => exit_codes::IO_ERROR,
        EngineError::LocalCheckout { .. } => exit_codes::ERROR,
    }
}
