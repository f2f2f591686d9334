//! argo-preview core - application model and multi-source rules
//!
//! This crate provides the types the orchestrator works on:
//! - `Application` / `Source`: the parts of an Argo CD application that
//!   decide what gets rendered
//! - `RefSources`: `$ref` tokens resolved to repositories
//! - `validate_sources`: the same-repository rule for multi-source apps
//! - `ChartDependencySpec`: declared chart dependencies
//! - `load_applications`: YAML loading

pub mod application;
pub mod chart;
pub mod error;
pub mod loader;
pub mod policy;
pub mod refs;
pub mod validate;

pub use application::{Application, ApplicationSpec, Destination, HelmSource, Source};
pub use chart::{CHART_FILE, ChartDependency, ChartDependencySpec, SUBCHARTS_DIR};
pub use error::{CoreError, Result, ValidationError};
pub use loader::{filter_applications, load_all, load_applications};
pub use policy::DependencyFailurePolicy;
pub use refs::{RefSources, RefTarget, build_ref_sources, split_ref_token};
pub use validate::validate_sources;
