//! argo-preview engine - turns applications into manifests
//!
//! This crate wires the pieces of a preview together:
//! - `Orchestrator`: per-application pipeline (validate, substitute local
//!   checkouts, prepare chart dependencies, generate)
//! - `ManifestGenerator`: the rendering boundary, with `HelmGenerator` as
//!   the default implementation
//! - `EngineError`: diagnostics naming the source that failed

pub mod error;
pub mod generator;
pub mod helm;
pub mod orchestrator;

pub use error::{EngineError, Result};
pub use generator::{GenerateRequest, Manifest, ManifestGenerator, ResolvedSource, split_documents};
pub use helm::HelmGenerator;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, RenderedApplication, resolve_references};
