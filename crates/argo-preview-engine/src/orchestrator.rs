//! Per-application orchestration
//!
//! For each application:
//!
//! ```text
//! classify ─▶ [multi: validate] ─▶ build refs ─▶ per source: substitute checkout
//!                                                  └▶ [local Git: prepare dependencies]
//!          ─▶ generate (once)
//! ```
//!
//! The first error ends the application; nothing is retried and no partial
//! manifest list is returned. Sources are processed strictly in declaration
//! order, so the dependency build of one source has finished before the next
//! source is looked at.

use argo_preview_core::{
    Application, DependencyFailurePolicy, RefSources, ValidationError, build_ref_sources,
    validate_sources,
};
use argo_preview_repo::{
    DependencyBuilder, DependencyOutcome, DependencyPreparer, HelmDependencyBuilder,
    LocalRepoDetector, NoLocalRepos,
};
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::generator::{GenerateRequest, Manifest, ManifestGenerator, ResolvedSource};
use crate::helm::HelmGenerator;

/// Manifests produced for one application
#[derive(Debug, Clone)]
pub struct RenderedApplication {
    pub name: String,
    pub manifests: Vec<Manifest>,
    /// Dependency build failures demoted to warnings
    pub warnings: Vec<String>,
}

/// Validate a multi-source application and build its reference map
///
/// Single-source applications cannot reference themselves, so they get an
/// empty map without validation.
pub fn resolve_references(app: &Application) -> std::result::Result<RefSources, ValidationError> {
    if !app.has_multiple_sources() {
        return Ok(RefSources::new());
    }

    let sources = app.sources();
    validate_sources(sources)?;
    Ok(build_ref_sources(sources))
}

/// Orchestrator builder
pub struct OrchestratorBuilder {
    detector: Arc<dyn LocalRepoDetector>,
    dependency_builder: Arc<dyn DependencyBuilder>,
    generator: Arc<dyn ManifestGenerator>,
    dependency_policy: DependencyFailurePolicy,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            detector: Arc::new(NoLocalRepos),
            dependency_builder: Arc::new(HelmDependencyBuilder::default()),
            generator: Arc::new(HelmGenerator::default()),
            dependency_policy: DependencyFailurePolicy::default(),
        }
    }

    /// Set how local checkouts are found
    pub fn detector(mut self, detector: Arc<dyn LocalRepoDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Set the tool that materializes chart dependencies
    pub fn dependency_builder(mut self, builder: Arc<dyn DependencyBuilder>) -> Self {
        self.dependency_builder = builder;
        self
    }

    /// Set the manifest generator
    pub fn generator(mut self, generator: Arc<dyn ManifestGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Set what a failed dependency build does to the application
    pub fn dependency_policy(mut self, policy: DependencyFailurePolicy) -> Self {
        self.dependency_policy = policy;
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> Orchestrator {
        Orchestrator {
            detector: self.detector,
            preparer: DependencyPreparer::new(self.dependency_builder),
            generator: self.generator,
            dependency_policy: self.dependency_policy,
        }
    }
}

/// Drives one application from definition to manifests
///
/// Holds no per-application state, so one orchestrator can render many
/// applications concurrently.
pub struct Orchestrator {
    detector: Arc<dyn LocalRepoDetector>,
    preparer: DependencyPreparer,
    generator: Arc<dyn ManifestGenerator>,
    dependency_policy: DependencyFailurePolicy,
}

impl Orchestrator {
    /// Create a builder
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Render one application
    pub async fn render(&self, app: &Application) -> Result<RenderedApplication> {
        let sources = app.sources();
        if sources.is_empty() {
            return Err(EngineError::NoSources {
                app: app.name().to_string(),
            });
        }

        tracing::debug!(
            app = app.name(),
            sources = sources.len(),
            multi_source = app.has_multiple_sources(),
            "classified application"
        );

        // Fails before any filesystem or subprocess work
        let ref_sources = resolve_references(app)?;

        let mut resolved = Vec::with_capacity(sources.len());
        let mut warnings = Vec::new();

        for (index, source) in sources.iter().enumerate() {
            let checkout = self.detector.detect(&source.repo_url).map_err(|e| {
                EngineError::LocalCheckout {
                    index,
                    repo_url: source.repo_url.clone(),
                    source: e,
                }
            })?;

            let repo_url = match &checkout {
                Some(checkout) => {
                    tracing::debug!(
                        app = app.name(),
                        index,
                        repo = %source.repo_url,
                        path = %checkout.path.display(),
                        "using local checkout"
                    );
                    checkout.file_url()
                }
                None => source.repo_url.clone(),
            };

            match self.preparer.prepare_source(source, checkout.as_ref()).await {
                Ok(DependencyOutcome::Built { declared }) => {
                    tracing::debug!(app = app.name(), index, declared, "chart dependencies built");
                }
                Ok(outcome) => {
                    tracing::trace!(app = app.name(), index, ?outcome, "dependency preparation");
                }
                Err(err) => match self.dependency_policy {
                    DependencyFailurePolicy::Fail => {
                        return Err(EngineError::DependencyBuild { index, source: err });
                    }
                    DependencyFailurePolicy::Warn => {
                        tracing::warn!(
                            app = app.name(),
                            index,
                            "{}; continuing, templating will report missing dependencies",
                            err
                        );
                        warnings.push(format!("source at index {}: {}", index, err));
                    }
                },
            }

            resolved.push(ResolvedSource {
                index,
                source: source.clone(),
                repo_url,
                checkout,
            });
        }

        let request = GenerateRequest {
            app_name: app.name().to_string(),
            project: app.spec.project.clone(),
            namespace: app.destination_namespace().to_string(),
            sources: resolved,
            ref_sources,
        };

        let manifests = self.generator.generate(&request).await?;

        tracing::debug!(app = app.name(), manifests = manifests.len(), "generated");

        Ok(RenderedApplication {
            name: app.name().to_string(),
            manifests,
            warnings,
        })
    }
}
