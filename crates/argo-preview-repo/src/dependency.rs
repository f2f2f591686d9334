//! Chart dependency preparation for locally checked-out Git charts
//!
//! Registry charts arrive pre-packaged and remote Git sources are rendered
//! from a fresh clone by the generator, so only Git charts read from a local
//! working tree need their `charts/` directory populated before templating.
//!
//! Whether dependencies are "already there" is decided by counting entries in
//! `charts/` against the declared dependencies. This is a presence check, not
//! a version check: stale archives that happen to be numerous enough are
//! accepted.

use argo_preview_core::{ChartDependencySpec, SUBCHARTS_DIR, Source};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::process::Command;

use crate::credentials::ResolvedCredentials;
use crate::error::DependencyBuildError;
use crate::local::LocalCheckout;

/// Result of a dependency preparation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyOutcome {
    /// Registry chart or remote source
    NotApplicable,
    /// No `Chart.yaml` in the source directory
    NoChart,
    /// `Chart.yaml` declares no dependencies
    NoDependencies,
    /// `charts/` already holds enough entries
    AlreadySatisfied { declared: usize, present: usize },
    /// The build tool ran successfully
    Built { declared: usize },
}

/// Materializes a chart's declared dependencies into its `charts/` directory
#[async_trait]
pub trait DependencyBuilder: Send + Sync {
    async fn build(&self, chart_dir: &Path) -> Result<(), DependencyBuildError>;
}

/// `helm dependency build <chart_dir>`
#[derive(Debug, Clone)]
pub struct HelmDependencyBuilder {
    binary: PathBuf,
    credentials: Option<ResolvedCredentials>,
    timeout: Option<Duration>,
}

impl Default for HelmDependencyBuilder {
    fn default() -> Self {
        Self::new("helm")
    }
}

impl HelmDependencyBuilder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            credentials: None,
            timeout: None,
        }
    }

    /// Inject repository credentials into the build environment
    pub fn credentials(mut self, credentials: Option<ResolvedCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Kill the build if it runs longer than `timeout`
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl DependencyBuilder for HelmDependencyBuilder {
    async fn build(&self, chart_dir: &Path) -> Result<(), DependencyBuildError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["dependency", "build"])
            .arg(chart_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(credentials) = &self.credentials {
            cmd.envs(credentials.env_vars());
        }

        tracing::debug!(
            "Executing: {} dependency build {}",
            self.binary.display(),
            chart_dir.display()
        );

        let output_future = cmd.output();
        let output = match self.timeout {
            Some(duration) => match tokio::time::timeout(duration, output_future).await {
                Ok(result) => result,
                Err(_) => return Err(timed_out(chart_dir, duration)),
            },
            None => output_future.await,
        }
        .map_err(|e| {
            DependencyBuildError::new(
                chart_dir,
                format!("failed to run {}: {}", self.binary.display(), e),
            )
        })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(DependencyBuildError::new(chart_dir, output.status.to_string())
                .with_output(combined));
        }

        Ok(())
    }
}

/// Decides when a dependency build is needed and runs it
///
/// Builds for the same chart directory are serialized, so applications
/// rendered concurrently from one checkout never write `charts/` at the same
/// time.
pub struct DependencyPreparer {
    builder: Arc<dyn DependencyBuilder>,
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl DependencyPreparer {
    pub fn new(builder: Arc<dyn DependencyBuilder>) -> Self {
        Self {
            builder,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Prepare one application source
    ///
    /// Only Git sources served from a local checkout are considered.
    pub async fn prepare_source(
        &self,
        source: &Source,
        checkout: Option<&LocalCheckout>,
    ) -> Result<DependencyOutcome, DependencyBuildError> {
        let Some(checkout) = checkout else {
            return Ok(DependencyOutcome::NotApplicable);
        };
        if source.is_chart() {
            return Ok(DependencyOutcome::NotApplicable);
        }

        let chart_dir = checkout.path.join(&source.path);
        self.ensure_dependencies(&chart_dir).await
    }

    /// Make sure the chart at `chart_dir` has its dependencies in `charts/`
    pub async fn ensure_dependencies(
        &self,
        chart_dir: &Path,
    ) -> Result<DependencyOutcome, DependencyBuildError> {
        let Some(spec) = load_spec(chart_dir)? else {
            return Ok(DependencyOutcome::NoChart);
        };
        if spec.is_empty() {
            return Ok(DependencyOutcome::NoDependencies);
        }

        let lock = self.lock_for(chart_dir);
        let _guard = lock.lock().await;

        let declared = spec.len();
        let present = count_entries(&chart_dir.join(SUBCHARTS_DIR));
        if present >= declared {
            tracing::debug!(
                chart = %chart_dir.display(),
                declared,
                present,
                "chart dependencies already present"
            );
            return Ok(DependencyOutcome::AlreadySatisfied { declared, present });
        }

        tracing::info!(
            chart = %chart_dir.display(),
            dependencies = %spec.names().collect::<Vec<_>>().join(", "),
            "building chart dependencies"
        );
        self.builder.build(chart_dir).await?;

        Ok(DependencyOutcome::Built { declared })
    }

    fn lock_for(&self, chart_dir: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(chart_dir.to_path_buf())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

fn timed_out(chart_dir: &Path, duration: Duration) -> DependencyBuildError {
    DependencyBuildError::new(chart_dir, format!("timed out after {:?}", duration))
}

fn load_spec(chart_dir: &Path) -> Result<Option<ChartDependencySpec>, DependencyBuildError> {
    ChartDependencySpec::load(chart_dir)
        .map_err(|e| DependencyBuildError::new(chart_dir, e.to_string()))
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0)
}
