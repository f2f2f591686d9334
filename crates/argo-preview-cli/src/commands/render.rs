//! Render command - run the full pipeline and print or write manifests

use argo_preview_core::DependencyFailurePolicy;
use argo_preview_engine::{HelmGenerator, Orchestrator, RenderedApplication};
use argo_preview_repo::{
    Credentials, DetectorChain, GitCheckout, HelmDependencyBuilder, LocalRepoDetector,
    LocalRepoMapping, NoLocalRepos, PreviewConfig, StaticLocalRepos,
};
use console::style;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::commands::load_applications;
use crate::display::{self, RunSummary};
use crate::error::CliError;

/// Everything `render` was invoked with
pub struct RenderOptions {
    pub config: Option<PathBuf>,
    pub paths: Vec<PathBuf>,
    pub app: Option<String>,
    pub helm: Option<PathBuf>,
    pub local_repos: Vec<String>,
    pub no_local: bool,
    pub on_dependency_failure: Option<DependencyFailurePolicy>,
    pub output_dir: Option<PathBuf>,
    pub jobs: usize,
}

pub async fn run(opts: RenderOptions) -> Result<(), CliError> {
    let config = load_config(opts.config.as_deref())?;
    let apps = load_applications(&opts.paths, opts.app.as_deref())?;
    if apps.is_empty() {
        return Ok(());
    }

    let orchestrator = build_orchestrator(&config, &opts).await?;

    eprintln!(
        "{} Rendering {} application(s)",
        style("→").blue(),
        apps.len()
    );

    // Results come back in input order, whatever order they finish in
    let orchestrator = &orchestrator;
    let mut results = stream::iter(apps.iter())
        .map(|app| async move { (app, orchestrator.render(app).await) })
        .buffered(opts.jobs.max(1));

    let mut summary = RunSummary::new();
    while let Some((app, result)) = results.next().await {
        match result {
            Ok(rendered) => {
                display::print_warnings(&rendered);
                let written = match &opts.output_dir {
                    Some(dir) => write_manifests(dir, &rendered),
                    None => {
                        display::print_manifests(&rendered);
                        Ok(())
                    }
                };
                match written {
                    Ok(()) => summary.record_success(rendered.warnings.len()),
                    Err(err) => {
                        let code = display::print_output_failure(app.name(), err);
                        summary.record_failure(app.name(), code);
                    }
                }
            }
            Err(err) => {
                let code = display::print_failure(app.name(), err);
                summary.record_failure(app.name(), code);
            }
        }
    }

    summary.print("Rendered");
    summary.into_result()
}

fn load_config(path: Option<&Path>) -> Result<PreviewConfig, CliError> {
    let config = match path {
        Some(path) => PreviewConfig::load_from(path)?,
        None => PreviewConfig::load()?,
    };
    Ok(config)
}

/// Assemble the orchestrator from configuration and flags; flags win
async fn build_orchestrator(
    config: &PreviewConfig,
    opts: &RenderOptions,
) -> Result<Orchestrator, CliError> {
    let helm = opts
        .helm
        .clone()
        .unwrap_or_else(|| config.helm.binary.clone());
    let policy = opts
        .on_dependency_failure
        .unwrap_or(config.dependencies.on_failure);
    let credentials = config
        .credentials
        .as_ref()
        .map(Credentials::resolve)
        .transpose()?;

    let detector: Arc<dyn LocalRepoDetector> = if opts.no_local {
        Arc::new(NoLocalRepos)
    } else {
        Arc::new(local_detectors(config, opts).await?)
    };

    let builder = HelmDependencyBuilder::new(&helm)
        .credentials(credentials.clone())
        .timeout(config.helm.dependency_build_timeout);
    let generator = HelmGenerator::new(&helm).credentials(credentials);

    tracing::debug!(helm = %helm.display(), policy = %policy, "orchestrator configured");

    Ok(Orchestrator::builder()
        .detector(detector)
        .dependency_builder(Arc::new(builder))
        .generator(Arc::new(generator))
        .dependency_policy(policy)
        .build())
}

/// Explicit mappings first, then git working trees around the inputs
async fn local_detectors(
    config: &PreviewConfig,
    opts: &RenderOptions,
) -> Result<DetectorChain, CliError> {
    let mut mappings = opts
        .local_repos
        .iter()
        .map(String::as_str)
        .map(parse_local_repo)
        .collect::<Result<Vec<_>, _>>()?;
    mappings.extend(config.local_repos.iter().cloned());

    let mut chain = DetectorChain::new();
    if !mappings.is_empty() {
        chain = chain.with(StaticLocalRepos::new(&mappings));
    }

    let mut seen = HashSet::new();
    for dir in candidate_dirs(&opts.paths) {
        match GitCheckout::discover(&dir).await {
            Ok(Some(checkout)) => {
                if seen.insert(checkout.toplevel().to_path_buf()) {
                    tracing::debug!(
                        toplevel = %checkout.toplevel().display(),
                        remote = checkout.remote_url(),
                        "local working tree available"
                    );
                    chain = chain.with(checkout);
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("skipping working-tree detection: {}", err);
                break;
            }
        }
    }

    Ok(chain)
}

/// The current directory and the directory of every input path
fn candidate_dirs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::env::current_dir().into_iter().collect();
    for path in paths {
        let dir = if path.is_dir() {
            Some(path.as_path())
        } else {
            path.parent().filter(|p| !p.as_os_str().is_empty())
        };
        if let Some(dir) = dir {
            dirs.push(dir.to_path_buf());
        }
    }
    dirs
}

/// Parse a `--local-repo URL=PATH` value
fn parse_local_repo(entry: &str) -> Result<LocalRepoMapping, CliError> {
    match entry.split_once('=') {
        Some((url, path)) if !url.trim().is_empty() && !path.trim().is_empty() => {
            Ok(LocalRepoMapping {
                repo_url: url.trim().to_string(),
                path: PathBuf::from(path.trim()),
            })
        }
        _ => Err(CliError::usage_with_help(
            format!("invalid --local-repo value '{}'", entry),
            "expected URL=PATH, e.g. --local-repo https://github.com/org/apps.git=../apps",
        )),
    }
}

/// Write one file per manifest under `<dir>/<app>/`
fn write_manifests(dir: &Path, rendered: &RenderedApplication) -> Result<(), CliError> {
    let app_dir = dir.join(&rendered.name);
    fs::create_dir_all(&app_dir)?;

    for (position, manifest) in rendered.manifests.iter().enumerate() {
        let file_path = app_dir.join(display::manifest_file_name(position, manifest));
        fs::write(&file_path, format!("{}\n", manifest.content.trim_end()))?;
    }

    eprintln!(
        "  {} {}: wrote {} manifest(s) to {}",
        style("✓").green(),
        rendered.name,
        rendered.manifests.len(),
        app_dir.display()
    );

    Ok(())
}
