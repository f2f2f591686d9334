//! CLI commands

pub mod render;
pub mod validate;

use argo_preview_core::{Application, filter_applications, load_all};
use console::style;
use std::path::PathBuf;

use crate::error::CliError;

/// Load application definitions and apply the `--app` filter
pub fn load_applications(
    paths: &[PathBuf],
    app: Option<&str>,
) -> Result<Vec<Application>, CliError> {
    let apps = load_all(paths)?;
    let total = apps.len();

    let apps = match app {
        Some(name) => filter_applications(apps, name),
        None => apps,
    };

    tracing::debug!(loaded = total, selected = apps.len(), "loaded application definitions");

    if apps.is_empty() {
        eprintln!("{} No applications found", style("⚠").yellow());
    }

    Ok(apps)
}
