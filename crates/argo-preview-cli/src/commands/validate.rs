//! Validate command - check multi-source rules and build reference maps
//!
//! Nothing is rendered and no subprocess is started.

use argo_preview_core::{Application, RefSources};
use argo_preview_engine::resolve_references;
use console::style;
use serde::Serialize;
use std::path::PathBuf;

use crate::commands::load_applications;
use crate::display::RunSummary;
use crate::error::CliError;
use crate::exit_codes;

const NO_SOURCES: &str = "no sources defined; set spec.source or spec.sources";

/// Validation outcome of one application
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppReport {
    name: String,
    sources: usize,
    multi_source: bool,
    valid: bool,
    #[serde(skip_serializing_if = "RefSources::is_empty")]
    refs: RefSources,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AppReport {
    fn check(app: &Application) -> Self {
        let (refs, error) = if app.sources().is_empty() {
            (RefSources::new(), Some(NO_SOURCES.to_string()))
        } else {
            match resolve_references(app) {
                Ok(refs) => (refs, None),
                Err(err) => (RefSources::new(), Some(err.to_string())),
            }
        };

        Self {
            name: app.name().to_string(),
            sources: app.sources().len(),
            multi_source: app.has_multiple_sources(),
            valid: error.is_none(),
            refs,
            error,
        }
    }

    fn print(&self) {
        match &self.error {
            None => {
                let mut detail = if self.multi_source {
                    format!("{} sources", self.sources)
                } else {
                    "single source".to_string()
                };
                if !self.refs.is_empty() {
                    let keys: Vec<_> = self.refs.keys().map(String::as_str).collect();
                    detail.push_str(&format!(", refs: {}", keys.join(", ")));
                }
                println!(
                    "  {} {} {}",
                    style("✓").green(),
                    self.name,
                    style(format!("({})", detail)).dim()
                );
            }
            Some(error) => {
                println!("  {} {}", style("✗").red(), self.name);
                println!("    {}", style(error).red());
            }
        }
    }
}

pub fn run(paths: &[PathBuf], app: Option<&str>, json_output: bool) -> Result<(), CliError> {
    let apps = load_applications(paths, app)?;
    let reports: Vec<AppReport> = apps.iter().map(AppReport::check).collect();

    let mut summary = RunSummary::new();
    for report in &reports {
        if report.valid {
            summary.record_success(0);
        } else {
            summary.record_failure(&report.name, exit_codes::VALIDATION_ERROR);
        }
    }

    if json_output {
        let output = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::Other {
                message: format!("failed to serialize report: {}", e),
            })?;
        println!("{}", output);
    } else if !reports.is_empty() {
        println!(
            "{} Validating {} application(s)",
            style("→").blue(),
            reports.len()
        );
        for report in &reports {
            report.print();
        }
        summary.print("Validated");
    }

    summary.into_result()
}
