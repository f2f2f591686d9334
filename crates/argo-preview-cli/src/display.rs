//! Display formatting for CLI output
//!
//! Manifests go to stdout; progress, warnings and failures go to stderr so
//! the rendered stream can be piped straight into other tools.

use argo_preview_engine::{EngineError, Manifest, RenderedApplication};
use console::style;

use crate::error::{CliError, engine_exit_code};
use crate::exit_codes;

/// Outcome of processing a batch of applications
#[derive(Debug, Default)]
pub struct RunSummary {
    succeeded: usize,
    /// Name and exit code of each failed application, in input order
    failed: Vec<(String, i32)>,
    warnings: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, warnings: usize) {
        self.succeeded += 1;
        self.warnings += warnings;
    }

    pub fn record_failure(&mut self, name: &str, exit_code: i32) {
        self.failed.push((name.to_string(), exit_code));
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    /// Exit code of the first failed application
    pub fn exit_code(&self) -> i32 {
        self.failed
            .first()
            .map(|(_, code)| *code)
            .unwrap_or(exit_codes::SUCCESS)
    }

    /// Print the closing line
    pub fn print(&self, verb: &str) {
        eprintln!();
        if self.failed.is_empty() {
            let warnings = if self.warnings > 0 {
                format!(" with {} warning(s)", self.warnings)
            } else {
                String::new()
            };
            eprintln!(
                "{} {} {} application(s){}",
                style("✓").green().bold(),
                verb,
                self.succeeded,
                warnings
            );
        } else {
            let names: Vec<_> = self.failed.iter().map(|(name, _)| name.as_str()).collect();
            eprintln!(
                "{} {} of {} application(s) failed: {}",
                style("✗").red().bold(),
                self.failed.len(),
                self.total(),
                names.join(", ")
            );
        }
    }

    /// Turn failures into the command's error
    pub fn into_result(self) -> Result<(), CliError> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(CliError::ApplicationsFailed {
                failed: self.failed.len(),
                total: self.total(),
                exit_code: self.exit_code(),
            })
        }
    }
}

/// Report one application that failed; returns its exit code
pub fn print_failure(name: &str, err: EngineError) -> i32 {
    let code = engine_exit_code(&err);
    report_failure(name, miette::Report::new(err));
    code
}

/// Report an application that rendered but could not be written out
pub fn print_output_failure(name: &str, err: CliError) -> i32 {
    let code = err.exit_code();
    report_failure(name, miette::Report::new(err));
    code
}

fn report_failure(name: &str, report: miette::Report) {
    eprintln!("{} {}", style("✗").red(), style(name).bold());
    eprintln!("{:?}", report);
}

/// Report warnings of an application that still rendered
pub fn print_warnings(app: &RenderedApplication) {
    for warning in &app.warnings {
        eprintln!(
            "  {} {}: {}",
            style("⚠").yellow(),
            style(&app.name).bold(),
            warning
        );
    }
}

/// Print an application's manifests to stdout
pub fn print_manifests(app: &RenderedApplication) {
    for manifest in &app.manifests {
        println!("---");
        println!(
            "{}",
            style(format!("# Source: {}", source_label(&app.name, manifest))).dim()
        );
        println!("{}", manifest.content.trim_end());
    }
}

fn source_label(app: &str, manifest: &Manifest) -> String {
    format!(
        "{}/sources[{}]/{}/{}",
        app,
        manifest.source_index,
        manifest.kind.as_deref().unwrap_or("Unknown"),
        manifest.name.as_deref().unwrap_or("unnamed")
    )
}

/// File name for a manifest written with `--output-dir`
///
/// `position` keeps files in render order when listed alphabetically.
pub fn manifest_file_name(position: usize, manifest: &Manifest) -> String {
    format!(
        "{:03}-{}-{}.yaml",
        position,
        sanitize(manifest.kind.as_deref().unwrap_or("unknown")),
        sanitize(manifest.name.as_deref().unwrap_or("unnamed"))
    )
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_file_name() {
        let manifest = Manifest::new(
            0,
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: guestbook-ui\n",
        );
        assert_eq!(
            manifest_file_name(0, &manifest),
            "000-deployment-guestbook-ui.yaml"
        );

        let odd = Manifest::new(1, "kind: ClusterRole\nmetadata:\n  name: system:metrics\n");
        assert_eq!(
            manifest_file_name(12, &odd),
            "012-clusterrole-system-metrics.yaml"
        );

        let opaque = Manifest::new(2, "just text");
        assert_eq!(manifest_file_name(3, &opaque), "003-unknown-unnamed.yaml");
    }

    #[test]
    fn test_source_label() {
        let manifest = Manifest::new(1, "kind: Service\nmetadata:\n  name: web\n");
        assert_eq!(
            source_label("guestbook", &manifest),
            "guestbook/sources[1]/Service/web"
        );
    }

    #[test]
    fn test_summary_exit_code() {
        let mut summary = RunSummary::new();
        summary.record_success(1);
        assert_eq!(summary.exit_code(), exit_codes::SUCCESS);
        assert!(RunSummary::new().into_result().is_ok());

        summary.record_failure("broken", exit_codes::VALIDATION_ERROR);
        summary.record_failure("other", exit_codes::GENERATION_ERROR);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.exit_code(), exit_codes::VALIDATION_ERROR);

        let err = summary.into_result().unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_ERROR);
        assert_eq!(err.to_string(), "2 of 3 application(s) failed");
    }
}
