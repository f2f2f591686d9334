//! Helm-backed manifest generation
//!
//! - Registry charts: `helm template <release> <chart> --repo <url>`
//! - Git directories with a `Chart.yaml`: `helm template` on the directory
//!   inside the local checkout
//! - Other Git directories: plain YAML/JSON files, read as they are
//!
//! Git sources are only rendered from local checkouts; cloning is out of
//! scope.

use argo_preview_core::{CHART_FILE, HelmSource, split_ref_token};
use argo_preview_repo::ResolvedCredentials;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::error::{EngineError, Result};
use crate::generator::{
    GenerateRequest, Manifest, ManifestGenerator, ResolvedSource, split_documents,
};

const LOCAL_CHECKOUT_HELP: &str =
    "run from inside the repository checkout, or map it with --local-repo <URL>=<PATH>";

/// Renders sources with the `helm` binary
#[derive(Debug, Clone)]
pub struct HelmGenerator {
    binary: PathBuf,
    credentials: Option<ResolvedCredentials>,
}

impl Default for HelmGenerator {
    fn default() -> Self {
        Self::new("helm")
    }
}

impl HelmGenerator {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            credentials: None,
        }
    }

    /// Credentials for registry chart repositories
    pub fn credentials(mut self, credentials: Option<ResolvedCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    async fn render_source(
        &self,
        request: &GenerateRequest,
        resolved: &ResolvedSource,
    ) -> Result<String> {
        let source = &resolved.source;
        let index = resolved.index;

        if source.is_chart() {
            let values = HelmValues::collect(request, resolved, None)?;
            let mut args = self.template_args(request, source.helm.as_ref());

            if let Some(oci) = resolved.repo_url.strip_prefix("oci://") {
                let reference = format!("oci://{}/{}", oci.trim_end_matches('/'), source.chart);
                args.push(reference.into());
            } else {
                args.push(source.chart.clone().into());
                args.push("--repo".into());
                args.push(resolved.repo_url.clone().into());
            }
            if !source.target_revision.is_empty() && source.target_revision != "HEAD" {
                args.push("--version".into());
                args.push(source.target_revision.clone().into());
            }
            if let Some(credentials) = &self.credentials {
                args.push("--username".into());
                args.push(credentials.username.clone().into());
                args.push("--password".into());
                args.push(credentials.password.clone().into());
            }
            args.extend(values.args());

            return self.run_template(index, args).await;
        }

        let Some(checkout) = &resolved.checkout else {
            return Err(EngineError::generation_with_help(
                index,
                format!("repository {} is not checked out locally", source.repo_url),
                LOCAL_CHECKOUT_HELP,
            ));
        };

        let dir = checkout.path.join(&source.path);
        if !dir.is_dir() {
            return Err(EngineError::generation(
                index,
                format!(
                    "path '{}' does not exist in {}",
                    source.path,
                    checkout.path.display()
                ),
            ));
        }

        if dir.join(CHART_FILE).is_file() {
            let values = HelmValues::collect(request, resolved, Some(&dir))?;
            let mut args = self.template_args(request, source.helm.as_ref());
            args.push(dir.into_os_string());
            args.extend(values.args());
            self.run_template(index, args).await
        } else {
            let recurse = source.directory.as_ref().is_some_and(|d| d.recurse);
            read_directory(index, &dir, recurse)
        }
    }

    fn template_args(&self, request: &GenerateRequest, helm: Option<&HelmSource>) -> Vec<OsString> {
        let release = helm
            .and_then(|h| h.release_name.as_deref())
            .filter(|r| !r.is_empty())
            .unwrap_or(request.app_name.as_str());

        vec![
            "template".into(),
            release.into(),
            "--namespace".into(),
            request.namespace.clone().into(),
            "--include-crds".into(),
        ]
    }

    async fn run_template(&self, index: usize, args: Vec<OsString>) -> Result<String> {
        tracing::debug!("Executing: {}", command_line(&self.binary, &args));

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                EngineError::generation_with_help(
                    index,
                    format!("failed to run {}: {}", self.binary.display(), e),
                    "install helm or point --helm at the binary",
                )
            })?;

        if !output.status.success() {
            return Err(EngineError::generation(
                index,
                format!(
                    "helm template failed ({}): {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Printable command line with the `--password` value masked
fn command_line(binary: &Path, args: &[OsString]) -> String {
    let mut parts = vec![binary.display().to_string()];
    let mut mask_next = false;
    for arg in args {
        let arg = arg.to_string_lossy();
        if mask_next {
            parts.push("<redacted>".to_string());
        } else {
            parts.push(arg.to_string());
        }
        mask_next = arg == "--password";
    }
    parts.join(" ")
}

#[async_trait]
impl ManifestGenerator for HelmGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<Manifest>> {
        let mut manifests = Vec::new();

        for resolved in &request.sources {
            if resolved.source.is_ref_only() {
                tracing::trace!(index = resolved.index, "skipping ref-only source");
                continue;
            }

            let text = self.render_source(request, resolved).await?;
            manifests.extend(
                split_documents(&text)
                    .into_iter()
                    .map(|doc| Manifest::new(resolved.index, doc)),
            );
        }

        Ok(manifests)
    }
}

/// `-f` arguments for one `helm template` call
///
/// Inline values are written to a temporary file that lives as long as this
/// value.
#[derive(Debug)]
struct HelmValues {
    files: Vec<PathBuf>,
    inline: Option<NamedTempFile>,
}

impl HelmValues {
    fn collect(
        request: &GenerateRequest,
        resolved: &ResolvedSource,
        chart_dir: Option<&Path>,
    ) -> Result<Self> {
        let index = resolved.index;
        let Some(helm) = resolved.source.helm.as_ref() else {
            return Ok(Self {
                files: Vec::new(),
                inline: None,
            });
        };

        let mut files = Vec::with_capacity(helm.value_files.len());
        for value_file in &helm.value_files {
            let path = resolve_value_file(request, index, chart_dir, value_file)?;
            // registry charts read plain entries from inside the chart archive
            let on_disk = chart_dir.is_some() || split_ref_token(value_file).is_some();
            if !on_disk || path_exists(&path) {
                files.push(path);
            } else if helm.ignore_missing_value_files {
                tracing::debug!(index, file = %path.display(), "ignoring missing value file");
            } else {
                return Err(EngineError::generation(
                    index,
                    format!("value file {} not found", path.display()),
                ));
            }
        }

        let inline = inline_values(index, helm)?;

        Ok(Self { files, inline })
    }

    fn args(&self) -> Vec<OsString> {
        let inline = self.inline.as_ref().map(NamedTempFile::path);
        let mut args = Vec::new();
        for file in self.files.iter().map(PathBuf::as_path).chain(inline) {
            args.push(OsString::from("-f"));
            args.push(file.as_os_str().to_os_string());
        }
        args
    }
}

/// Remote value files are handed to helm unchecked
fn path_exists(path: &Path) -> bool {
    path.to_string_lossy().contains("://") || path.exists()
}

/// Where a `helm.valueFiles` entry lives on disk
///
/// `$ref/path` entries resolve into the local checkout of the referenced
/// repository. Plain entries are relative to the chart directory, or passed
/// through unchanged and unchecked for registry charts.
fn resolve_value_file(
    request: &GenerateRequest,
    index: usize,
    chart_dir: Option<&Path>,
    value_file: &str,
) -> Result<PathBuf> {
    let Some((key, relative)) = split_ref_token(value_file) else {
        return Ok(match chart_dir {
            Some(dir) if !value_file.contains("://") => dir.join(value_file),
            _ => PathBuf::from(value_file),
        });
    };

    let Some(target) = request.ref_sources.get(key) else {
        return Err(EngineError::generation_with_help(
            index,
            format!(
                "value file {} references unknown source {}",
                value_file,
                key
            ),
            format!(
                "declare a source with `ref: {}`",
                key.trim_start_matches('$')
            ),
        ));
    };

    if !target.chart.is_empty() {
        return Err(EngineError::generation(
            index,
            format!(
                "value file {} references chart source {}; only Git sources can provide value files",
                value_file, key
            ),
        ));
    }

    let Some(checkout) = request.checkout_for(&target.repo_url) else {
        return Err(EngineError::generation_with_help(
            index,
            format!(
                "repository {} referenced by {} is not checked out locally",
                target.repo_url, key
            ),
            LOCAL_CHECKOUT_HELP,
        ));
    };

    Ok(checkout.path.join(relative))
}

fn inline_values(index: usize, helm: &HelmSource) -> Result<Option<NamedTempFile>> {
    let content = match (&helm.values_object, &helm.values) {
        (Some(object), _) => serde_yaml::to_string(object).map_err(|e| {
            EngineError::generation(index, format!("invalid helm.valuesObject: {}", e))
        })?,
        (None, Some(values)) if !values.trim().is_empty() => values.clone(),
        _ => return Ok(None),
    };

    let mut file = tempfile::Builder::new()
        .prefix("argo-preview-values-")
        .suffix(".yaml")
        .tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;

    Ok(Some(file))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Concatenate the YAML and JSON files of a plain directory source
fn read_directory(index: usize, dir: &Path, recurse: bool) -> Result<String> {
    let walker = WalkDir::new(dir)
        .max_depth(if recurse { usize::MAX } else { 1 })
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    let mut documents = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| EngineError::generation(index, e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let content = match extension {
            "yaml" | "yml" => std::fs::read_to_string(path)?,
            "json" => {
                let raw = std::fs::read_to_string(path)?;
                let value: serde_yaml::Value = serde_json::from_str(&raw).map_err(|e| {
                    EngineError::generation(index, format!("{}: {}", path.display(), e))
                })?;
                serde_yaml::to_string(&value).map_err(|e| {
                    EngineError::generation(index, format!("{}: {}", path.display(), e))
                })?
            }
            _ => continue,
        };

        tracing::trace!(index, file = %path.display(), "read manifest file");
        documents.push(content);
    }

    if documents.is_empty() {
        tracing::warn!(index, dir = %dir.display(), "directory source contains no manifests");
    }

    Ok(documents.join("\n---\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argo_preview_core::application::DirectorySource;
    use argo_preview_core::{RefSources, RefTarget, Source};
    use argo_preview_repo::LocalCheckout;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn resolved(index: usize, source: Source, checkout: Option<&Path>) -> ResolvedSource {
        let checkout = checkout.map(LocalCheckout::new);
        ResolvedSource {
            index,
            repo_url: checkout
                .as_ref()
                .map(LocalCheckout::file_url)
                .unwrap_or_else(|| source.repo_url.clone()),
            source,
            checkout,
        }
    }

    fn request(sources: Vec<ResolvedSource>, ref_sources: RefSources) -> GenerateRequest {
        GenerateRequest {
            app_name: "guestbook".to_string(),
            project: "default".to_string(),
            namespace: "default".to_string(),
            sources,
            ref_sources,
        }
    }

    fn git(path: &str) -> Source {
        Source {
            repo_url: "https://example.com/org/apps.git".to_string(),
            path: path.to_string(),
            target_revision: "HEAD".to_string(),
            ..Default::default()
        }
    }

    fn values_ref(name: &str, repo: &str) -> RefSources {
        let mut refs = RefSources::new();
        refs.insert(
            format!("${}", name),
            RefTarget {
                repo_url: repo.to_string(),
                target_revision: "HEAD".to_string(),
                chart: String::new(),
            },
        );
        refs
    }

    #[tokio::test]
    async fn test_plain_directory_source() {
        let repo = TempDir::new().unwrap();
        write(
            repo.path(),
            "guestbook/b-service.yaml",
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: guestbook-ui\n",
        );
        write(
            repo.path(),
            "guestbook/a-deployment.yml",
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: guestbook-ui\n",
        );
        write(
            repo.path(),
            "guestbook/c-config.json",
            r#"{"apiVersion": "v1", "kind": "ConfigMap", "metadata": {"name": "settings"}}"#,
        );
        write(repo.path(), "guestbook/README.md", "# not a manifest\n");
        write(
            repo.path(),
            "guestbook/nested/extra.yaml",
            "apiVersion: v1\nkind: Secret\nmetadata:\n  name: extra\n",
        );

        let generator = HelmGenerator::default();
        let request = request(
            vec![resolved(0, git("guestbook"), Some(repo.path()))],
            RefSources::new(),
        );

        let manifests = generator.generate(&request).await.unwrap();
        let kinds: Vec<_> = manifests.iter().filter_map(|m| m.kind.as_deref()).collect();
        assert_eq!(kinds, vec!["Deployment", "Service", "ConfigMap"]);
        assert!(manifests.iter().all(|m| m.source_index == 0));
    }

    #[tokio::test]
    async fn test_recursive_directory_source() {
        let repo = TempDir::new().unwrap();
        write(
            repo.path(),
            "app/top.yaml",
            "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: app\n",
        );
        write(
            repo.path(),
            "app/nested/extra.yaml",
            "apiVersion: v1\nkind: Secret\nmetadata:\n  name: extra\n",
        );
        write(repo.path(), "app/.hidden/skip.yaml", "kind: Secret\n");

        let mut source = git("app");
        source.directory = Some(DirectorySource { recurse: true });

        let manifests = HelmGenerator::default()
            .generate(&request(
                vec![resolved(0, source, Some(repo.path()))],
                RefSources::new(),
            ))
            .await
            .unwrap();

        let names: Vec<_> = manifests.iter().filter_map(|m| m.name.as_deref()).collect();
        assert_eq!(names, vec!["extra", "app"]);
    }

    #[tokio::test]
    async fn test_ref_only_sources_are_skipped() {
        let repo = TempDir::new().unwrap();
        write(
            repo.path(),
            "manifests/cm.yaml",
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm\n",
        );

        let mut values = git("");
        values.ref_name = "values".to_string();

        let manifests = HelmGenerator::default()
            .generate(&request(
                vec![
                    resolved(0, values, Some(repo.path())),
                    resolved(1, git("manifests"), Some(repo.path())),
                ],
                values_ref("values", "https://example.com/org/apps.git"),
            ))
            .await
            .unwrap();

        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].source_index, 1);
    }

    #[tokio::test]
    async fn test_git_source_without_checkout() {
        let req = request(vec![resolved(0, git("guestbook"), None)], RefSources::new());
        let err = HelmGenerator::default()
            .generate(&req)
            .await
            .unwrap_err();

        match err {
            EngineError::Generation { index, message, help } => {
                assert_eq!(index, 0);
                assert!(message.contains("not checked out locally"));
                assert!(help.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_path_in_checkout() {
        let repo = TempDir::new().unwrap();
        let err = HelmGenerator::default()
            .generate(&request(
                vec![resolved(0, git("does-not-exist"), Some(repo.path()))],
                RefSources::new(),
            ))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("does-not-exist"));
    }

    #[test]
    fn test_ref_value_file_resolves_into_checkout() {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "configs/grafana-values.yaml", "replicas: 2\n");

        let grafana = Source {
            repo_url: "https://grafana.github.io/helm-charts".to_string(),
            chart: "grafana".to_string(),
            target_revision: "6.0.0".to_string(),
            helm: Some(HelmSource {
                value_files: vec!["$values/configs/grafana-values.yaml".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut values = git("");
        values.ref_name = "values".to_string();

        let req = request(
            vec![
                resolved(0, grafana, None),
                resolved(1, values, Some(repo.path())),
            ],
            values_ref("values", "https://example.com/org/apps.git"),
        );

        let collected = HelmValues::collect(&req, &req.sources[0], None).unwrap();
        assert_eq!(
            collected.files,
            vec![repo.path().join("configs/grafana-values.yaml")]
        );
        assert_eq!(collected.args().len(), 2);
    }

    #[test]
    fn test_unknown_ref_value_file() {
        let req = request(vec![], RefSources::new());
        let err = resolve_value_file(&req, 2, None, "$missing/values.yaml").unwrap_err();
        assert!(err.to_string().contains("source at index 2"));
        assert!(err.to_string().contains("unknown source $missing"));
    }

    #[test]
    fn test_chart_ref_value_file_rejected() {
        let mut refs = RefSources::new();
        refs.insert(
            "$chart".to_string(),
            RefTarget {
                repo_url: "https://charts.example.com".to_string(),
                target_revision: "1.0.0".to_string(),
                chart: "redis".to_string(),
            },
        );
        let req = request(vec![], refs);
        let err = resolve_value_file(&req, 0, None, "$chart/values.yaml").unwrap_err();
        assert!(err.to_string().contains("only Git sources"));
    }

    #[test]
    fn test_ref_without_local_checkout() {
        let req = request(
            vec![],
            values_ref("values", "https://example.com/org/apps.git"),
        );
        let err = resolve_value_file(&req, 0, None, "$values/a.yaml").unwrap_err();
        assert!(err.to_string().contains("not checked out locally"));
    }

    #[test]
    fn test_plain_value_files_relative_to_chart() {
        let req = request(vec![], RefSources::new());
        let chart_dir = Path::new("/work/apps/helm-guestbook");

        assert_eq!(
            resolve_value_file(&req, 0, Some(chart_dir), "values-prod.yaml").unwrap(),
            chart_dir.join("values-prod.yaml")
        );
        assert_eq!(
            resolve_value_file(&req, 0, Some(chart_dir), "https://example.com/values.yaml")
                .unwrap(),
            PathBuf::from("https://example.com/values.yaml")
        );
    }

    #[test]
    fn test_missing_value_files() {
        let chart = TempDir::new().unwrap();
        let mut source = git("chart");
        source.helm = Some(HelmSource {
            value_files: vec!["missing.yaml".to_string()],
            ..Default::default()
        });

        let req = request(
            vec![resolved(0, source.clone(), Some(chart.path()))],
            RefSources::new(),
        );
        let err = HelmValues::collect(&req, &req.sources[0], Some(chart.path())).unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));

        if let Some(helm) = source.helm.as_mut() {
            helm.ignore_missing_value_files = true;
        }
        let req = request(
            vec![resolved(0, source, Some(chart.path()))],
            RefSources::new(),
        );
        let collected = HelmValues::collect(&req, &req.sources[0], Some(chart.path())).unwrap();
        assert!(collected.files.is_empty());
    }

    #[test]
    fn test_registry_chart_plain_value_files_unchecked() {
        let chart = Source {
            repo_url: "https://charts.example.com".to_string(),
            chart: "redis".to_string(),
            target_revision: "1.0.0".to_string(),
            helm: Some(HelmSource {
                value_files: vec!["values-production.yaml".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        };

        let req = request(vec![resolved(0, chart, None)], RefSources::new());
        let collected = HelmValues::collect(&req, &req.sources[0], None).unwrap();
        assert_eq!(
            collected.files,
            vec![PathBuf::from("values-production.yaml")]
        );
    }

    #[test]
    fn test_command_line_masks_password() {
        let args: Vec<OsString> = [
            "template",
            "reg",
            "redis",
            "--username",
            "bot",
            "--password",
            "hunter2-SECRET",
            "-f",
            "values.yaml",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        let line = command_line(Path::new("/usr/bin/helm"), &args);
        assert!(!line.contains("hunter2-SECRET"));
        assert_eq!(
            line,
            "/usr/bin/helm template reg redis --username bot --password <redacted> -f values.yaml"
        );
    }

    #[test]
    fn test_inline_values_written_to_file() {
        let helm = HelmSource {
            values_object: Some(serde_json::json!({"replicaCount": 3})),
            values: Some("ignored: true\n".to_string()),
            ..Default::default()
        };

        let file = inline_values(0, &helm).unwrap().unwrap();
        let written = std::fs::read_to_string(file.path()).unwrap();
        assert!(written.contains("replicaCount: 3"));
        assert!(!written.contains("ignored"));

        assert!(inline_values(0, &HelmSource::default()).unwrap().is_none());
    }
}
