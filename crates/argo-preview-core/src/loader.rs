//! Loading application definitions from YAML files and directories

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::application::Application;
use crate::error::{CoreError, Result};

const APPLICATION_KIND: &str = "Application";

/// Load every application found at `path`
///
/// `path` may be a single (multi-document) YAML file or a directory, which
/// is walked for `.yaml`/`.yml` files in sorted order. Documents of any other
/// kind are skipped.
pub fn load_applications<P: AsRef<Path>>(path: P) -> Result<Vec<Application>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CoreError::NotFound {
            path: path.display().to_string(),
        });
    }

    let mut apps = Vec::new();
    for file in yaml_files(path) {
        apps.extend(load_file(&file)?);
    }

    Ok(apps)
}

/// Load applications from several paths, preserving argument order
pub fn load_all(paths: &[PathBuf]) -> Result<Vec<Application>> {
    let mut apps = Vec::new();
    for path in paths {
        apps.extend(load_applications(path)?);
    }
    Ok(apps)
}

/// Keep only applications named `name`; an empty name keeps everything
pub fn filter_applications(apps: Vec<Application>, name: &str) -> Vec<Application> {
    if !should_match(name) {
        return apps;
    }
    apps.into_iter().filter(|app| app.name() == name).collect()
}

fn should_match(filter: &str) -> bool {
    !filter.is_empty()
}

fn yaml_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|ext| matches!(ext.to_string_lossy().to_lowercase().as_str(), "yaml" | "yml"))
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    files
}

fn load_file(path: &Path) -> Result<Vec<Application>> {
    let content = std::fs::read_to_string(path)?;
    let parse_error = |e: serde_yaml::Error| CoreError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut apps = Vec::new();

    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = serde_yaml::Value::deserialize(document).map_err(parse_error)?;
        if value.is_null() {
            continue;
        }

        let kind = value.get("kind").and_then(|k| k.as_str()).unwrap_or_default();
        if kind != APPLICATION_KIND {
            tracing::debug!(path = %path.display(), kind, "skipping non-Application document");
            continue;
        }

        // sourceless applications are kept and rejected one by one later
        let app: Application = serde_yaml::from_value(value).map_err(parse_error)?;
        apps.push(app);
    }

    Ok(apps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TWO_APPS: &str = r#"apiVersion: argoproj.io/v1alpha1
kind: Application
metadata:
  name: app-one
spec:
  project: default
  source:
    repoURL: https://example.com/repo
    path: app1
    targetRevision: HEAD
---
apiVersion: argoproj.io/v1alpha1
kind: Application
metadata:
  name: app-two
spec:
  project: default
  source:
    repoURL: https://example.com/repo
    path: app2
    targetRevision: HEAD
"#;

    #[test]
    fn test_should_match() {
        assert!(!should_match(""));
        assert!(should_match("app-name"));
        assert!(should_match(" "));
    }

    #[test]
    fn test_load_multiple_documents() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("apps.yaml");
        fs::write(&file, TWO_APPS).unwrap();

        let apps = load_applications(&file).unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].name(), "app-one");
        assert_eq!(apps[0].sources()[0].path, "app1");
        assert_eq!(apps[1].name(), "app-two");
        assert_eq!(apps[1].sources()[0].path, "app2");
    }

    #[test]
    fn test_load_directory_skips_other_kinds() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b-apps.yml"), TWO_APPS).unwrap();
        fs::write(
            dir.path().join("a-project.yaml"),
            "apiVersion: argoproj.io/v1alpha1\nkind: AppProject\nmetadata:\n  name: default\n",
        )
        .unwrap();
        let readme = dir.path().join("README.md");
        fs::write(readme, "# not yaml").unwrap();

        let apps = load_applications(dir.path()).unwrap();
        let names: Vec<_> = apps.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["app-one", "app-two"]);
    }

    #[test]
    fn test_missing_path() {
        let err = load_applications("/nonexistent/apps.yaml").unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_application_without_source_does_not_stop_loading() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.yaml");
        fs::write(
            &file,
            format!(
                "kind: Application\nmetadata:\n  name: hollow\nspec:\n  project: default\n---\n{}",
                TWO_APPS
            ),
        )
        .unwrap();

        let apps = load_applications(&file).unwrap();
        let names: Vec<_> = apps.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["hollow", "app-one", "app-two"]);
        assert!(apps[0].sources().is_empty());
    }

    #[test]
    fn test_malformed_yaml() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("broken.yaml");
        fs::write(&file, "kind: Application\nmetadata: [unclosed\n").unwrap();

        let err = load_applications(&file).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_filter_applications() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("apps.yaml");
        fs::write(&file, TWO_APPS).unwrap();

        let apps = load_applications(&file).unwrap();
        assert_eq!(filter_applications(apps.clone(), "").len(), 2);

        let only = filter_applications(apps.clone(), "app-two");
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name(), "app-two");

        assert!(filter_applications(apps, "missing").is_empty());
    }
}
