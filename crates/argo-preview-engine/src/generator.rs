//! Manifest generator boundary

use argo_preview_core::{RefSources, Source};
use argo_preview_repo::LocalCheckout;
use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// A source after local checkout substitution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    /// Position in the application's source list
    pub index: usize,

    pub source: Source,

    /// Repository location to use: `file://` URL of the checkout, or the
    /// source's own `repoURL` when fetched remotely
    pub repo_url: String,

    pub checkout: Option<LocalCheckout>,
}

/// Everything the generator needs for one application
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub app_name: String,
    pub project: String,
    pub namespace: String,
    pub sources: Vec<ResolvedSource>,
    pub ref_sources: RefSources,
}

impl GenerateRequest {
    /// Local checkout serving `repo_url`, if any source of the request uses one
    pub fn checkout_for(&self, repo_url: &str) -> Option<&LocalCheckout> {
        self.sources
            .iter()
            .filter(|s| s.source.repo_url == repo_url)
            .find_map(|s| s.checkout.as_ref())
    }
}

/// One rendered Kubernetes document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// Source the document came from
    pub source_index: usize,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub content: String,
}

impl Manifest {
    pub fn new(source_index: usize, content: impl Into<String>) -> Self {
        let content = content.into();
        let parsed: Option<serde_yaml::Value> = serde_yaml::from_str(&content).ok();

        let kind = parsed
            .as_ref()
            .and_then(|v| v.get("kind"))
            .and_then(|k| k.as_str())
            .map(str::to_string);
        let name = parsed
            .as_ref()
            .and_then(|v| v.get("metadata"))
            .and_then(|m| m.get("name"))
            .and_then(|n| n.as_str())
            .map(str::to_string);

        Self {
            source_index,
            kind,
            name,
            content,
        }
    }
}

/// Renders resolved sources into manifests
///
/// Called once per application, after validation, checkout substitution
/// and dependency preparation.
#[async_trait]
pub trait ManifestGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<Manifest>>;
}

/// Split multi-document YAML text, dropping empty and comment-only documents
pub fn split_documents(text: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current = String::new();

    let mut flush = |current: &mut String| {
        let has_content = current.lines().any(|l| {
            let l = l.trim();
            !l.is_empty() && !l.starts_with('#')
        });
        if has_content {
            documents.push(current.trim_end().to_string());
        }
        current.clear();
    };

    for line in text.lines() {
        if line == "---" || line.starts_with("--- ") {
            flush(&mut current);
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    flush(&mut current);

    documents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_documents() {
        let text = r#"---
# Source: guestbook/templates/service.yaml
apiVersion: v1
kind: Service
metadata:
  name: guestbook-ui
---
# only a comment
---

---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: guestbook-ui
"#;
        let docs = split_documents(text);
        assert_eq!(docs.len(), 2);
        assert!(docs[0].contains("kind: Service"));
        assert!(docs[1].starts_with("apiVersion: apps/v1"));
    }

    #[test]
    fn test_split_without_separator() {
        let docs = split_documents("apiVersion: v1\nkind: ConfigMap\n");
        assert_eq!(docs, vec!["apiVersion: v1\nkind: ConfigMap"]);
        assert!(split_documents("").is_empty());
    }

    #[test]
    fn test_manifest_identity() {
        let manifest = Manifest::new(
            1,
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\ndata: {}\n",
        );
        assert_eq!(manifest.source_index, 1);
        assert_eq!(manifest.kind.as_deref(), Some("ConfigMap"));
        assert_eq!(manifest.name.as_deref(), Some("settings"));

        let opaque = Manifest::new(0, "not: [valid");
        assert!(opaque.kind.is_none());
        assert!(opaque.name.is_none());
    }

    #[test]
    fn test_checkout_for() {
        let resolved = |index: usize, repo: &str, checkout: Option<&str>| ResolvedSource {
            index,
            source: Source {
                repo_url: repo.to_string(),
                ..Default::default()
            },
            repo_url: repo.to_string(),
            checkout: checkout.map(LocalCheckout::new),
        };

        let request = GenerateRequest {
            app_name: "app".to_string(),
            project: "default".to_string(),
            namespace: "default".to_string(),
            sources: vec![
                resolved(0, "https://charts.example.com", None),
                resolved(1, "https://example.com/repo.git", Some("/work/repo")),
            ],
            ref_sources: RefSources::new(),
        };

        assert_eq!(
            request.checkout_for("https://example.com/repo.git"),
            Some(&LocalCheckout::new("/work/repo"))
        );
        assert!(request.checkout_for("https://charts.example.com").is_none());
    }
}
