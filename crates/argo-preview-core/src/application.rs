//! Application and source definitions
//!
//! Mirrors the subset of the Argo CD `Application` resource that decides
//! which inputs reach the manifest generator. Anything not listed here is
//! ignored while deserializing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An Argo CD style application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// API version (argoproj.io/v1alpha1)
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    pub metadata: ApplicationMetadata,

    pub spec: ApplicationSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApplicationMetadata {
    pub name: String,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    #[serde(default)]
    pub project: String,

    /// Single source (ignored when `sources` is non-empty)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,

    /// Multiple sources, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,

    #[serde(default)]
    pub destination: Destination,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    #[serde(default)]
    pub server: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,
}

/// One repository/path/revision/chart tuple of an application
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "repoURL", default)]
    pub repo_url: String,

    /// Directory inside the repository (empty for registry charts)
    #[serde(default)]
    pub path: String,

    /// Branch, tag, commit or `HEAD`
    #[serde(default)]
    pub target_revision: String,

    /// Chart name; non-empty only for registry chart sources
    #[serde(default)]
    pub chart: String,

    /// Token other sources use as `$<ref>/<path>` in value files
    #[serde(default, rename = "ref")]
    pub ref_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<DirectorySource>,
}

impl Source {
    /// A Git source is addressed by repository and path
    #[inline]
    pub fn is_git(&self) -> bool {
        self.chart.is_empty()
    }

    /// A registry source is addressed by chart name
    #[inline]
    pub fn is_chart(&self) -> bool {
        !self.chart.is_empty()
    }

    /// Only provides files to other sources through its `ref`
    pub fn is_ref_only(&self) -> bool {
        !self.ref_name.is_empty() && self.path.is_empty() && self.chart.is_empty()
    }

    /// Helm value files, empty when no helm block is present
    pub fn value_files(&self) -> &[String] {
        self.helm
            .as_ref()
            .map(|h| h.value_files.as_slice())
            .unwrap_or(&[])
    }

    /// Revision to use, `HEAD` when unset
    pub fn revision(&self) -> &str {
        if self.target_revision.is_empty() {
            "HEAD"
        } else {
            &self.target_revision
        }
    }
}

/// Helm-specific source options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelmSource {
    /// Value files, possibly using `$<ref>/<path>` tokens
    #[serde(default)]
    pub value_files: Vec<String>,

    #[serde(default)]
    pub release_name: Option<String>,

    /// Inline values as a YAML string
    #[serde(default)]
    pub values: Option<String>,

    #[serde(default)]
    pub values_object: Option<serde_json::Value>,

    #[serde(default)]
    pub ignore_missing_value_files: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DirectorySource {
    #[serde(default)]
    pub recurse: bool,
}

impl Application {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// True when the `sources` list is in use
    pub fn has_multiple_sources(&self) -> bool {
        !self.spec.sources.is_empty()
    }

    /// The sources to render, in declaration order
    pub fn sources(&self) -> &[Source] {
        if self.has_multiple_sources() {
            &self.spec.sources
        } else {
            self.spec.source.as_slice()
        }
    }

    /// Namespace manifests are rendered for
    pub fn destination_namespace(&self) -> &str {
        self.spec
            .destination
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or("default")
    }
}
