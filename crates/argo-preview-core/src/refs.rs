//! Cross-source references
//!
//! A source declaring `ref: configs` can be addressed by its siblings as
//! `$configs/<path>` inside `helm.valueFiles`.

use indexmap::IndexMap;
use serde::Serialize;

use crate::application::Source;

/// Repository a `$ref` token resolves to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefTarget {
    pub repo_url: String,
    pub target_revision: String,
    /// Chart name when the referenced source is a registry chart, else empty
    pub chart: String,
}

impl From<&Source> for RefTarget {
    fn from(source: &Source) -> Self {
        Self {
            repo_url: source.repo_url.clone(),
            target_revision: source.target_revision.clone(),
            chart: source.chart.clone(),
        }
    }
}

/// `$`-prefixed reference key to target
pub type RefSources = IndexMap<String, RefTarget>;

/// Build the reference map for an application's sources
///
/// Sources without a `ref` contribute nothing. A duplicated `ref` keeps the
/// last declaration.
pub fn build_ref_sources(sources: &[Source]) -> RefSources {
    let mut refs = RefSources::new();

    for source in sources.iter().filter(|s| !s.ref_name.is_empty()) {
        refs.insert(ref_key(&source.ref_name), RefTarget::from(source));
    }

    refs
}

/// Map key for a declared `ref`
#[inline]
pub fn ref_key(ref_name: &str) -> String {
    format!("${}", ref_name)
}

/// Split a `$<ref>/<path>` value-file entry into its key and relative path
///
/// Returns `None` for plain value files.
pub fn split_ref_token(value_file: &str) -> Option<(&str, &str)> {
    if !value_file.starts_with('$') {
        return None;
    }

    match value_file.split_once('/') {
        Some((key, path)) => Some((key, path)),
        None => Some((value_file, "")),
    }
}
