//! Preview configuration
//!
//! Stored in `~/.config/argo-preview/config.yaml`; a missing file means
//! defaults everywhere.

use argo_preview_core::DependencyFailurePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::credentials::Credentials;
use crate::error::{RepoError, Result};

/// Configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewConfig {
    #[serde(default)]
    pub helm: HelmConfig,

    #[serde(default)]
    pub dependencies: DependenciesConfig,

    /// Remote repositories with a known local checkout
    #[serde(default)]
    pub local_repos: Vec<LocalRepoMapping>,

    /// Injected into dependency builds
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmConfig {
    /// Helm executable (default: `helm` from PATH)
    #[serde(default = "default_helm_binary")]
    pub binary: PathBuf,

    /// Abort `helm dependency build` after this long
    #[serde(default, with = "humantime_serde")]
    pub dependency_build_timeout: Option<Duration>,
}

fn default_helm_binary() -> PathBuf {
    PathBuf::from("helm")
}

impl Default for HelmConfig {
    fn default() -> Self {
        Self {
            binary: default_helm_binary(),
            dependency_build_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependenciesConfig {
    #[serde(default)]
    pub on_failure: DependencyFailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRepoMapping {
    #[serde(rename = "repoURL")]
    pub repo_url: String,

    pub path: PathBuf,
}

impl PreviewConfig {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self =
            serde_yaml::from_str(&content).map_err(|e| RepoError::InvalidConfig {
                message: format!("{}: {}", path.display(), e),
            })?;

        // Relative checkout paths are relative to the config file
        if let Some(base) = path.parent() {
            for mapping in &mut config.local_repos {
                if mapping.path.is_relative() {
                    mapping.path = base.join(&mapping.path);
                }
            }
        }

        Ok(config)
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("argo-preview").join("config.yaml"))
    }
}
