//! Local checkout detection
//!
//! Decides whether a source's repository is already checked out on this
//! machine, so its working tree can be used instead of a remote fetch.
//! Detection happens up front (git is queried once per checkout); lookups
//! during orchestration are pure comparisons.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::process::Command;
use url::Url;

use crate::config::LocalRepoMapping;
use crate::error::{RepoError, Result};

/// A trusted working tree standing in for a remote repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCheckout {
    /// Top-level directory of the working tree
    pub path: PathBuf,
}

impl LocalCheckout {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `file://` location handed to the manifest generator
    pub fn file_url(&self) -> String {
        Url::from_file_path(&self.path)
            .map(String::from)
            .unwrap_or_else(|_| format!("file://{}", self.path.display()))
    }
}

/// Answers "is this repository checked out locally, and where?"
pub trait LocalRepoDetector: Send + Sync {
    fn detect(&self, repo_url: &str) -> Result<Option<LocalCheckout>>;
}

/// Always fetch remotely
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocalRepos;

impl LocalRepoDetector for NoLocalRepos {
    fn detect(&self, _repo_url: &str) -> Result<Option<LocalCheckout>> {
        Ok(None)
    }
}

/// Explicit repository URL to directory mappings from configuration
#[derive(Debug, Default, Clone)]
pub struct StaticLocalRepos {
    mappings: Vec<(String, PathBuf)>,
}

impl StaticLocalRepos {
    pub fn new(mappings: &[LocalRepoMapping]) -> Self {
        Self {
            mappings: mappings
                .iter()
                .map(|m| (normalize_repo_url(&m.repo_url), m.path.clone()))
                .collect(),
        }
    }
}

impl LocalRepoDetector for StaticLocalRepos {
    fn detect(&self, repo_url: &str) -> Result<Option<LocalCheckout>> {
        let wanted = normalize_repo_url(repo_url);

        let Some((_, path)) = self.mappings.iter().find(|(url, _)| *url == wanted) else {
            return Ok(None);
        };

        let path = std::fs::canonicalize(path).map_err(|e| RepoError::LocalCheckout {
            repo_url: repo_url.to_string(),
            message: format!("{}: {}", path.display(), e),
        })?;

        if !path.is_dir() {
            return Err(RepoError::LocalCheckout {
                repo_url: repo_url.to_string(),
                message: format!("{} is not a directory", path.display()),
            });
        }

        Ok(Some(LocalCheckout::new(path)))
    }
}

/// The git working tree containing a directory, matched by its `origin` remote
#[derive(Debug, Clone)]
pub struct GitCheckout {
    toplevel: PathBuf,
    remote_url: String,
    normalized_remote: String,
}

impl GitCheckout {
    /// Inspect `dir` with git
    ///
    /// Returns `Ok(None)` when `dir` is not inside a working tree or the tree
    /// has no `origin` remote. Fails only if git itself cannot be run.
    pub async fn discover(dir: &Path) -> Result<Option<Self>> {
        let Some(toplevel) = git_stdout(dir, &["rev-parse", "--show-toplevel"]).await? else {
            tracing::debug!(dir = %dir.display(), "not inside a git working tree");
            return Ok(None);
        };

        let Some(remote_url) = git_stdout(dir, &["remote", "get-url", "origin"]).await? else {
            tracing::debug!(toplevel = %toplevel, "working tree has no origin remote");
            return Ok(None);
        };

        tracing::debug!(toplevel = %toplevel, remote = %remote_url, "found local checkout");

        Ok(Some(Self {
            toplevel: PathBuf::from(toplevel),
            normalized_remote: normalize_repo_url(&remote_url),
            remote_url,
        }))
    }

    pub fn toplevel(&self) -> &Path {
        &self.toplevel
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }
}

impl LocalRepoDetector for GitCheckout {
    fn detect(&self, repo_url: &str) -> Result<Option<LocalCheckout>> {
        if normalize_repo_url(repo_url) == self.normalized_remote {
            Ok(Some(LocalCheckout::new(&self.toplevel)))
        } else {
            Ok(None)
        }
    }
}

/// Tries each detector in order; the first match wins
#[derive(Default)]
pub struct DetectorChain {
    detectors: Vec<Box<dyn LocalRepoDetector>>,
}

impl DetectorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, detector: impl LocalRepoDetector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl LocalRepoDetector for DetectorChain {
    fn detect(&self, repo_url: &str) -> Result<Option<LocalCheckout>> {
        for detector in &self.detectors {
            if let Some(checkout) = detector.detect(repo_url)? {
                return Ok(Some(checkout));
            }
        }
        Ok(None)
    }
}

/// Run git in `dir`; `None` when git exits non-zero
async fn git_stdout(dir: &Path, args: &[&str]) -> Result<Option<String>> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|e| RepoError::GitCommand {
            operation: args.join(" "),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        tracing::trace!(
            "git {} exited with {}: {}",
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Ok(None);
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(if stdout.is_empty() { None } else { Some(stdout) })
}

static SCP_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^@/]+@)?([^:/]+):(.+)$").expect("scp-like URL pattern is valid")
});

/// Canonical form used to compare repository URLs
///
/// `https://github.com/Org/repo.git`, `git@github.com:Org/repo` and
/// `ssh://git@github.com/Org/repo/` all normalize to `github.com/Org/repo`.
pub fn normalize_repo_url(repo_url: &str) -> String {
    let trimmed = repo_url.trim();

    let (host, path) = if trimmed.contains("://") {
        match Url::parse(trimmed) {
            Ok(url) => {
                let host = match (url.host_str(), url.port()) {
                    (Some(host), Some(port)) => format!("{}:{}", host, port),
                    (Some(host), None) => host.to_string(),
                    (None, _) => String::new(),
                };
                (host, url.path().to_string())
            }
            Err(_) => return strip_repo_suffix(trimmed).to_string(),
        }
    } else if let Some(caps) = SCP_LIKE.captures(trimmed) {
        (caps[1].to_string(), caps[2].to_string())
    } else {
        return strip_repo_suffix(trimmed).to_string();
    };

    let path = strip_repo_suffix(path.trim_start_matches('/'));
    if host.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", host.to_lowercase(), path)
    }
}

fn strip_repo_suffix(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    path.strip_suffix(".git").unwrap_or(path)
}
