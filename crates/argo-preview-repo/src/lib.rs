//! argo-preview repository handling
//!
//! Everything that touches repositories on disk before manifests are
//! generated:
//!
//! - **Local checkouts**: decide whether a source's repository is already
//!   checked out and substitute its working tree for a remote fetch
//! - **Dependency preparation**: run `helm dependency build` for local Git
//!   charts whose `charts/` directory is not populated yet
//! - **Configuration and credentials**: `~/.config/argo-preview/config.yaml`
//!
//! ## Security Notes
//!
//! - Local checkout paths are trusted; no path sanitization is applied to
//!   source paths inside them
//! - Resolved credentials never appear in `Debug` output

pub mod config;
pub mod credentials;
pub mod dependency;
pub mod error;
pub mod local;

// Re-exports for convenience
pub use config::{DependenciesConfig, HelmConfig, LocalRepoMapping, PreviewConfig};
pub use credentials::{Credentials, PASSWORD_ENV, ResolvedCredentials, USERNAME_ENV};
pub use dependency::{
    DependencyBuilder, DependencyOutcome, DependencyPreparer, HelmDependencyBuilder,
};
pub use error::{DependencyBuildError, RepoError, Result};
pub use local::{
    DetectorChain, GitCheckout, LocalCheckout, LocalRepoDetector, NoLocalRepos, StaticLocalRepos,
    normalize_repo_url,
};
