//! Same-repository validation for multi-source applications
//!
//! Git sources of one application share a single working tree, so they must
//! all point at the same repository. Registry charts are exempt.

use crate::application::Source;
use crate::error::ValidationError;

/// Validate a multi-source application's sources
///
/// Every source must name a repository; this is checked over the whole list
/// before Git sources are compared with each other.
pub fn validate_sources(sources: &[Source]) -> Result<(), ValidationError> {
    if let Some(index) = sources.iter().position(|s| s.repo_url.is_empty()) {
        return Err(ValidationError::EmptyRepoUrl { index });
    }

    let mut git_sources = sources.iter().enumerate().filter(|(_, s)| s.is_git());

    let Some((baseline_index, baseline)) = git_sources.next() else {
        return Ok(());
    };

    for (index, source) in git_sources {
        if source.repo_url != baseline.repo_url {
            return Err(ValidationError::DivergentRepositories {
                baseline_index,
                baseline_repo: baseline.repo_url.clone(),
                index,
                repo: source.repo_url.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git(repo: &str) -> Source {
        Source {
            repo_url: repo.to_string(),
            path: "app".to_string(),
            target_revision: "HEAD".to_string(),
            ..Default::default()
        }
    }

    fn chart(repo: &str, name: &str) -> Source {
        Source {
            repo_url: repo.to_string(),
            chart: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_different_git_repositories() {
        let err = validate_sources(&[
            git("https://example.com/repo.git"),
            git("https://different-org/different-repo.git"),
        ])
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("sources must use the same repository"));
        assert!(message.contains("index 0"));
        assert!(message.contains("index 1"));
    }

    #[test]
    fn test_empty_repo_url() {
        let err = validate_sources(&[git("https://example.com/repo.git"), git("")]).unwrap_err();

        assert_eq!(err, ValidationError::EmptyRepoUrl { index: 1 });
        let message = err.to_string();
        assert!(message.contains("empty repoURL"));
        assert!(message.contains("index 1"));
    }

    #[test]
    fn test_empty_chart_repo_url() {
        let err = validate_sources(&[chart("", "grafana")]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyRepoUrl { index: 0 });
    }

    #[test]
    fn test_empty_repo_url_reported_before_divergence() {
        let err = validate_sources(&[
            git("https://example.com/a.git"),
            git("https://example.com/b.git"),
            git(""),
        ])
        .unwrap_err();

        assert_eq!(err, ValidationError::EmptyRepoUrl { index: 2 });
    }

    #[test]
    fn test_all_charts_from_different_repositories() {
        assert!(
            validate_sources(&[
                chart("https://grafana.github.io/helm-charts", "grafana"),
                chart(
                    "https://prometheus-community.github.io/helm-charts",
                    "prometheus",
                ),
            ])
            .is_ok()
        );
    }

    #[test]
    fn test_charts_exempt_when_git_sources_agree() {
        assert!(
            validate_sources(&[
                chart("https://grafana.github.io/helm-charts", "grafana"),
                git("https://example.com/repo.git"),
                chart("https://charts.bitnami.com/bitnami", "redis"),
                git("https://example.com/repo.git"),
            ])
            .is_ok()
        );
    }

    #[test]
    fn test_divergence_reports_first_git_and_first_mismatch() {
        let err = validate_sources(&[
            chart("https://charts.example.com", "redis"),
            git("https://example.com/repo.git"),
            git("https://example.com/repo.git"),
            git("https://example.com/other.git"),
            git("https://example.com/third.git"),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::DivergentRepositories {
                baseline_index: 1,
                baseline_repo: "https://example.com/repo.git".to_string(),
                index: 3,
                repo: "https://example.com/other.git".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_and_single() {
        assert!(validate_sources(&[]).is_ok());
        let single = git("https://example.com/repo.git");
        assert!(validate_sources(&[single]).is_ok());
    }
}
