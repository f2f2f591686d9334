//! Chart repository credentials for dependency builds
//!
//! Credentials are resolved once, when the orchestrator is built, and handed
//! to the dependency build tool through environment variables. Nothing is
//! read from ambient process state after that.

use serde::{Deserialize, Serialize};

use crate::error::{RepoError, Result};

/// Variable the dependency build tool reads the username from
pub const USERNAME_ENV: &str = "HELM_REPO_USERNAME";

/// Variable the dependency build tool reads the password from
pub const PASSWORD_ENV: &str = "HELM_REPO_PASSWORD";

/// Credential sources supported in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Credentials {
    /// Inline username/password
    Basic { username: String, password: String },

    /// Names of variables holding the username and password
    Env {
        username_var: String,
        password_var: String,
    },
}

impl Credentials {
    /// Inline username and password
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read both values from the named variables at resolve time
    pub fn from_env(username_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Credentials::Env {
            username_var: username_var.into(),
            password_var: password_var.into(),
        }
    }

    /// Produce the values to inject; fails if a referenced variable is unset
    pub fn resolve(&self) -> Result<ResolvedCredentials> {
        match self {
            Credentials::Basic { username, password } => Ok(ResolvedCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            Credentials::Env {
                username_var,
                password_var,
            } => {
                let username = std::env::var(username_var).map_err(|_| RepoError::AuthFailed {
                    message: format!("{} is not set", username_var),
                })?;
                let password = std::env::var(password_var).map_err(|_| RepoError::AuthFailed {
                    message: format!("{} is not set", password_var),
                })?;
                Ok(ResolvedCredentials { username, password })
            }
        }
    }
}

/// Resolved credentials ready to inject
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub username: String,
    pub password: String,
}

impl ResolvedCredentials {
    /// Environment for the dependency build subprocess
    pub fn env_vars(&self) -> [(&'static str, &str); 2] {
        [
            (USERNAME_ENV, self.username.as_str()),
            (PASSWORD_ENV, self.password.as_str()),
        ]
    }
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_resolve() {
        let resolved = Credentials::basic("admin", "s3cret").resolve().unwrap();
        assert_eq!(
            resolved.env_vars(),
            [(USERNAME_ENV, "admin"), (PASSWORD_ENV, "s3cret")]
        );
    }

    #[test]
    fn test_env_resolve_missing_var() {
        let creds = Credentials::from_env(
            "ARGO_PREVIEW_TEST_UNSET_USER_9F2C",
            "ARGO_PREVIEW_TEST_UNSET_PASS_9F2C",
        );
        let message = creds.resolve().unwrap_err().to_string();
        assert!(message.contains("ARGO_PREVIEW_TEST_UNSET_USER_9F2C"));
    }

    #[test]
    fn test_env_resolve_uses_process_env() {
        let path = std::env::var("PATH").unwrap_or_default();
        let creds = Credentials::from_env("PATH", "PATH");
        let resolved = creds.resolve().unwrap();
        assert_eq!(resolved.username, path);
    }

    #[test]
    fn test_deserialize() {
        let yaml = "type: env\nusernameVar: CHART_USER\npasswordVar: CHART_PASS\n";
        let creds: Credentials = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(creds, Credentials::from_env("CHART_USER", "CHART_PASS"));

        let yaml = "type: basic\nusername: bot\npassword: hunter2\n";
        let creds: Credentials = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(creds, Credentials::basic("bot", "hunter2"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let resolved = Credentials::basic("bot", "hunter2").resolve().unwrap();
        let debug = format!("{:?}", resolved);
        assert!(debug.contains("bot"));
        assert!(!debug.contains("hunter2"));
    }
}
