//! Credential lookup.
//!
//! Credentials are resolved by name through a `SecretProvider`. The default
//! provider reads Docker secrets and falls back to environment variables.

mod docker;

pub use docker::DockerSecrets;

use std::fmt;

use thiserror::Error;

use crate::config::SecretsConfig;

/// Capability returning secret strings by name.
pub trait SecretProvider: Send + Sync {
    /// Look up a secret. Empty values count as absent.
    fn secret(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("Missing credentials: {}", .0.join(", "))]
    Missing(Vec<String>),
}

/// Account credentials for the login sequence.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Resolve both credentials, naming every missing secret.
    pub fn load(provider: &dyn SecretProvider, names: &SecretsConfig) -> Result<Self, SecretError> {
        let username = provider.secret(&names.username);
        let password = provider.secret(&names.password);

        match (username, password) {
            (Some(username), Some(password)) => Ok(Self { username, password }),
            (username, password) => {
                let mut missing = Vec::new();
                if username.is_none() {
                    missing.push(names.username.clone());
                }
                if password.is_none() {
                    missing.push(names.password.clone());
                }
                Err(SecretError::Missing(missing))
            }
        }
    }
}
