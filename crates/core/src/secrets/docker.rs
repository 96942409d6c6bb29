//! Docker secrets with environment fallback.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::SecretProvider;

/// Reads `<dir>/<name>` (name lower-cased), then the `<NAME>` environment
/// variable (upper-cased). Surrounding whitespace is trimmed.
#[derive(Debug, Clone)]
pub struct DockerSecrets {
    dir: PathBuf,
    use_env: bool,
}

impl DockerSecrets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            use_env: true,
        }
    }

    /// Disable the environment fallback.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn from_file(&self, name: &str) -> Option<String> {
        let path = self.dir.join(name.to_lowercase());
        match std::fs::read_to_string(&path) {
            Ok(value) => non_empty(value),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Secret file not readable");
                None
            }
        }
    }

    fn from_env(&self, name: &str) -> Option<String> {
        if !self.use_env {
            return None;
        }
        std::env::var(name.to_uppercase()).ok().and_then(non_empty)
    }
}

impl SecretProvider for DockerSecrets {
    fn secret(&self, name: &str) -> Option<String> {
        self.from_file(name).or_else(|| self.from_env(name))
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
