//! In-memory secret provider for testing.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::secrets::SecretProvider;

/// Secrets held in memory. Values can be removed mid-test to simulate a
/// secret disappearing after startup.
#[derive(Debug, Default)]
pub struct StaticSecrets {
    values: RwLock<HashMap<String, String>>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret.
    pub fn with(self, name: &str, value: &str) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&self, name: &str, value: &str) {
        self.values
            .write()
            .expect("secrets lock poisoned")
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove(&self, name: &str) {
        self.values
            .write()
            .expect("secrets lock poisoned")
            .remove(name);
    }
}

impl SecretProvider for StaticSecrets {
    fn secret(&self, name: &str) -> Option<String> {
        self.values
            .read()
            .expect("secrets lock poisoned")
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
    }
}
