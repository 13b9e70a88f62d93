//! In-memory key-value store for testing and ephemeral sessions

use crate::core::error::{Result, StorageError};
use crate::storage::KeyValueStore;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// In-memory key-value store
///
/// Uses RwLock for thread-safe access. Clones share the same map, which lets
/// two stores observe each other's writes the way two tabs share one origin.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_error(e: impl std::fmt::Display) -> StorageError {
        StorageError::Backend {
            backend: "memory".to_string(),
            message: format!("Failed to acquire lock: {}", e),
        }
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(Self::lock_error)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(Self::lock_error)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(Self::lock_error)?;
        Ok(entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(Self::lock_error)?;
        Ok(entries.keys().cloned().collect())
    }
}
