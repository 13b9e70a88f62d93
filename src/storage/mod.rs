//! Key-value storage backends
//!
//! Every logical collection (posts, categories, expenses, ...) lives under a
//! single key holding one JSON document. Backends only offer whole-value
//! get/set; there is no partial or merge write path.

pub mod in_memory;
#[cfg(feature = "lmdb")]
pub mod lmdb;
pub mod transfer;

pub use in_memory::InMemoryKeyValueStore;
#[cfg(feature = "lmdb")]
pub use lmdb::LmdbKeyValueStore;

use crate::core::error::{Result, StorageError};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A local key-value store holding serialized documents
pub trait KeyValueStore: Send + Sync {
    /// Name used in logs and errors (e.g., "memory", "lmdb")
    fn backend_name(&self) -> &'static str;

    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite `key` with `value`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; returns whether it existed
    fn remove(&self, key: &str) -> Result<bool>;

    /// All keys currently present, sorted
    fn keys(&self) -> Result<Vec<String>>;
}

/// Read and decode the document under `key`.
///
/// Fails soft: a missing key, a backend error or an unparsable value all
/// yield `None`, logged at `warn` for the last two.
pub fn read_json<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, backend = kv.backend_name(), error = %e, "storage read failed");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unparsable stored value");
            None
        }
    }
}

/// Read the document under `key`, falling back to `T::default()`
pub fn read_json_or_default<T: DeserializeOwned + Default>(kv: &dyn KeyValueStore, key: &str) -> T {
    read_json(kv, key).unwrap_or_default()
}

/// Encode `value` and overwrite `key` with it
pub fn write_json<T: Serialize + ?Sized>(kv: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Serialization {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    kv.set(key, &raw)
}
