//! LMDB key-value backend using heed (memory-mapped B-tree).
//!
//! LMDB is an embedded key-value store; no external server required and all
//! operations are synchronous, matching the whole-value get/set contract of
//! [`KeyValueStore`].
//!
//! # Databases (named LMDB sub-databases)
//!
//! - `kv` — one entry per logical collection, value is the JSON document
//!
//! # Feature flag
//!
//! Enable with `--features lmdb`. Requires the `heed` crate.

use crate::core::error::{Result, StorageError};
use crate::storage::KeyValueStore;
use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};
use std::path::Path;
use std::sync::Arc;

fn backend_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend {
        backend: "lmdb".to_string(),
        message: e.to_string(),
    }
}

/// LMDB-backed implementation of [`KeyValueStore`].
///
/// The `Env` is wrapped in an `Arc` for cheap cloning; every write runs in
/// its own committed transaction so readers never see a partial value.
///
/// # Example
///
/// ```rust,ignore
/// use shelf::storage::LmdbKeyValueStore;
///
/// let kv = LmdbKeyValueStore::open("/tmp/shelf-lmdb")?;
/// kv.set("posts", "[]")?;
/// ```
pub struct LmdbKeyValueStore {
    env: Arc<Env>,
    db: Database<Str, Str>,
}

impl LmdbKeyValueStore {
    /// Open (or create) an LMDB environment at `path` and initialise the
    /// `kv` named database.
    ///
    /// The map size defaults to 64 MB; LMDB only reserves address space.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(path.as_ref()).map_err(backend_error)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(64 * 1024 * 1024)
                .max_dbs(4)
                .open(path.as_ref())
                .map_err(backend_error)?
        };

        let mut wtxn = env.write_txn().map_err(backend_error)?;
        let db: Database<Str, Str> = env
            .create_database(&mut wtxn, Some("kv"))
            .map_err(backend_error)?;
        wtxn.commit().map_err(backend_error)?;

        tracing::debug!(path = %path.as_ref().display(), "opened lmdb key-value store");

        Ok(Self {
            env: Arc::new(env),
            db,
        })
    }
}

impl Clone for LmdbKeyValueStore {
    fn clone(&self) -> Self {
        Self {
            env: Arc::clone(&self.env),
            db: self.db,
        }
    }
}

impl KeyValueStore for LmdbKeyValueStore {
    fn backend_name(&self) -> &'static str {
        "lmdb"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let rtxn = self.env.read_txn().map_err(backend_error)?;
        let value = self.db.get(&rtxn, key).map_err(backend_error)?;
        Ok(value.map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut wtxn = self.env.write_txn().map_err(backend_error)?;
        self.db.put(&mut wtxn, key, value).map_err(backend_error)?;
        wtxn.commit().map_err(backend_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut wtxn = self.env.write_txn().map_err(backend_error)?;
        let existed = self.db.delete(&mut wtxn, key).map_err(backend_error)?;
        wtxn.commit().map_err(backend_error)?;
        Ok(existed)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let rtxn = self.env.read_txn().map_err(backend_error)?;
        let mut keys = Vec::new();
        for item in self.db.iter(&rtxn).map_err(backend_error)? {
            let (key, _) = item.map_err(backend_error)?;
            keys.push(key.to_string());
        }
        Ok(keys)
    }
}
