//! Configuration loading and management

use crate::core::error::{ConfigError, Result};
use crate::core::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest};
use crate::core::store::StoreOptions;
use crate::rates::{DEFAULT_RATE_TTL_SECS, RateService};
use crate::storage::{InMemoryKeyValueStore, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which key-value backend holds the collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Lmdb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Directory of the LMDB environment
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("shelf-data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    /// Currency totals are reported in
    pub base_currency: String,

    /// How long a fetched table is reused
    pub ttl_secs: i64,

    /// Rate API URL; `{base}` is replaced by the base code. Without it only
    /// the built-in table is used.
    pub endpoint: Option<String>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_currency: "USD".to_string(),
            ttl_secs: DEFAULT_RATE_TTL_SECS,
            endpoint: None,
        }
    }
}

/// Complete configuration of a shelf application
///
/// # Example
/// ```yaml
/// storage:
///   backend: lmdb
///   path: ./data
/// pagination:
///   default_page_size: 6
/// rates:
///   base_currency: EUR
/// seed_defaults: false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    pub storage: StorageConfig,
    pub pagination: PaginationConfig,
    pub rates: RatesConfig,

    /// Write sample records into empty collections
    pub seed_defaults: bool,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            pagination: PaginationConfig::default(),
            rates: RatesConfig::default(),
            seed_defaults: true,
        }
    }
}

impl ShelfConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::parse(&content, Some(path.display().to_string()))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::parse(yaml, None)
    }

    fn parse(yaml: &str, file: Option<String>) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot work at runtime
    pub fn validate(&self) -> Result<()> {
        let pagination = &self.pagination;
        if pagination.max_page_size == 0 {
            return Err(invalid("pagination.max_page_size", pagination.max_page_size, "must be at least 1"));
        }
        if pagination.default_page_size == 0 || pagination.default_page_size > pagination.max_page_size {
            return Err(invalid(
                "pagination.default_page_size",
                pagination.default_page_size,
                "must be between 1 and max_page_size",
            ));
        }
        if self.rates.ttl_secs <= 0 {
            return Err(invalid("rates.ttl_secs", self.rates.ttl_secs, "must be positive"));
        }
        let base = &self.rates.base_currency;
        if base.len() != 3 || !base.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid("rates.base_currency", base, "must be a three letter code"));
        }
        Ok(())
    }

    /// Build the configured storage backend
    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStore>> {
        match self.storage.backend {
            StorageBackend::Memory => Ok(Arc::new(InMemoryKeyValueStore::new())),
            #[cfg(feature = "lmdb")]
            StorageBackend::Lmdb => {
                let store = crate::storage::LmdbKeyValueStore::open(&self.storage.path)?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "lmdb"))]
            StorageBackend::Lmdb => Err(invalid(
                "storage.backend",
                "lmdb",
                "this build does not include the `lmdb` feature",
            )),
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            seed_defaults: self.seed_defaults,
            ..StoreOptions::default()
        }
    }

    /// A page request using the configured defaults
    pub fn page(&self, page: usize, page_size: usize) -> PageRequest {
        PageRequest::with_limits(
            page,
            page_size,
            self.pagination.default_page_size,
            self.pagination.max_page_size,
        )
    }

    /// Rate service for the configured endpoint, or an offline one
    pub fn rate_service(&self) -> Result<RateService> {
        let ttl = chrono::Duration::seconds(self.rates.ttl_secs);
        let service = match &self.rates.endpoint {
            #[cfg(feature = "http")]
            Some(endpoint) => RateService::new(Arc::new(crate::rates::HttpRateProvider::new(endpoint.clone())?)),
            #[cfg(not(feature = "http"))]
            Some(endpoint) => {
                tracing::warn!(endpoint = %endpoint, "rate endpoint configured without the `http` feature, using fallback rates");
                RateService::offline()
            }
            None => RateService::offline(),
        };
        Ok(service.with_ttl(ttl))
    }
}

fn invalid(field: &str, value: impl ToString, message: &str) -> crate::core::error::ShelfError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
    .into()
}
