//! Currency rate lookups with caching and static fallback
//!
//! A [`RateService`] asks its [`RateProvider`] for a table per base
//! currency and keeps it for a fixed time to live. When the provider fails,
//! or none is configured, the built-in [`fallback_rates`] table is used
//! instead. Failed lookups are not retried and the fallback is never cached,
//! so the next call tries the provider again.

pub mod fallback;
#[cfg(feature = "http")]
pub mod http;

pub use fallback::{StaticRateProvider, fallback_rates};
#[cfg(feature = "http")]
pub use http::HttpRateProvider;

use crate::core::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default cache lifetime of a fetched table
pub const DEFAULT_RATE_TTL_SECS: i64 = 3600;

/// Where a table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Live,
    Fallback,
}

/// Exchange rates relative to one base currency.
///
/// `rates[code]` is the amount of `code` one unit of `base` buys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: String,
    pub rates: HashMap<String, f64>,
    pub fetched_at: DateTime<Utc>,
    pub source: RateSource,
}

impl RateTable {
    pub fn new(base: &str, rates: HashMap<String, f64>, source: RateSource) -> Self {
        let base = base.to_ascii_uppercase();
        let mut rates: HashMap<String, f64> = rates
            .into_iter()
            .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
            .collect();
        rates.insert(base.clone(), 1.0);
        Self {
            base,
            rates,
            fetched_at: Utc::now(),
            source,
        }
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates
            .get(&code.to_ascii_uppercase())
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
    }

    /// Convert `amount` from `from` into `to`, crossing through the base.
    ///
    /// `None` when either currency is missing from the table.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        if from.eq_ignore_ascii_case(to) {
            return Some(amount);
        }
        Some(amount / self.rate(from)? * self.rate(to)?)
    }

    /// Like [`RateTable::convert`], keeping the amount unchanged (with a
    /// warning) for unknown currencies
    pub fn convert_or_keep(&self, amount: f64, from: &str, to: &str) -> f64 {
        self.convert(amount, from, to).unwrap_or_else(|| {
            tracing::warn!(from, to, base = %self.base, "no rate available, amount left unconverted");
            amount
        })
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}

/// A source of exchange rate tables
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Name used in logs (e.g., "static", "http")
    fn name(&self) -> &'static str;

    /// Fetch the current table for `base`
    async fn fetch(&self, base: &str) -> Result<RateTable>;
}

/// Cached, fail-soft access to a [`RateProvider`]
pub struct RateService {
    provider: Option<Arc<dyn RateProvider>>,
    ttl: Duration,
    cache: RwLock<HashMap<String, RateTable>>,
}

impl RateService {
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self {
            provider: Some(provider),
            ttl: Duration::seconds(DEFAULT_RATE_TTL_SECS),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A service without a provider: always answers from the fallback table
    pub fn offline() -> Self {
        Self {
            provider: None,
            ttl: Duration::seconds(DEFAULT_RATE_TTL_SECS),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Rates for `base` now
    pub async fn rates(&self, base: &str) -> RateTable {
        self.rates_at(base, Utc::now()).await
    }

    /// Rates for `base` as seen at `now`; cached tables older than the TTL
    /// are refetched
    pub async fn rates_at(&self, base: &str, now: DateTime<Utc>) -> RateTable {
        let base = base.trim().to_ascii_uppercase();

        if let Some(table) = self.cache.read().await.get(&base) {
            if table.is_fresh(now, self.ttl) {
                return table.clone();
            }
        }

        let Some(provider) = &self.provider else {
            tracing::warn!(base = %base, "no rate provider configured, using fallback rates");
            return fallback_rates(&base);
        };

        match provider.fetch(&base).await {
            Ok(mut table) => {
                table.fetched_at = now;
                tracing::debug!(provider = provider.name(), base = %base, "rates refreshed");
                self.cache.write().await.insert(base, table.clone());
                table
            }
            Err(e) => {
                tracing::warn!(
                    provider = provider.name(),
                    base = %base,
                    error = %e,
                    "rate lookup failed, using fallback rates"
                );
                fallback_rates(&base)
            }
        }
    }

    /// Convert `amount` between currencies using the table for `to`
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        if from.eq_ignore_ascii_case(to) {
            return amount;
        }
        self.rates(to).await.convert_or_keep(amount, from, to)
    }

    /// Drop the cached table for `base`
    pub async fn invalidate(&self, base: &str) {
        self.cache.write().await.remove(&base.to_ascii_uppercase());
    }
}
