//! Built-in rates used when no live table is available

use super::{RateProvider, RateSource, RateTable};
use crate::core::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Approximate USD-based rates
const USD_RATES: [(&str, f64); 9] = [
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 149.5),
    ("CAD", 1.36),
    ("AUD", 1.52),
    ("CHF", 0.88),
    ("INR", 83.1),
    ("KRW", 1330.0),
];

/// The static table rebased onto `base`.
///
/// An unknown base yields a table that only knows the base itself.
pub fn fallback_rates(base: &str) -> RateTable {
    let base = base.trim().to_ascii_uppercase();
    let Some(base_rate) = USD_RATES.iter().find(|(code, _)| *code == base).map(|(_, r)| *r) else {
        tracing::warn!(base = %base, "no fallback rates for base currency");
        return RateTable::new(&base, HashMap::new(), RateSource::Fallback);
    };

    let rates = USD_RATES
        .iter()
        .map(|(code, rate)| (code.to_string(), rate / base_rate))
        .collect();
    RateTable::new(&base, rates, RateSource::Fallback)
}

/// Provider answering from a fixed table, used when no endpoint is configured
#[derive(Debug, Clone, Default)]
pub struct StaticRateProvider {
    overrides: Option<RateTable>,
}

impl StaticRateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `table` (rebased as needed) instead of the built-in rates
    pub fn with_table(table: RateTable) -> Self {
        Self {
            overrides: Some(table),
        }
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, base: &str) -> Result<RateTable> {
        let Some(table) = &self.overrides else {
            return Ok(fallback_rates(base));
        };

        let base = base.to_ascii_uppercase();
        let Some(base_rate) = table.rate(&base) else {
            return Ok(RateTable::new(&base, HashMap::new(), RateSource::Live));
        };
        let rates = table
            .rates
            .iter()
            .map(|(code, rate)| (code.clone(), rate / base_rate))
            .collect();
        Ok(RateTable::new(&base, rates, RateSource::Live))
    }
}
