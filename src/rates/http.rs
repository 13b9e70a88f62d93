//! Rate provider backed by a JSON HTTP endpoint

use super::{RateProvider, RateSource, RateTable};
use crate::core::error::{ExternalServiceError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const SERVICE: &str = "rates";

/// Expected response body: `{"base": "USD", "rates": {"EUR": 0.92, ...}}`
#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    base: Option<String>,
    rates: HashMap<String, f64>,
}

/// Fetches tables from `endpoint`, where `{base}` is replaced by the base code
///
/// # Example
/// ```rust,ignore
/// let provider = HttpRateProvider::new("https://api.exchangerate-api.com/v4/latest/{base}")?;
/// ```
pub struct HttpRateProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRateProvider {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ExternalServiceError::Request {
                service: SERVICE.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn url_for(&self, base: &str) -> String {
        if self.endpoint.contains("{base}") {
            self.endpoint.replace("{base}", base)
        } else {
            format!("{}/{}", self.endpoint.trim_end_matches('/'), base)
        }
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, base: &str) -> Result<RateTable> {
        let url = self.url_for(base);
        let request_error = |e: reqwest::Error| ExternalServiceError::Request {
            service: SERVICE.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(request_error)?
            .error_for_status()
            .map_err(request_error)?;

        let body: RatesResponse = response.json().await.map_err(|e| ExternalServiceError::InvalidResponse {
            service: SERVICE.to_string(),
            message: e.to_string(),
        })?;

        if let Some(reported) = &body.base {
            if !reported.eq_ignore_ascii_case(base) {
                return Err(ExternalServiceError::InvalidResponse {
                    service: SERVICE.to_string(),
                    message: format!("asked for {} rates, got {}", base, reported),
                }
                .into());
            }
        }

        Ok(RateTable::new(base, body.rates, RateSource::Live))
    }
}
