//! Eniu adapter for historical daily prices.
//!
//! `GET {base}/chart/pricea/{market}{code}/t/all` returns the full daily
//! close history as two parallel columns:
//!
//! ```json
//! { "date": ["2001-08-27", ...], "price": [35.55, ...] }
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;
use xstock_common::config::DataConfig;

use super::provider::{PriceHistoryProvider, ProviderError};
use super::rate_limiter::RateLimiter;
use super::PriceSeries;

// ============================================================================
// Symbol Mapping
// ============================================================================

/// Convert "600519.SH" to the path segment eniu expects ("sh600519").
fn to_path_code(secucode: &str) -> Option<String> {
    let (code, exchange) = secucode.split_once('.')?;
    if code.is_empty() || exchange.is_empty() || exchange.contains('.') {
        return None;
    }
    Some(format!("{}{}", exchange.to_lowercase(), code))
}

// ============================================================================
// Response
// ============================================================================

/// Raw response of the chart endpoint.
#[derive(Debug, Deserialize)]
struct HistoricalPriceResponse {
    #[serde(default)]
    date: Vec<String>,
    #[serde(default)]
    price: Vec<f64>,
}

impl HistoricalPriceResponse {
    fn into_series(self) -> Result<PriceSeries, ProviderError> {
        let dates = self
            .date
            .iter()
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map_err(|e| ProviderError::Parse(format!("bad date {:?}: {}", d, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PriceSeries::from_columns(dates, self.price)?)
    }
}

// ============================================================================
// Eniu Adapter
// ============================================================================

/// Historical price collaborator backed by eniu.com.
pub struct EniuAdapter {
    client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl EniuAdapter {
    /// Create an adapter against `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration, requests_per_minute: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: RateLimiter::new("eniu", requests_per_minute),
        }
    }

    /// Create from config
    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(
            config.eniu_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
            config.eniu_requests_per_minute,
        )
    }
}

#[async_trait]
impl PriceHistoryProvider for EniuAdapter {
    async fn fetch_price_history(&self, secucode: &str) -> Result<PriceSeries, ProviderError> {
        let path_code = to_path_code(secucode).ok_or_else(|| {
            ProviderError::InvalidRequest(format!("invalid security code: {}", secucode))
        })?;
        let url = format!("{}/chart/pricea/{}/t/all", self.base_url, path_code);

        self.limiter.acquire().await;

        debug!(url = %url, secucode, "Eniu historical price begin");
        let started = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!("HTTP {}", status)));
        }

        let body: HistoricalPriceResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse response: {}", e)))?;

        debug!(
            url = %url,
            points = body.price.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Eniu historical price end"
        );

        body.into_series()
    }
}

// ============================================================================
// Tests
// ============================================================================
