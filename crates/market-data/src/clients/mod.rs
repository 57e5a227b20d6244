//! HTTP clients for the upstream exchanges
//!
//! One `reqwest::Client` per provider, built with the configured timeout.
//! Non-2xx answers and transport failures become [`MarketDataError::Upstream`];
//! bodies that cannot be decoded become [`MarketDataError::Decode`].

pub mod binance;
pub mod deribit;

pub use binance::BinanceFuturesClient;
pub use deribit::DeribitClient;

use crate::service::Sources;
use crate::{MarketDataError, Result};
use observability::UpstreamMetrics;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const USER_AGENT: &str = "TradingRoad/1.0";

/// Connection settings for one provider
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

/// Wire the HTTP clients into the service's source set
pub fn http_sources(deribit: &ClientOptions, binance: &ClientOptions) -> Result<Sources> {
    let deribit = Arc::new(DeribitClient::new(deribit)?);
    let binance = Arc::new(BinanceFuturesClient::new(binance)?);

    Ok(Sources {
        options: deribit.clone(),
        order_books: deribit.clone(),
        volatility: deribit,
        futures: binance,
    })
}

/// Shared plumbing: client, base URL, provider label and metrics
#[derive(Clone)]
pub(crate) struct JsonApi {
    http: Client,
    base_url: String,
    provider: &'static str,
    metrics: UpstreamMetrics,
}

impl JsonApi {
    pub(crate) fn new(provider: &'static str, options: &ClientOptions) -> Result<Self> {
        let http = Client::builder()
            .timeout(options.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketDataError::upstream(provider, e.to_string()))?;

        Ok(Self {
            http,
            base_url: options.base_url.clone(),
            provider,
            metrics: UpstreamMetrics::new(provider),
        })
    }

    pub(crate) fn provider(&self) -> &'static str {
        self.provider
    }

    pub(crate) fn decode_error(&self, message: impl Into<String>) -> MarketDataError {
        MarketDataError::decode(self.provider, message)
    }

    /// GET `{base_url}{path}` and decode the body as JSON
    pub(crate) async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut guard = self.metrics.start_call();

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(provider = self.provider, %url, error = %e, "Upstream request failed");
                MarketDataError::upstream(self.provider, e.to_string())
            })?;

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| self.decode_error(e.to_string()))?;

        guard.success();
        Ok(body)
    }
}
