//! Deribit public REST client (options chain, perpetual book, DVOL)

use super::{ClientOptions, JsonApi};
use crate::contract::{coerce_decimal, coerce_f64};
use crate::source::{
    OptionChainSource, OrderBookSource, RawOrderBook, VolatilityCandle, VolatilityIndexSource,
};
use crate::types::OrderBookLevel;
use crate::{MarketDataError, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

pub const PROVIDER: &str = "deribit";
pub const DEFAULT_BASE_URL: &str = "https://www.deribit.com/api/v2";

/// Resolution of the volatility index series
const DVOL_RESOLUTION: &str = "1D";

#[derive(Clone)]
pub struct DeribitClient {
    api: JsonApi,
}

impl DeribitClient {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        Ok(Self {
            api: JsonApi::new(PROVIDER, options)?,
        })
    }

    /// Call a public method and return its `result` (Null when absent)
    async fn call(&self, method: &str, query: &[(&str, String)]) -> Result<Value> {
        let mut payload = self.api.get(&format!("/public/{}", method), query).await?;

        if let Some(err) = payload.get("error") {
            return Err(MarketDataError::upstream(
                self.api.provider(),
                format!("{} returned error: {}", method, err),
            ));
        }

        Ok(payload
            .get_mut("result")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}

/// `[[price, amount], ...]` into levels, skipping malformed entries
pub(crate) fn parse_levels(value: Option<&Value>) -> Vec<OrderBookLevel> {
    value
        .and_then(Value::as_array)
        .map(|levels| {
            levels
                .iter()
                .filter_map(|level| {
                    let price = coerce_decimal(level.get(0)?)?;
                    let quantity = coerce_decimal(level.get(1)?)?;
                    Some(OrderBookLevel::new(price, quantity))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `result.data` rows `[timestamp, open, high, low, close]`
pub(crate) fn parse_volatility_rows(result: &Value) -> Vec<VolatilityCandle> {
    result
        .get("data")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some(VolatilityCandle {
                        timestamp: row.get(0)?.as_i64()?,
                        open: coerce_f64(row.get(1)?)?,
                        high: coerce_f64(row.get(2)?)?,
                        low: coerce_f64(row.get(3)?)?,
                        close: coerce_f64(row.get(4)?)?,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl OptionChainSource for DeribitClient {
    #[instrument(skip(self))]
    async fn fetch_book_summary(&self, currency: &str) -> Result<Vec<Value>> {
        let result = self
            .call(
                "get_book_summary_by_currency",
                &[("currency", currency.to_uppercase()), ("kind", "option".to_string())],
            )
            .await?;

        let rows = match result {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => {
                return Err(self.api.decode_error(format!(
                    "book summary result is not an array: {}",
                    other
                )))
            }
        };

        debug!(rows = rows.len(), "Fetched option book summary");
        Ok(rows)
    }
}

#[async_trait]
impl OrderBookSource for DeribitClient {
    #[instrument(skip(self))]
    async fn fetch_order_book(&self, currency: &str, depth: usize) -> Result<RawOrderBook> {
        let instrument = format!("{}-PERPETUAL", currency.to_uppercase());
        let result = self
            .call(
                "get_order_book",
                &[("instrument_name", instrument), ("depth", depth.to_string())],
            )
            .await?;

        Ok(RawOrderBook {
            bids: parse_levels(result.get("bids")),
            asks: parse_levels(result.get("asks")),
            timestamp: result.get("timestamp").and_then(Value::as_i64),
        })
    }
}

#[async_trait]
impl VolatilityIndexSource for DeribitClient {
    #[instrument(skip(self))]
    async fn fetch_volatility_index(
        &self,
        currency: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<VolatilityCandle>> {
        let result = self
            .call(
                "get_volatility_index_data",
                &[
                    ("currency", currency.to_uppercase()),
                    ("start_timestamp", start_ms.to_string()),
                    ("end_timestamp", end_ms.to_string()),
                    ("resolution", DVOL_RESOLUTION.to_string()),
                ],
            )
            .await?;

        Ok(parse_volatility_rows(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_parse_levels() {
        let raw = json!([[65000.5, 1.25], [64999, "0.5"], ["bad"], [1]]);
        let levels = parse_levels(Some(&raw));
        assert_eq!(
            levels,
            vec![
                OrderBookLevel::new(dec!(65000.5), dec!(1.25)),
                OrderBookLevel::new(dec!(64999), dec!(0.5)),
            ]
        );
        assert!(parse_levels(None).is_empty());
    }

    #[test]
    fn test_parse_volatility_rows() {
        let result = json!({
            "data": [
                [1735689600000i64, 55.1, 56.0, 54.2, 55.5],
                [1735776000000i64, 55.5, 57.0, 55.0, null]
            ],
            "continuation": null
        });
        let rows = parse_volatility_rows(&result);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].close, 55.5);
        assert!(parse_volatility_rows(&Value::Null).is_empty());
    }

    #[test]
    fn test_client_builds() {
        let options = ClientOptions::new("https://www.deribit.com/api/v2/", Duration::from_secs(15));
        assert_eq!(options.base_url, DEFAULT_BASE_URL);
        assert!(DeribitClient::new(&options).is_ok());
    }
}
