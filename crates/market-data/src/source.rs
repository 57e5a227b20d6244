//! Upstream data sources
//!
//! The analytics only see these traits. HTTP implementations live in
//! [`crate::clients`] behind the `client` feature; tests use in-memory fakes.

use crate::types::OrderBookLevel;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw order book as returned by the options venue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOrderBook {
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
    /// Venue timestamp in milliseconds
    pub timestamp: Option<i64>,
}

/// One daily row of the volatility index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityCandle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenInterestPoint {
    pub timestamp: i64,
    pub open_interest: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongShortPoint {
    pub timestamp: i64,
    pub long_short_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundingRatePoint {
    pub funding_time: i64,
    /// Raw rate (0.0001 = 0.01%)
    pub funding_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PremiumIndex {
    pub mark_price: f64,
    pub last_funding_rate: f64,
    pub next_funding_time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyKline {
    pub open_time: i64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Option chain provider (book summaries per currency)
#[async_trait]
pub trait OptionChainSource: Send + Sync {
    /// Raw book-summary rows; an empty vec means the venue has no data.
    async fn fetch_book_summary(&self, currency: &str) -> Result<Vec<Value>>;
}

/// Perpetual order book provider
#[async_trait]
pub trait OrderBookSource: Send + Sync {
    async fn fetch_order_book(&self, currency: &str, depth: usize) -> Result<RawOrderBook>;
}

/// Implied volatility index provider
#[async_trait]
pub trait VolatilityIndexSource: Send + Sync {
    async fn fetch_volatility_index(
        &self,
        currency: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<VolatilityCandle>>;
}

/// Perpetual futures statistics provider, keyed by venue symbol (`BTCUSDT`)
#[async_trait]
pub trait FuturesDataSource: Send + Sync {
    async fn open_interest(&self, symbol: &str) -> Result<f64>;

    /// 5 minute open interest history, oldest first
    async fn open_interest_history(&self, symbol: &str) -> Result<Vec<OpenInterestPoint>>;

    /// 5 minute global long/short account ratio, oldest first
    async fn long_short_ratio_history(&self, symbol: &str) -> Result<Vec<LongShortPoint>>;

    async fn premium_index(&self, symbol: &str) -> Result<PremiumIndex>;

    async fn funding_rate_history(&self, symbol: &str) -> Result<Vec<FundingRatePoint>>;

    /// Last seven daily klines
    async fn daily_klines(&self, symbol: &str) -> Result<Vec<DailyKline>>;
}

/// Futures symbol for a currency (`btc` -> `BTCUSDT`)
pub fn futures_symbol(currency: &str) -> String {
    let upper = currency.to_uppercase();
    if upper.ends_with("USDT") {
        upper
    } else {
        format!("{}USDT", upper)
    }
}
