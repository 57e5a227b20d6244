//! Shared types for Market Data

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(rename = "C")]
    Call,
    #[serde(rename = "P")]
    Put,
}

impl OptionType {
    /// Parse the exchange type code (`C` / `P`)
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "C" => Some(Self::Call),
            "P" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

/// Option Greeks as published by the exchange (passed through, never computed here)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
}

/// One option contract row of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Exchange identifier, `{CCY}-{DDMMMYY}-{STRIKE}-{C|P}`
    #[serde(rename = "instrument_name")]
    pub instrument_id: String,
    pub expiration_date: NaiveDate,
    pub strike: u64,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub open_interest: f64,
    pub volume: f64,
    /// Implied volatility in percent
    pub mark_iv: Option<f64>,
    pub underlying_price: Option<f64>,
    pub greeks: Greeks,
}

impl OptionContract {
    pub fn is_call(&self) -> bool {
        self.option_type == OptionType::Call
    }

    pub fn is_put(&self) -> bool {
        self.option_type == OptionType::Put
    }
}

/// Immutable option chain for one currency, captured at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub currency: String,
    pub contracts: Vec<OptionContract>,
    /// Rows rejected by the contract parser
    pub dropped: usize,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn empty(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            contracts: Vec::new(),
            dropped: 0,
            captured_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Distinct expiries, ascending
    pub fn expiries(&self) -> Vec<NaiveDate> {
        let mut expiries: Vec<NaiveDate> =
            self.contracts.iter().map(|c| c.expiration_date).collect();
        expiries.sort_unstable();
        expiries.dedup();
        expiries
    }

    /// Contracts expiring on `expiry`
    pub fn for_expiry(&self, expiry: NaiveDate) -> Vec<&OptionContract> {
        self.contracts
            .iter()
            .filter(|c| c.expiration_date == expiry)
            .collect()
    }
}

/// Aggregate metrics derived from a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivativesMetrics {
    pub call_oi: f64,
    pub put_oi: f64,
    pub total_oi: f64,
    pub put_call_ratio_oi: f64,
    pub put_call_ratio_volume: f64,
    pub max_pain: u64,
    pub notional_value_usd: f64,
    pub underlying_price: f64,
}

/// Cross-venue sentiment merged into the metrics response.
///
/// Every field is independent; a failed fetch leaves its fields unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentEnrichment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binance_oi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oi_change_4h: Option<f64>,
    /// Last funding rate in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_funding_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_low: Option<f64>,
}

/// Book side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Bid,
    Ask,
}

/// Price level in an order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl OrderBookLevel {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }
}

/// Bucketed order book: bids descending, asks ascending, one level per bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedOrderBook {
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
}
