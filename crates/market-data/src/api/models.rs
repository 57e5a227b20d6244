//! API request/response models.

use crate::metrics::{expiry_summary, ExpirySummary};
use crate::sentiment::{FundingHistoryPoint, LongShortHistoryPoint, OpenInterestHistoryPoint};
use crate::service::{FuturesReport, MetricsReport, OrderBookReport};
use crate::types::{DerivativesMetrics, OptionContract, OrderBookLevel, SentimentEnrichment, Snapshot};
use crate::volatility::VolatilityPoint;
use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn iso_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Query parameters for the metrics endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct MetricsParams {
    pub expiry_date: Option<String>,
}

/// Query parameters for the order book endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct OrderBookParams {
    pub level: Option<String>,
}

/// Query parameters for the volatility history endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub days: Option<String>,
}

/// Legacy expirations shape (not wrapped in the envelope).
#[derive(Debug, Serialize, Deserialize)]
pub struct ExpirationsResponse {
    pub success: bool,
    pub data: Vec<String>,
    pub currency: String,
    pub count: usize,
}

impl ExpirationsResponse {
    pub fn new(currency: String, expiries: &[NaiveDate]) -> Self {
        let data: Vec<String> = expiries.iter().copied().map(iso_date).collect();
        Self {
            success: true,
            count: data.len(),
            data,
            currency,
        }
    }
}

/// Option chain grouped by expiry.
#[derive(Debug, Serialize)]
pub struct OptionsData {
    pub currency: String,
    pub expiry_dates: Vec<String>,
    pub expiry_data: BTreeMap<String, ExpirySummary>,
    pub raw_data: Vec<OptionContract>,
    pub dropped_rows: usize,
    pub timestamp: String,
}

impl OptionsData {
    /// `raw_data` is left empty for snapshots of `raw_data_limit` rows or more.
    pub fn from_snapshot(snapshot: &Snapshot, raw_data_limit: usize) -> Self {
        let expiry_data: BTreeMap<String, ExpirySummary> = expiry_summary(snapshot)
            .into_iter()
            .map(|(date, summary)| (iso_date(date), summary))
            .collect();

        let raw_data = if snapshot.len() < raw_data_limit {
            snapshot.contracts.clone()
        } else {
            Vec::new()
        };

        Self {
            currency: snapshot.currency.clone(),
            expiry_dates: expiry_data.keys().cloned().collect(),
            expiry_data,
            raw_data,
            dropped_rows: snapshot.dropped,
            timestamp: now_rfc3339(),
        }
    }
}

/// Metrics merged with the best-effort sentiment fields.
#[derive(Debug, Serialize)]
pub struct MetricsData {
    #[serde(flatten)]
    pub metrics: DerivativesMetrics,
    #[serde(flatten)]
    pub sentiment: SentimentEnrichment,
    pub timestamp: String,
}

impl From<MetricsReport> for MetricsData {
    fn from(report: MetricsReport) -> Self {
        Self {
            metrics: report.metrics,
            sentiment: report.sentiment,
            timestamp: now_rfc3339(),
        }
    }
}

/// Order book with `[price, quantity]` levels.
#[derive(Debug, Serialize)]
pub struct OrderBookData {
    pub bids: Vec<[f64; 2]>,
    pub asks: Vec<[f64; 2]>,
    pub timestamp: i64,
}

fn level_pair(level: &OrderBookLevel) -> [f64; 2] {
    [
        level.price.to_f64().unwrap_or_default(),
        level.quantity.to_f64().unwrap_or_default(),
    ]
}

impl From<OrderBookReport> for OrderBookData {
    fn from(report: OrderBookReport) -> Self {
        Self {
            bids: report.book.bids.iter().map(level_pair).collect(),
            asks: report.book.asks.iter().map(level_pair).collect(),
            timestamp: report.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VolatilityHistoryData {
    pub currency: String,
    pub days: u32,
    pub data: Vec<VolatilityPoint>,
    pub timestamp: String,
}

impl VolatilityHistoryData {
    pub fn new(currency: String, days: u32, data: Vec<VolatilityPoint>) -> Self {
        Self {
            currency,
            days,
            data,
            timestamp: now_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FuturesMetricsData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_oi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oi_change_4h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oi_history: Option<Vec<OpenInterestHistoryPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_short_history: Option<Vec<LongShortHistoryPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_history: Option<Vec<FundingHistoryPoint>>,
    pub timestamp: String,
}

impl From<FuturesReport> for FuturesMetricsData {
    fn from(report: FuturesReport) -> Self {
        Self {
            current_oi: report.current_oi,
            oi_change_4h: report.oi_change_4h,
            oi_history: report.oi_history,
            long_short_history: report.long_short_history,
            funding_history: report.funding_history,
            timestamp: now_rfc3339(),
        }
    }
}
