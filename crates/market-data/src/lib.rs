//! Derivatives analytics for TradingRoad
//!
//! This crate turns option-chain snapshots pulled from an options venue into
//! aggregate metrics, and serves them over HTTP.
//!
//! # Core Components
//!
//! - [`contract`] - Instrument-name decoding and parse-or-drop row coercion
//! - [`max_pain`] - Max-pain strike over a contract set
//! - [`metrics`] - OI totals, put/call ratios, notional value, expiry grouping
//! - [`order_book`] - Decimal price bucketing of raw book levels
//! - [`cache`] - Per-currency TTL snapshot cache
//! - [`volatility`] - Volatility index history with a 7-day SMA
//! - [`sentiment`] - Futures venue enrichments
//! - [`service`] - The facade injected into the HTTP handlers
//! - [`clients`] - Deribit and Binance REST clients (feature `client`)
//! - [`api`] - Axum routes (feature `api`)
//!
//! # Key Invariants
//!
//! - Snapshots are immutable; a refresh replaces, never mutates
//! - A failed refresh never evicts the cached entry
//! - Metrics and books are recomputed per request, never cached
//! - Greeks are passed through from the venue, never computed

pub mod cache;
pub mod contract;
pub mod error;
pub mod max_pain;
pub mod metrics;
pub mod order_book;
pub mod sentiment;
pub mod service;
pub mod source;
pub mod types;
pub mod volatility;

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "client")]
pub mod clients;

pub use cache::SnapshotCache;
pub use error::MarketDataError;
pub use service::{DerivativesService, ServiceSettings, Sources};
pub use types::{
    AggregatedOrderBook, DerivativesMetrics, Greeks, OptionContract, OptionType, OrderBookLevel,
    SentimentEnrichment, Snapshot,
};

pub type Result<T> = std::result::Result<T, MarketDataError>;
