//! Derivatives service
//!
//! Composes the snapshot cache, the upstream sources and the analytics. One
//! instance is shared (behind an `Arc`) by every HTTP handler.

use crate::cache::SnapshotCache;
use crate::metrics::compute_metrics;
use crate::order_book::{aggregate, DEFAULT_DISPLAY_DEPTH};
use crate::sentiment::{
    clock_time, funding_chart, long_short_chart, oi_change_4h, open_interest_chart,
    weekly_range, FundingHistoryPoint, LongShortHistoryPoint, OpenInterestHistoryPoint,
};
use crate::source::{
    futures_symbol, FuturesDataSource, OptionChainSource, OrderBookSource, VolatilityIndexSource,
};
use crate::types::{AggregatedOrderBook, DerivativesMetrics, SentimentEnrichment, Snapshot};
use crate::volatility::{volatility_history, VolatilityPoint};
use crate::{MarketDataError, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

const DAY_MS: i64 = 86_400_000;

/// Longest volatility lookback accepted
pub const MAX_HISTORY_DAYS: u32 = 3650;

/// Tunables that shape responses
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Levels requested from the venue per side
    pub order_book_fetch_depth: usize,
    /// Levels returned per side after aggregation
    pub order_book_display_depth: usize,
    /// Snapshots with at least this many rows omit `raw_data`
    pub raw_data_limit: usize,
    pub cache_ttl: Duration,
    /// Currencies served by the options venue endpoints; empty allows any
    pub supported_currencies: Vec<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            order_book_fetch_depth: 100,
            order_book_display_depth: DEFAULT_DISPLAY_DEPTH,
            raw_data_limit: 1000,
            cache_ttl: crate::cache::DEFAULT_TTL,
            supported_currencies: vec!["BTC".to_string(), "ETH".to_string()],
        }
    }
}

/// Upstream sources used by the service
#[derive(Clone)]
pub struct Sources {
    pub options: Arc<dyn OptionChainSource>,
    pub order_books: Arc<dyn OrderBookSource>,
    pub volatility: Arc<dyn VolatilityIndexSource>,
    pub futures: Arc<dyn FuturesDataSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub metrics: DerivativesMetrics,
    pub sentiment: SentimentEnrichment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookReport {
    pub book: AggregatedOrderBook,
    /// Milliseconds since epoch
    pub timestamp: i64,
}

/// Futures venue view; each section is absent when its fetch failed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuturesReport {
    pub current_oi: Option<f64>,
    pub oi_change_4h: Option<f64>,
    pub oi_history: Option<Vec<OpenInterestHistoryPoint>>,
    pub long_short_history: Option<Vec<LongShortHistoryPoint>>,
    pub funding_history: Option<Vec<FundingHistoryPoint>>,
}

impl FuturesReport {
    fn is_empty(&self) -> bool {
        self.current_oi.is_none()
            && self.oi_history.is_none()
            && self.long_short_history.is_none()
            && self.funding_history.is_none()
    }
}

/// Best-effort: log and drop a failed enrichment
fn best_effort<T>(what: &str, symbol: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(symbol, error = %e, "Skipping {} enrichment", what);
            None
        }
    }
}

/// Bucket step for a requested order-book level; `<= 1` means raw levels
pub fn bucket_step(level: Decimal) -> Decimal {
    if level > Decimal::ONE {
        level
    } else {
        Decimal::ZERO
    }
}

pub struct DerivativesService {
    cache: SnapshotCache,
    sources: Sources,
    settings: ServiceSettings,
}

impl DerivativesService {
    pub fn new(sources: Sources, settings: ServiceSettings) -> Self {
        Self {
            cache: SnapshotCache::new(Arc::clone(&sources.options), settings.cache_ttl),
            sources,
            settings,
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Reject currencies outside the configured allow-list
    pub fn ensure_supported(&self, currency: &str) -> Result<()> {
        let supported = &self.settings.supported_currencies;
        if supported.is_empty() || supported.iter().any(|c| c.eq_ignore_ascii_case(currency)) {
            Ok(())
        } else {
            Err(MarketDataError::InvalidSymbol(format!(
                "{} is not supported (expected one of {})",
                currency,
                supported.join(", ")
            )))
        }
    }

    /// Current option chain for `currency` (cached)
    pub async fn snapshot(&self, currency: &str) -> Result<Arc<Snapshot>> {
        self.cache.get(currency).await
    }

    /// Distinct expiries, chronological
    pub async fn expirations(&self, currency: &str) -> Result<Vec<NaiveDate>> {
        Ok(self.snapshot(currency).await?.expiries())
    }

    pub async fn metrics(&self, currency: &str, expiry: Option<NaiveDate>) -> Result<MetricsReport> {
        self.metrics_on(currency, expiry, Utc::now().date_naive()).await
    }

    /// Metrics with an explicit "today" for the max-pain expiry choice
    #[instrument(skip(self))]
    pub async fn metrics_on(
        &self,
        currency: &str,
        expiry: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<MetricsReport> {
        let snapshot = self.snapshot(currency).await?;
        let metrics = compute_metrics(&snapshot, expiry, today);
        let sentiment = self.sentiment(currency).await;

        Ok(MetricsReport { metrics, sentiment })
    }

    /// Futures venue enrichments, fetched concurrently. Never fails.
    pub async fn sentiment(&self, currency: &str) -> SentimentEnrichment {
        let symbol = futures_symbol(currency);
        let futures = &self.sources.futures;

        let (oi, oi_history, premium, klines) = tokio::join!(
            futures.open_interest(&symbol),
            futures.open_interest_history(&symbol),
            futures.premium_index(&symbol),
            futures.daily_klines(&symbol),
        );

        let mut sentiment = SentimentEnrichment::default();

        if let Some(current) = best_effort("open interest", &symbol, oi) {
            sentiment.binance_oi = Some(current);
            if let Some(history) = best_effort("open interest history", &symbol, oi_history) {
                sentiment.oi_change_4h = Some(oi_change_4h(current, &history));
            }
        }

        if let Some(premium) = best_effort("funding", &symbol, premium) {
            sentiment.funding_rate = Some(premium.last_funding_rate * 100.0);
            sentiment.next_funding_time = clock_time(premium.next_funding_time);
            sentiment.mark_price = Some(premium.mark_price);
        }

        if let Some((high, low)) = best_effort("weekly range", &symbol, klines)
            .as_deref()
            .and_then(weekly_range)
        {
            sentiment.week_high = Some(high);
            sentiment.week_low = Some(low);
        }

        sentiment
    }

    /// Aggregated perpetual order book.
    ///
    /// Upstream failures are logged and answered with an empty book.
    #[instrument(skip(self))]
    pub async fn order_book(&self, currency: &str, level: Decimal) -> OrderBookReport {
        let now = Utc::now().timestamp_millis();
        let raw = match self
            .sources
            .order_books
            .fetch_order_book(currency, self.settings.order_book_fetch_depth)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Order book unavailable, returning empty book");
                return OrderBookReport {
                    book: AggregatedOrderBook::default(),
                    timestamp: now,
                };
            }
        };

        let book = aggregate(
            &raw.bids,
            &raw.asks,
            bucket_step(level),
            self.settings.order_book_display_depth,
        );

        OrderBookReport {
            book,
            timestamp: raw.timestamp.unwrap_or(now),
        }
    }

    /// Daily volatility index with its 7-day average over the last `days` days
    #[instrument(skip(self))]
    pub async fn volatility_history(&self, currency: &str, days: u32) -> Result<Vec<VolatilityPoint>> {
        if days == 0 || days > MAX_HISTORY_DAYS {
            return Err(MarketDataError::invalid_input(format!(
                "days must be between 1 and {}",
                MAX_HISTORY_DAYS
            )));
        }

        let end = Utc::now().timestamp_millis();
        let start = end - i64::from(days) * DAY_MS;
        let candles = self
            .sources
            .volatility
            .fetch_volatility_index(currency, start, end)
            .await?;

        let points = volatility_history(&candles);
        info!(rows = candles.len(), points = points.len(), "Volatility history computed");
        Ok(points)
    }

    /// Open interest, long/short and funding history for a futures symbol.
    ///
    /// Sections fail independently; only a total failure is an error.
    #[instrument(skip(self))]
    pub async fn futures_metrics(&self, symbol: &str) -> Result<FuturesReport> {
        let symbol = futures_symbol(symbol);
        let futures = &self.sources.futures;

        let (oi, oi_history, ls_history, funding) = tokio::join!(
            futures.open_interest(&symbol),
            futures.open_interest_history(&symbol),
            futures.long_short_ratio_history(&symbol),
            futures.funding_rate_history(&symbol),
        );

        let current_oi = best_effort("open interest", &symbol, oi);
        let oi_history = best_effort("open interest history", &symbol, oi_history);

        let report = FuturesReport {
            current_oi,
            oi_change_4h: current_oi
                .zip(oi_history.as_deref())
                .map(|(current, history)| oi_change_4h(current, history)),
            oi_history: oi_history.as_deref().map(open_interest_chart),
            long_short_history: best_effort("long/short ratio", &symbol, ls_history)
                .as_deref()
                .map(long_short_chart),
            funding_history: best_effort("funding history", &symbol, funding)
                .as_deref()
                .map(funding_chart),
        };

        if report.is_empty() {
            return Err(MarketDataError::DataNotAvailable(format!(
                "no futures data for {}",
                symbol
            )));
        }
        Ok(report)
    }
}
