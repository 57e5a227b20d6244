//! End-to-end tests of the derivatives router against in-memory upstreams.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use market_data::api::derivatives_routes;
use market_data::source::{
    DailyKline, FundingRatePoint, FuturesDataSource, LongShortPoint, OpenInterestPoint,
    OptionChainSource, OrderBookSource, PremiumIndex, RawOrderBook, VolatilityCandle,
    VolatilityIndexSource,
};
use market_data::{
    DerivativesService, MarketDataError, OrderBookLevel, Result, ServiceSettings, Sources,
};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

#[derive(Default)]
struct FakeDeribit {
    summary_calls: AtomicUsize,
    down: AtomicBool,
}

#[async_trait]
impl OptionChainSource for FakeDeribit {
    async fn fetch_book_summary(&self, currency: &str) -> Result<Vec<Value>> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(MarketDataError::upstream("deribit", "503 Service Unavailable"));
        }
        if currency == "SOL" {
            return Ok(vec![]);
        }
        Ok(vec![
            json!({"instrument_name": "BTC-01JAN25-50000-C", "open_interest": 10, "volume": 1, "mark_iv": 50, "underlying_price": 49000}),
            json!({"instrument_name": "BTC-01JAN25-50000-P", "open_interest": 5, "volume": 2, "mark_iv": 55, "underlying_price": 49000}),
            json!({"instrument_name": "BTC-28MAR25-60000-C", "open_interest": 4, "volume": 0, "underlying_price": 49000}),
            json!({"instrument_name": "BTC-PERPETUAL", "open_interest": 999}),
        ])
    }
}

#[async_trait]
impl OrderBookSource for FakeDeribit {
    async fn fetch_order_book(&self, _currency: &str, _depth: usize) -> Result<RawOrderBook> {
        if self.down.load(Ordering::SeqCst) {
            return Err(MarketDataError::upstream("deribit", "timeout"));
        }
        Ok(RawOrderBook {
            bids: vec![
                OrderBookLevel::new(dec!(64995.5), dec!(1000)),
                OrderBookLevel::new(dec!(64991), dec!(500)),
                OrderBookLevel::new(dec!(64989), dec!(250)),
            ],
            asks: vec![
                OrderBookLevel::new(dec!(65000.5), dec!(700)),
                OrderBookLevel::new(dec!(65004), dec!(300)),
            ],
            timestamp: Some(1_735_689_600_000),
        })
    }
}

#[async_trait]
impl VolatilityIndexSource for FakeDeribit {
    async fn fetch_volatility_index(
        &self,
        _currency: &str,
        start_ms: i64,
        _end_ms: i64,
    ) -> Result<Vec<VolatilityCandle>> {
        Ok((0..8)
            .map(|d| VolatilityCandle {
                timestamp: start_ms + d * 86_400_000,
                open: 50.0,
                high: 52.0,
                low: 49.0,
                close: 50.0 + d as f64,
            })
            .collect())
    }
}

/// Futures venue that is completely unreachable
struct DownFutures;

#[async_trait]
impl FuturesDataSource for DownFutures {
    async fn open_interest(&self, _s: &str) -> Result<f64> {
        Err(MarketDataError::upstream("binance_futures", "timeout"))
    }
    async fn open_interest_history(&self, _s: &str) -> Result<Vec<OpenInterestPoint>> {
        Err(MarketDataError::upstream("binance_futures", "timeout"))
    }
    async fn long_short_ratio_history(&self, _s: &str) -> Result<Vec<LongShortPoint>> {
        Err(MarketDataError::upstream("binance_futures", "timeout"))
    }
    async fn premium_index(&self, _s: &str) -> Result<PremiumIndex> {
        Err(MarketDataError::upstream("binance_futures", "timeout"))
    }
    async fn funding_rate_history(&self, _s: &str) -> Result<Vec<FundingRatePoint>> {
        Err(MarketDataError::upstream("binance_futures", "timeout"))
    }
    async fn daily_klines(&self, _s: &str) -> Result<Vec<DailyKline>> {
        Err(MarketDataError::upstream("binance_futures", "timeout"))
    }
}

/// Futures venue answering everything
struct UpFutures;

#[async_trait]
impl FuturesDataSource for UpFutures {
    async fn open_interest(&self, _s: &str) -> Result<f64> {
        Ok(80_000.0)
    }
    async fn open_interest_history(&self, _s: &str) -> Result<Vec<OpenInterestPoint>> {
        Ok((0..60)
            .map(|i| OpenInterestPoint { timestamp: i * 300_000, open_interest: 64_000.0 })
            .collect())
    }
    async fn long_short_ratio_history(&self, _s: &str) -> Result<Vec<LongShortPoint>> {
        Ok(vec![LongShortPoint { timestamp: 0, long_short_ratio: 1.5 }])
    }
    async fn premium_index(&self, _s: &str) -> Result<PremiumIndex> {
        Ok(PremiumIndex {
            mark_price: 95_000.0,
            last_funding_rate: 0.0001,
            // 2025-01-01T16:00:00Z
            next_funding_time: 1_735_747_200_000,
        })
    }
    async fn funding_rate_history(&self, _s: &str) -> Result<Vec<FundingRatePoint>> {
        Ok(vec![FundingRatePoint { funding_time: 0, funding_rate: 0.0002 }])
    }
    async fn daily_klines(&self, _s: &str) -> Result<Vec<DailyKline>> {
        Ok(vec![
            DailyKline { open_time: 0, high: 96_000.0, low: 91_000.0, close: 95_000.0 },
            DailyKline { open_time: 1, high: 99_000.0, low: 93_000.0, close: 98_000.0 },
        ])
    }
}

fn app_with(deribit: Arc<FakeDeribit>, futures: Arc<dyn FuturesDataSource>) -> Router {
    let sources = Sources {
        options: deribit.clone(),
        order_books: deribit.clone(),
        volatility: deribit,
        futures,
    };
    let settings = ServiceSettings {
        supported_currencies: vec!["BTC".into(), "ETH".into(), "SOL".into()],
        ..Default::default()
    };
    derivatives_routes(Arc::new(DerivativesService::new(sources, settings)))
}

fn app(deribit: Arc<FakeDeribit>) -> Router {
    app_with(deribit, Arc::new(DownFutures))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_expirations_sorted_and_counted() {
    let (status, body) = get(app(Arc::default()), "/api/expirations/btc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["currency"], "BTC");
    assert_eq!(body["data"], json!(["2025-01-01", "2025-03-28"]));
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_options_grouped_by_expiry() {
    let (status, body) = get(app(Arc::default()), "/api/derivatives/options/BTC").await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["expiry_dates"], json!(["2025-01-01", "2025-03-28"]));
    assert_eq!(data["expiry_data"]["2025-01-01"]["strikes"], json!([50000]));
    assert_eq!(data["expiry_data"]["2025-01-01"]["options_count"], 2);
    assert_eq!(data["expiry_data"]["2025-01-01"]["total_oi"], 15.0);
    assert_eq!(data["raw_data"].as_array().map(Vec::len), Some(3));
    assert_eq!(data["raw_data"][0]["instrument_name"], "BTC-01JAN25-50000-C");
    assert_eq!(data["raw_data"][0]["type"], "C");
    assert_eq!(data["raw_data"][0]["greeks"]["delta"], 0.0);
    assert_eq!(data["dropped_rows"], 1);
}

#[tokio::test]
async fn test_metrics_for_single_expiry() {
    let (status, body) = get(
        app(Arc::default()),
        "/api/derivatives/metrics/btc?expiry_date=2025-01-01",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["call_oi"], 10.0);
    assert_eq!(data["put_oi"], 5.0);
    assert_eq!(data["total_oi"], 15.0);
    assert_eq!(data["put_call_ratio_oi"], 0.5);
    assert_eq!(data["max_pain"], 50000);
    assert_eq!(data["notional_value_usd"], 735_000.0);
    assert_eq!(data["underlying_price"], 49000.0);
    // Futures venue is down: enrichments are omitted, not errors
    assert!(data.get("funding_rate").is_none());
    assert!(data.get("binance_oi").is_none());
    assert!(data["timestamp"].is_string());
}

#[tokio::test]
async fn test_metrics_with_enrichment() {
    let app = app_with(Arc::default(), Arc::new(UpFutures));
    let (status, body) = get(app, "/api/derivatives/metrics/BTC").await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_oi"], 19.0);
    assert_eq!(data["binance_oi"], 80_000.0);
    assert_eq!(data["oi_change_4h"], 25.0);
    assert_eq!(data["funding_rate"], 0.01);
    assert_eq!(data["next_funding_time"], "16:00:00");
    assert_eq!(data["mark_price"], 95_000.0);
    assert_eq!(data["week_high"], 99_000.0);
    assert_eq!(data["week_low"], 91_000.0);
}

#[tokio::test]
async fn test_metrics_bad_expiry_is_400() {
    let (status, body) = get(
        app(Arc::default()),
        "/api/derivatives/metrics/BTC?expiry_date=tomorrow",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("expiry_date"));
}

#[tokio::test]
async fn test_empty_snapshot_metrics_are_zero() {
    let (status, body) = get(app(Arc::default()), "/api/derivatives/metrics/sol").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_oi"], 0.0);
    assert_eq!(body["data"]["max_pain"], 0);
    assert_eq!(body["data"]["put_call_ratio_oi"], 0.0);
}

#[tokio::test]
async fn test_upstream_failure_is_500_json() {
    let deribit = Arc::new(FakeDeribit::default());
    deribit.down.store(true, Ordering::SeqCst);
    let (status, body) = get(app(deribit), "/api/derivatives/metrics/BTC").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("deribit"));
}

#[tokio::test]
async fn test_snapshot_is_cached_across_endpoints() {
    let deribit = Arc::new(FakeDeribit::default());
    let router = app(deribit.clone());

    get(router.clone(), "/api/expirations/BTC").await;
    get(router.clone(), "/api/derivatives/options/btc").await;
    get(router, "/api/derivatives/metrics/BTC").await;

    assert_eq!(deribit.summary_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_order_book_bucketed() {
    let (status, body) = get(
        app(Arc::default()),
        "/api/derivatives/orderbook/btc?level=10",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["bids"], json!([[64990.0, 1500.0], [64980.0, 250.0]]));
    assert_eq!(data["asks"], json!([[65010.0, 1000.0]]));
    assert_eq!(data["timestamp"], 1_735_689_600_000i64);
}

#[tokio::test]
async fn test_order_book_default_level_is_raw() {
    let (_, body) = get(app(Arc::default()), "/api/derivatives/orderbook/btc").await;
    assert_eq!(body["data"]["bids"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["data"]["bids"][0], json!([64995.5, 1000.0]));
}

#[tokio::test]
async fn test_order_book_bad_level_is_400() {
    let (status, body) = get(
        app(Arc::default()),
        "/api/derivatives/orderbook/btc?level=abc",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_order_book_upstream_failure_is_empty_200() {
    let deribit = Arc::new(FakeDeribit::default());
    deribit.down.store(true, Ordering::SeqCst);
    let (status, body) = get(app(deribit), "/api/derivatives/orderbook/btc?level=10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bids"], json!([]));
    assert_eq!(body["data"]["asks"], json!([]));
    assert!(body["data"]["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_volatility_history() {
    let (status, body) = get(
        app(Arc::default()),
        "/api/derivatives/volatility-history/btc?days=30",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["currency"], "BTC");
    assert_eq!(data["days"], 30);
    let points = data["data"].as_array().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["volatility"], 56.0);
    assert_eq!(points[0]["sma_7"], 53.0);
}

#[tokio::test]
async fn test_futures_metrics() {
    let app = app_with(Arc::default(), Arc::new(UpFutures));
    let (status, body) = get(app, "/api/derivatives/binance-metrics/btc").await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["current_oi"], 80_000.0);
    assert_eq!(data["oi_history"].as_array().map(Vec::len), Some(50));
    assert_eq!(data["long_short_history"][0]["long_short_ratio"], 1.5);
    assert_eq!(data["funding_history"][0]["funding_rate"], 0.02);
    assert_eq!(data["funding_history"][0]["date"], "1970-01-01 00:00");
}

#[tokio::test]
async fn test_futures_metrics_all_down_is_500() {
    let (status, body) = get(app(Arc::default()), "/api/derivatives/binance-metrics/btc").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_invalid_currency_is_400() {
    let (status, _) = get(app(Arc::default()), "/api/expirations/BTC%2DPERP").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_currency_is_400() {
    let deribit = Arc::new(FakeDeribit::default());
    let (status, body) = get(app(deribit.clone()), "/api/derivatives/metrics/doge").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("DOGE"));
    assert_eq!(deribit.summary_calls.load(Ordering::SeqCst), 0);
}
