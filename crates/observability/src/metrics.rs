//! Prometheus metrics infrastructure
//!
//! This module provides utilities for initializing Prometheus metrics
//! and the metric sets recorded by exchange clients and the snapshot cache.

use metrics::{counter, histogram, Counter, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Initialize the Prometheus metrics exporter
///
/// This starts an HTTP server on the specified port that exposes metrics
/// at the `/metrics` endpoint.
///
/// # Arguments
///
/// * `port` - Port to expose metrics on
///
/// # Example
///
/// ```ignore
/// observability::metrics::init_metrics(9090)?;
/// // Metrics available at http://localhost:9090/metrics
/// ```
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Outcome label of an upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }
}

/// Upstream provider metrics
///
/// One instance per exchange client.
///
/// # Metrics
///
/// * `upstream_requests_total{provider,outcome}` - Calls made to the provider
/// * `upstream_request_duration_seconds{provider}` - Call latency histogram
///
/// # Example
///
/// ```ignore
/// let metrics = UpstreamMetrics::new("deribit");
/// metrics.record_call(Duration::from_millis(120), Outcome::Success);
/// ```
#[derive(Clone)]
pub struct UpstreamMetrics {
    request_duration: Histogram,
    provider: String,
}

impl UpstreamMetrics {
    /// Create metrics for a specific provider (e.g., "deribit", "binance_futures")
    pub fn new(provider: &str) -> Self {
        let name = provider.to_string();

        Self {
            request_duration: histogram!("upstream_request_duration_seconds", "provider" => name.clone()),
            provider: name,
        }
    }

    /// Record a completed call
    pub fn record_call(&self, duration: Duration, outcome: Outcome) {
        counter!(
            "upstream_requests_total",
            "provider" => self.provider.clone(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        self.request_duration.record(duration.as_secs_f64());
    }

    /// Start timing a call; the guard records on drop
    pub fn start_call(&self) -> UpstreamCallGuard<'_> {
        UpstreamCallGuard::new(self)
    }

    /// Get the provider name
    pub fn provider(&self) -> &str {
        &self.provider
    }
}

/// Call metrics guard that automatically records duration on drop
///
/// The outcome defaults to [`Outcome::Error`] so early returns through `?`
/// are counted as failures; call [`UpstreamCallGuard::success`] once the
/// response has been decoded.
pub struct UpstreamCallGuard<'a> {
    metrics: &'a UpstreamMetrics,
    start: Instant,
    outcome: Outcome,
}

impl<'a> UpstreamCallGuard<'a> {
    /// Create a new metrics guard
    pub fn new(metrics: &'a UpstreamMetrics) -> Self {
        Self {
            metrics,
            start: Instant::now(),
            outcome: Outcome::Error,
        }
    }

    /// Mark the call as successful
    pub fn success(&mut self) {
        self.outcome = Outcome::Success;
    }

    /// Time elapsed since the call started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for UpstreamCallGuard<'_> {
    fn drop(&mut self) {
        self.metrics.record_call(self.start.elapsed(), self.outcome);
    }
}

/// Snapshot cache metrics
///
/// # Metrics
///
/// * `snapshot_cache_hits_total{cache}`
/// * `snapshot_cache_misses_total{cache}`
/// * `snapshot_cache_refresh_failures_total{cache}`
#[derive(Clone)]
pub struct CacheMetrics {
    hits: Counter,
    misses: Counter,
    refresh_failures: Counter,
}

impl CacheMetrics {
    pub fn new(cache: &str) -> Self {
        let name = cache.to_string();

        Self {
            hits: counter!("snapshot_cache_hits_total", "cache" => name.clone()),
            misses: counter!("snapshot_cache_misses_total", "cache" => name.clone()),
            refresh_failures: counter!("snapshot_cache_refresh_failures_total", "cache" => name),
        }
    }

    pub fn hit(&self) {
        self.hits.increment(1);
    }

    pub fn miss(&self) {
        self.misses.increment(1);
    }

    pub fn refresh_failed(&self) {
        self.refresh_failures.increment(1);
    }
}
