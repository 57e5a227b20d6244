//! Observability infrastructure for TradingRoad
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics
//! - Upstream and cache metric helpers
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("tradingroad", LogFormat::Pretty, "info")?;
//!
//! // Initialize metrics (optional)
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, CacheMetrics, Outcome, UpstreamCallGuard, UpstreamMetrics};
