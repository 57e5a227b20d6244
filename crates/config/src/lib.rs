//! Configuration for the TradingRoad derivatives service
//!
//! A single YAML file, `${VAR}` substitution on load, serde defaults for every
//! field and a validation pass that reports errors, warnings and applied
//! defaults separately.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Root of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub derivatives: DerivativesConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            environment: default_environment(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Permissive CORS for browser clients on another origin
    #[serde(default = "default_enabled")]
    pub cors_allow_any_origin: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            request_timeout_seconds: default_request_timeout_seconds(),
            cors_allow_any_origin: default_enabled(),
        }
    }
}

impl ServerSection {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// pretty, json or compact
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Prometheus exporter port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

/// One upstream REST API
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Options venue: chains, order books, volatility index
    #[serde(default = "default_deribit")]
    pub deribit: ProviderConfig,
    /// Futures venue: open interest, funding, long/short ratio
    #[serde(default = "default_binance_futures")]
    pub binance_futures: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            deribit: default_deribit(),
            binance_futures: default_binance_futures(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Lifetime of an option-chain snapshot
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DerivativesConfig {
    #[serde(default = "default_supported_currencies")]
    pub supported_currencies: Vec<String>,
    /// Levels requested from the venue per side
    #[serde(default = "default_order_book_fetch_depth")]
    pub order_book_fetch_depth: usize,
    /// Levels returned per side after aggregation
    #[serde(default = "default_order_book_display_depth")]
    pub order_book_display_depth: usize,
    /// Snapshots with at least this many rows are served without `raw_data`
    #[serde(default = "default_raw_data_limit")]
    pub raw_data_limit: usize,
}

impl Default for DerivativesConfig {
    fn default() -> Self {
        Self {
            supported_currencies: default_supported_currencies(),
            order_book_fetch_depth: default_order_book_fetch_depth(),
            order_book_display_depth: default_order_book_display_depth(),
            raw_data_limit: default_raw_data_limit(),
        }
    }
}
