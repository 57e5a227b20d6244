//! Server infrastructure for TradingRoad
//!
//! An Axum HTTP server with lifecycle management and graceful shutdown.
//!
//! # Architecture
//!
//! [`HttpServer`] implements the [`Server`] trait, which provides a consistent
//! interface for running and monitoring servers. The [`ServerExt`] trait
//! provides convenience methods like `spawn()` and `run_with_ctrl_c()`.
//!
//! Shutdown coordination uses `CancellationToken` from `tokio_util`.
//!
//! # Quick Start
//!
//! ```ignore
//! use server::{HttpServer, ServerConfig, ServerExt};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::new("0.0.0.0", 8080);
//!     let router = server::health_routes(HealthState::new("tradingroad", "0.1.0"));
//!     HttpServer::new(config, router).run_with_ctrl_c().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Bind address, request timeout, CORS switch
//! - [`traits`] - `Server` and `ServerExt` traits
//! - [`http`] - HTTP server using Axum and tower-http middleware
//! - [`health`] - `/api/health` endpoint
//! - [`port_validator`] - Early port availability check
//! - [`shutdown`] - Graceful shutdown utilities

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod port_validator;
pub mod shutdown;
pub mod traits;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use health::{health_routes, HealthState, HealthStatus};
pub use http::HttpServer;
pub use port_validator::validate_ports_available;
pub use shutdown::{shutdown_signal, ShutdownController};
pub use traits::{Server, ServerExt};
