//! HTTP API for derivatives analytics.
//!
//! ## Modules
//!
//! - `handlers` - Axum handlers over [`DerivativesService`](crate::service::DerivativesService)
//! - `routes` - Router wiring
//! - `models` - Query and response types

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::ApiError;
pub use routes::derivatives_routes;
