use axum::{routing::get, Router};
use std::sync::Arc;

use super::handlers::*;
use crate::service::DerivativesService;

pub fn derivatives_routes(service: Arc<DerivativesService>) -> Router {
    Router::new()
        .route("/api/expirations/:currency", get(get_expirations))
        .route("/api/derivatives/options/:currency", get(get_options))
        .route("/api/derivatives/metrics/:currency", get(get_metrics))
        .route("/api/derivatives/orderbook/:currency", get(get_order_book))
        .route(
            "/api/derivatives/volatility-history/:currency",
            get(get_volatility_history),
        )
        .route(
            "/api/derivatives/binance-metrics/:symbol",
            get(get_futures_metrics),
        )
        .with_state(service)
}
