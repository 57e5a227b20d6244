//! HTTP request handlers for the derivatives API.

use crate::api::models::*;
use crate::service::DerivativesService;
use crate::volatility::DEFAULT_HISTORY_DAYS;
use crate::MarketDataError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use common::{normalize_symbol, ApiResponse};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

/// Error half of every handler result: status plus `{"success": false, "error"}`
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn api_error(err: impl Into<common::Error>) -> ApiError {
    let err = err.into();
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::warn!(%status, error = %err, "Request failed");
    }
    (status, Json(ApiResponse::error(err.to_string())))
}

fn symbol(raw: &str) -> Result<String, ApiError> {
    normalize_symbol(raw).map_err(api_error)
}

/// Normalized currency that the options venue endpoints accept
fn currency(service: &DerivativesService, raw: &str) -> Result<String, ApiError> {
    let currency = symbol(raw)?;
    service.ensure_supported(&currency).map_err(api_error)?;
    Ok(currency)
}

fn parse_expiry(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                api_error(MarketDataError::invalid_input(format!(
                    "expiry_date must be YYYY-MM-DD, got {:?}",
                    s
                )))
            }),
    }
}

fn parse_level(raw: Option<&str>) -> Result<Decimal, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Decimal::ONE),
        Some(s) => Decimal::from_str(s).map_err(|_| {
            api_error(MarketDataError::invalid_input(format!(
                "level must be numeric, got {:?}",
                s
            )))
        }),
    }
}

fn parse_days(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_HISTORY_DAYS),
        Some(s) => s.parse::<u32>().map_err(|_| {
            api_error(MarketDataError::invalid_input(format!(
                "days must be a positive integer, got {:?}",
                s
            )))
        }),
    }
}

/// GET /api/expirations/:currency
pub async fn get_expirations(
    State(service): State<Arc<DerivativesService>>,
    Path(raw): Path<String>,
) -> Result<Json<ExpirationsResponse>, ApiError> {
    let currency = currency(&service, &raw)?;
    let expiries = service.expirations(&currency).await.map_err(api_error)?;
    Ok(Json(ExpirationsResponse::new(currency, &expiries)))
}

/// GET /api/derivatives/options/:currency
pub async fn get_options(
    State(service): State<Arc<DerivativesService>>,
    Path(raw): Path<String>,
) -> ApiResult<OptionsData> {
    let currency = currency(&service, &raw)?;
    let snapshot = service.snapshot(&currency).await.map_err(api_error)?;
    let data = OptionsData::from_snapshot(&snapshot, service.settings().raw_data_limit);
    Ok(Json(ApiResponse::ok(data)))
}

/// GET /api/derivatives/metrics/:currency?expiry_date=YYYY-MM-DD
pub async fn get_metrics(
    State(service): State<Arc<DerivativesService>>,
    Path(raw): Path<String>,
    Query(params): Query<MetricsParams>,
) -> ApiResult<MetricsData> {
    let currency = currency(&service, &raw)?;
    let expiry = parse_expiry(params.expiry_date.as_deref())?;
    let report = service.metrics(&currency, expiry).await.map_err(api_error)?;
    Ok(Json(ApiResponse::ok(report.into())))
}

/// GET /api/derivatives/orderbook/:currency?level=N
pub async fn get_order_book(
    State(service): State<Arc<DerivativesService>>,
    Path(raw): Path<String>,
    Query(params): Query<OrderBookParams>,
) -> ApiResult<OrderBookData> {
    let currency = currency(&service, &raw)?;
    let level = parse_level(params.level.as_deref())?;
    let report = service.order_book(&currency, level).await;
    Ok(Json(ApiResponse::ok(report.into())))
}

/// GET /api/derivatives/volatility-history/:currency?days=N
pub async fn get_volatility_history(
    State(service): State<Arc<DerivativesService>>,
    Path(raw): Path<String>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<VolatilityHistoryData> {
    let currency = currency(&service, &raw)?;
    let days = parse_days(params.days.as_deref())?;
    let points = service
        .volatility_history(&currency, days)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::ok(VolatilityHistoryData::new(
        currency, days, points,
    ))))
}

/// GET /api/derivatives/binance-metrics/:symbol
pub async fn get_futures_metrics(
    State(service): State<Arc<DerivativesService>>,
    Path(raw): Path<String>,
) -> ApiResult<FuturesMetricsData> {
    let symbol = symbol(&raw)?;
    let report = service.futures_metrics(&symbol).await.map_err(api_error)?;
    Ok(Json(ApiResponse::ok(report.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(None).unwrap(), Decimal::ONE);
        assert_eq!(parse_level(Some("10")).unwrap(), Decimal::from(10));
        assert_eq!(parse_level(Some(" 2.5 ")).unwrap(), Decimal::from_str("2.5").unwrap());
        let (status, body) = parse_level(Some("ten")).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.0.success);
    }

    #[test]
    fn test_parse_expiry() {
        assert_eq!(parse_expiry(None).unwrap(), None);
        assert_eq!(parse_expiry(Some("")).unwrap(), None);
        assert_eq!(
            parse_expiry(Some("2025-06-27")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 27)
        );
        assert_eq!(parse_expiry(Some("27JUN25")).unwrap_err().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days(None).unwrap(), DEFAULT_HISTORY_DAYS);
        assert_eq!(parse_days(Some("30")).unwrap(), 30);
        assert_eq!(parse_days(Some("-1")).unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
