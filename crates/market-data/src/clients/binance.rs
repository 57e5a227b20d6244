//! Binance USDⓈ-M futures public REST client

use super::{ClientOptions, JsonApi};
use crate::contract::coerce_f64;
use crate::source::{
    DailyKline, FundingRatePoint, FuturesDataSource, LongShortPoint, OpenInterestPoint,
    PremiumIndex,
};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

pub const PROVIDER: &str = "binance_futures";
pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";

const HISTORY_PERIOD: &str = "5m";
const HISTORY_LIMIT: usize = 48;
const FUNDING_LIMIT: usize = 100;
const KLINE_LIMIT: usize = 7;

#[derive(Clone)]
pub struct BinanceFuturesClient {
    api: JsonApi,
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(coerce_f64)
}

fn integer(value: &Value, key: &str) -> Option<i64> {
    let field = value.get(key)?;
    field
        .as_i64()
        .or_else(|| field.as_str().and_then(|s| s.parse().ok()))
}

fn rows(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or_default()
}

pub(crate) fn parse_open_interest_history(body: &Value) -> Vec<OpenInterestPoint> {
    rows(body)
        .iter()
        .filter_map(|row| {
            Some(OpenInterestPoint {
                timestamp: integer(row, "timestamp")?,
                open_interest: number(row, "sumOpenInterest")?,
            })
        })
        .collect()
}

pub(crate) fn parse_long_short_history(body: &Value) -> Vec<LongShortPoint> {
    rows(body)
        .iter()
        .filter_map(|row| {
            Some(LongShortPoint {
                timestamp: integer(row, "timestamp")?,
                long_short_ratio: number(row, "longShortRatio")?,
            })
        })
        .collect()
}

pub(crate) fn parse_funding_history(body: &Value) -> Vec<FundingRatePoint> {
    rows(body)
        .iter()
        .filter_map(|row| {
            Some(FundingRatePoint {
                funding_time: integer(row, "fundingTime")?,
                funding_rate: number(row, "fundingRate")?,
            })
        })
        .collect()
}

/// Kline arrays: `[openTime, open, high, low, close, volume, ...]`
pub(crate) fn parse_klines(body: &Value) -> Vec<DailyKline> {
    rows(body)
        .iter()
        .filter_map(|row| {
            Some(DailyKline {
                open_time: row.get(0)?.as_i64()?,
                high: coerce_f64(row.get(2)?)?,
                low: coerce_f64(row.get(3)?)?,
                close: coerce_f64(row.get(4)?)?,
            })
        })
        .collect()
}

impl BinanceFuturesClient {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        Ok(Self {
            api: JsonApi::new(PROVIDER, options)?,
        })
    }

    fn symbol_query(symbol: &str) -> (&'static str, String) {
        ("symbol", symbol.to_uppercase())
    }

    fn history_query(symbol: &str) -> [(&'static str, String); 3] {
        [
            Self::symbol_query(symbol),
            ("period", HISTORY_PERIOD.to_string()),
            ("limit", HISTORY_LIMIT.to_string()),
        ]
    }
}

#[async_trait]
impl FuturesDataSource for BinanceFuturesClient {
    #[instrument(skip(self))]
    async fn open_interest(&self, symbol: &str) -> Result<f64> {
        let body = self
            .api
            .get("/fapi/v1/openInterest", &[Self::symbol_query(symbol)])
            .await?;
        number(&body, "openInterest").ok_or_else(|| self.api.decode_error("missing openInterest"))
    }

    #[instrument(skip(self))]
    async fn open_interest_history(&self, symbol: &str) -> Result<Vec<OpenInterestPoint>> {
        let body = self
            .api
            .get("/futures/data/openInterestHist", &Self::history_query(symbol))
            .await?;
        Ok(parse_open_interest_history(&body))
    }

    #[instrument(skip(self))]
    async fn long_short_ratio_history(&self, symbol: &str) -> Result<Vec<LongShortPoint>> {
        let body = self
            .api
            .get("/futures/data/globalLongShortAccountRatio", &Self::history_query(symbol))
            .await?;
        Ok(parse_long_short_history(&body))
    }

    #[instrument(skip(self))]
    async fn premium_index(&self, symbol: &str) -> Result<PremiumIndex> {
        let body = self
            .api
            .get("/fapi/v1/premiumIndex", &[Self::symbol_query(symbol)])
            .await?;

        match (
            number(&body, "markPrice"),
            number(&body, "lastFundingRate"),
            integer(&body, "nextFundingTime"),
        ) {
            (Some(mark_price), Some(last_funding_rate), Some(next_funding_time)) => Ok(PremiumIndex {
                mark_price,
                last_funding_rate,
                next_funding_time,
            }),
            _ => Err(self.api.decode_error("incomplete premiumIndex payload")),
        }
    }

    #[instrument(skip(self))]
    async fn funding_rate_history(&self, symbol: &str) -> Result<Vec<FundingRatePoint>> {
        let body = self
            .api
            .get(
                "/fapi/v1/fundingRate",
                &[Self::symbol_query(symbol), ("limit", FUNDING_LIMIT.to_string())],
            )
            .await?;
        Ok(parse_funding_history(&body))
    }

    #[instrument(skip(self))]
    async fn daily_klines(&self, symbol: &str) -> Result<Vec<DailyKline>> {
        let body = self
            .api
            .get(
                "/fapi/v1/klines",
                &[
                    Self::symbol_query(symbol),
                    ("interval", "1d".to_string()),
                    ("limit", KLINE_LIMIT.to_string()),
                ],
            )
            .await?;
        Ok(parse_klines(&body))
    }
}
