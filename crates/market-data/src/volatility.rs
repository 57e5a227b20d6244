//! Volatility index history with a simple moving average

use crate::source::VolatilityCandle;
use chrono::DateTime;
use serde::Serialize;

/// Moving average window in daily rows
pub const SMA_WINDOW: usize = 7;

/// Default lookback for the volatility history endpoint
pub const DEFAULT_HISTORY_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityPoint {
    /// Milliseconds since epoch
    pub timestamp: i64,
    pub date: String,
    pub volatility: f64,
    pub sma_7: f64,
}

/// Daily close series with a trailing 7-row average.
///
/// Rows are ordered by timestamp first; rows without a full window are dropped.
pub fn volatility_history(candles: &[VolatilityCandle]) -> Vec<VolatilityPoint> {
    let mut sorted = candles.to_vec();
    sorted.sort_by_key(|c| c.timestamp);

    sorted
        .windows(SMA_WINDOW)
        .filter_map(|window| {
            let last = window.last()?;
            let date = DateTime::from_timestamp_millis(last.timestamp)?;
            let sma = window.iter().map(|c| c.close).sum::<f64>() / SMA_WINDOW as f64;
            Some(VolatilityPoint {
                timestamp: last.timestamp,
                date: date.format("%Y-%m-%d").to_string(),
                volatility: last.close,
                sma_7: sma,
            })
        })
        .collect()
}
