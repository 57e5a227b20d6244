//! Cross-venue futures sentiment
//!
//! Pure shaping of futures-venue data into the fields merged into the
//! derivatives metrics and the futures metrics view.

use crate::source::{
    DailyKline, FundingRatePoint, LongShortPoint, OpenInterestPoint,
};
use chrono::DateTime;
use serde::Serialize;

/// 48 five-minute points
pub const OI_LOOKBACK_POINTS: usize = 48;

/// History points returned to the chart views
pub const HISTORY_POINTS: usize = 50;

/// Percent change of `current` against the open interest 4h ago.
///
/// Zero when the history is shorter than 4h or the old value is not positive.
pub fn oi_change_4h(current: f64, history: &[OpenInterestPoint]) -> f64 {
    if history.len() < OI_LOOKBACK_POINTS {
        return 0.0;
    }
    let old = history[history.len() - OI_LOOKBACK_POINTS].open_interest;
    if old > 0.0 {
        (current - old) / old * 100.0
    } else {
        0.0
    }
}

/// Highest high and lowest low across the given klines
pub fn weekly_range(klines: &[DailyKline]) -> Option<(f64, f64)> {
    let high = klines.iter().map(|k| k.high).reduce(f64::max)?;
    let low = klines.iter().map(|k| k.low).reduce(f64::min)?;
    Some((high, low))
}

/// `HH:MM:SS` (UTC) of a millisecond timestamp
pub fn clock_time(ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(ms).map(|t| t.format("%H:%M:%S").to_string())
}

fn minute_label(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenInterestHistoryPoint {
    pub timestamp: i64,
    pub date: String,
    pub open_interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongShortHistoryPoint {
    pub timestamp: i64,
    pub date: String,
    pub long_short_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingHistoryPoint {
    pub timestamp: i64,
    pub date: String,
    /// Percent
    pub funding_rate: f64,
}

/// Last [`HISTORY_POINTS`] open interest points
pub fn open_interest_chart(history: &[OpenInterestPoint]) -> Vec<OpenInterestHistoryPoint> {
    tail(history, HISTORY_POINTS)
        .iter()
        .map(|p| OpenInterestHistoryPoint {
            timestamp: p.timestamp,
            date: minute_label(p.timestamp),
            open_interest: p.open_interest,
        })
        .collect()
}

/// Last [`HISTORY_POINTS`] long/short ratio points
pub fn long_short_chart(history: &[LongShortPoint]) -> Vec<LongShortHistoryPoint> {
    tail(history, HISTORY_POINTS)
        .iter()
        .map(|p| LongShortHistoryPoint {
            timestamp: p.timestamp,
            date: minute_label(p.timestamp),
            long_short_ratio: p.long_short_ratio,
        })
        .collect()
}

/// Funding history with rates converted to percent
pub fn funding_chart(history: &[FundingRatePoint]) -> Vec<FundingHistoryPoint> {
    history
        .iter()
        .map(|p| FundingHistoryPoint {
            timestamp: p.funding_time,
            date: minute_label(p.funding_time),
            funding_rate: p.funding_rate * 100.0,
        })
        .collect()
}
