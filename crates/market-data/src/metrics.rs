//! Metrics aggregator
//!
//! Derives open-interest totals, put/call ratios, notional value and max-pain
//! from a [`Snapshot`]. Nothing here is cached; callers recompute per request.

use crate::max_pain::max_pain;
use crate::types::{DerivativesMetrics, OptionContract, Snapshot};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-expiry summary used by the options view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpirySummary {
    /// Distinct strikes, ascending
    pub strikes: Vec<u64>,
    pub options_count: usize,
    pub total_oi: f64,
    pub total_volume: f64,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Rows that feed the max-pain calculation.
///
/// A multi-expiry set is narrowed to the nearest expiry on or after `today`;
/// when every expiry is in the past the full set is used.
pub fn max_pain_rows<'a>(rows: &[&'a OptionContract], today: NaiveDate) -> Vec<&'a OptionContract> {
    let nearest = rows
        .iter()
        .map(|c| c.expiration_date)
        .filter(|d| *d >= today)
        .min();
    let spans_many = rows
        .iter()
        .any(|c| rows.first().map(|f| f.expiration_date) != Some(c.expiration_date));

    match nearest {
        Some(expiry) if spans_many => rows
            .iter()
            .copied()
            .filter(|c| c.expiration_date == expiry)
            .collect(),
        _ => rows.to_vec(),
    }
}

/// Compute metrics over `snapshot`, optionally restricted to one expiry.
pub fn compute_metrics(
    snapshot: &Snapshot,
    expiry: Option<NaiveDate>,
    today: NaiveDate,
) -> DerivativesMetrics {
    let rows: Vec<&OptionContract> = snapshot
        .contracts
        .iter()
        .filter(|c| expiry.map_or(true, |e| c.expiration_date == e))
        .collect();

    if rows.is_empty() {
        return DerivativesMetrics::default();
    }

    let mut metrics = DerivativesMetrics::default();
    let mut call_volume = 0.0;
    let mut put_volume = 0.0;

    for c in &rows {
        if c.is_call() {
            metrics.call_oi += c.open_interest;
            call_volume += c.volume;
        } else {
            metrics.put_oi += c.open_interest;
            put_volume += c.volume;
        }
        metrics.notional_value_usd += c.open_interest * c.underlying_price.unwrap_or_default();
    }

    metrics.total_oi = metrics.call_oi + metrics.put_oi;
    metrics.put_call_ratio_oi = ratio(metrics.put_oi, metrics.call_oi);
    metrics.put_call_ratio_volume = ratio(put_volume, call_volume);
    metrics.underlying_price = rows
        .iter()
        .find_map(|c| c.underlying_price)
        .unwrap_or_default();
    metrics.max_pain = max_pain(&max_pain_rows(&rows, today));

    metrics
}

/// Group a snapshot by expiry date, ascending.
pub fn expiry_summary(snapshot: &Snapshot) -> BTreeMap<NaiveDate, ExpirySummary> {
    let mut grouped: BTreeMap<NaiveDate, ExpirySummary> = BTreeMap::new();

    for c in &snapshot.contracts {
        let entry = grouped.entry(c.expiration_date).or_default();
        entry.strikes.push(c.strike);
        entry.options_count += 1;
        entry.total_oi += c.open_interest;
        entry.total_volume += c.volume;
    }

    for summary in grouped.values_mut() {
        summary.strikes.sort_unstable();
        summary.strikes.dedup();
    }

    grouped
}
