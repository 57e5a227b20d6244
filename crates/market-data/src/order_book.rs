//! Order-book aggregator
//!
//! Buckets raw price levels into fixed price steps using exact decimal
//! arithmetic. Bids round down to the bucket floor, asks round up to the
//! bucket ceiling, so a bucketed price never looks better than the raw one.

use crate::types::{AggregatedOrderBook, BookSide, OrderBookLevel};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Default number of levels kept per side after aggregation
pub const DEFAULT_DISPLAY_DEPTH: usize = 20;

/// Bucket a price for the given side. `step` must be positive.
///
/// Computed from the exact remainder, never from a rounded quotient. When the
/// arithmetic would overflow the raw price is kept.
pub fn bucket_price(price: Decimal, step: Decimal, side: BookSide) -> Decimal {
    checked_bucket(price, step, side)
        .unwrap_or(price)
        .normalize()
}

fn checked_bucket(price: Decimal, step: Decimal, side: BookSide) -> Option<Decimal> {
    // Remainder carries the sign of `price`; shift it into [0, step)
    let mut rem = price.checked_rem(step)?;
    if rem < Decimal::ZERO {
        rem = rem.checked_add(step)?;
    }
    if rem.is_zero() {
        return Some(price);
    }

    match side {
        BookSide::Bid => price.checked_sub(rem),
        BookSide::Ask => price.checked_add(step.checked_sub(rem)?),
    }
}

fn aggregate_side(levels: &[OrderBookLevel], step: Decimal, side: BookSide) -> Vec<OrderBookLevel> {
    let mut buckets: BTreeMap<Decimal, Decimal> = BTreeMap::new();
    for level in levels {
        *buckets
            .entry(bucket_price(level.price, step, side))
            .or_insert(Decimal::ZERO) += level.quantity;
    }

    let levels = buckets
        .into_iter()
        .map(|(price, quantity)| OrderBookLevel::new(price, quantity.normalize()));

    match side {
        BookSide::Bid => levels.rev().collect(),
        BookSide::Ask => levels.collect(),
    }
}

/// Aggregate raw levels into `step`-wide buckets and keep `depth` levels per side.
///
/// A non-positive `step` passes the levels through unchanged apart from the
/// depth cut. Truncation always happens after bucketing.
pub fn aggregate(
    bids: &[OrderBookLevel],
    asks: &[OrderBookLevel],
    step: Decimal,
    depth: usize,
) -> AggregatedOrderBook {
    let (mut bids, mut asks) = if step > Decimal::ZERO {
        (
            aggregate_side(bids, step, BookSide::Bid),
            aggregate_side(asks, step, BookSide::Ask),
        )
    } else {
        (bids.to_vec(), asks.to_vec())
    };

    bids.truncate(depth);
    asks.truncate(depth);

    AggregatedOrderBook { bids, asks }
}
