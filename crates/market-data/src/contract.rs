//! Contract parser
//!
//! Turns raw option book-summary rows into a typed [`Snapshot`]. Parsing is
//! parse-or-drop: every numeric field is coerced to an optional value and a row
//! is rejected (and counted) when its identifier or strike cannot be decoded.

use crate::types::{Greeks, OptionContract, OptionType, Snapshot};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, info};

/// Why a raw row was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingName,
    TooFewParts,
    BadExpiry,
    BadStrike,
    BadType,
}

/// Decoded `{CCY}-{DDMMMYY}-{STRIKE}-{C|P}` identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentName {
    pub currency: String,
    pub expiry: NaiveDate,
    pub strike: u64,
    pub option_type: OptionType,
}

/// Parse an option instrument identifier such as `BTC-11JUL25-60000-C`.
pub fn parse_instrument_name(name: &str) -> Result<InstrumentName, Rejection> {
    let parts: Vec<&str> = name.split('-').collect();
    if parts.len() < 4 {
        return Err(Rejection::TooFewParts);
    }

    let expiry = parse_expiry(parts[1]).ok_or(Rejection::BadExpiry)?;
    let strike = parse_strike(parts[2]).ok_or(Rejection::BadStrike)?;
    let option_type = OptionType::from_code(parts[3]).ok_or(Rejection::BadType)?;

    Ok(InstrumentName {
        currency: parts[0].to_string(),
        expiry,
        strike,
        option_type,
    })
}

/// Parse a `DDMMMYY` expiry token (`1JAN25`, `11JUL25`). Years are 2000-based.
pub fn parse_expiry(token: &str) -> Option<NaiveDate> {
    let split = token.find(|c: char| c.is_ascii_alphabetic())?;
    let (day, rest) = token.split_at(split);
    if day.is_empty() || day.len() > 2 || rest.len() != 5 {
        return None;
    }
    let (month, year) = rest.split_at(3);

    let day: u32 = day.parse().ok()?;
    let month = month_number(month)?;
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;

    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev.to_ascii_uppercase().as_str() {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    Some(month)
}

/// Strike must be a positive integer price level
fn parse_strike(token: &str) -> Option<u64> {
    let value: f64 = token.parse().ok()?;
    if !value.is_finite() || value < 1.0 {
        return None;
    }
    Some(value.trunc() as u64)
}

/// Coerce a JSON number or numeric string into a finite `f64`.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Coerce a JSON number or numeric string into an exact `Decimal`.
pub fn coerce_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn field(row: &Value, key: &str) -> Option<f64> {
    row.get(key).and_then(coerce_f64)
}

fn parse_greeks(row: &Value) -> Greeks {
    match row.get("greeks") {
        Some(greeks @ Value::Object(_)) => Greeks {
            delta: field(greeks, "delta").unwrap_or_default(),
            gamma: field(greeks, "gamma").unwrap_or_default(),
            vega: field(greeks, "vega").unwrap_or_default(),
            theta: field(greeks, "theta").unwrap_or_default(),
        },
        _ => Greeks::default(),
    }
}

/// Parse one raw row
pub fn parse_contract(row: &Value) -> Result<OptionContract, Rejection> {
    let name = row
        .get("instrument_name")
        .and_then(Value::as_str)
        .ok_or(Rejection::MissingName)?;
    let parsed = parse_instrument_name(name)?;

    Ok(OptionContract {
        instrument_id: name.to_string(),
        expiration_date: parsed.expiry,
        strike: parsed.strike,
        option_type: parsed.option_type,
        open_interest: field(row, "open_interest").unwrap_or_default().max(0.0),
        volume: field(row, "volume").unwrap_or_default().max(0.0),
        mark_iv: field(row, "mark_iv"),
        underlying_price: field(row, "underlying_price"),
        greeks: parse_greeks(row),
    })
}

/// Build a snapshot from raw rows, dropping and counting malformed ones.
pub fn parse_snapshot(currency: &str, rows: &[Value], captured_at: DateTime<Utc>) -> Snapshot {
    let mut contracts = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        match parse_contract(row) {
            Ok(contract) => contracts.push(contract),
            Err(reason) => {
                dropped += 1;
                let instrument = row
                    .get("instrument_name")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("<missing>");
                debug!(
                    currency,
                    instrument,
                    ?reason,
                    "Dropped malformed option row"
                );
            }
        }
    }

    if dropped > 0 {
        info!(currency, contracts = contracts.len(), dropped, "Parsed option snapshot with dropped rows");
    }

    Snapshot {
        currency: currency.to_uppercase(),
        contracts,
        dropped,
        captured_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_instrument_name() {
        let parsed = parse_instrument_name("BTC-11JUL25-60000-C").unwrap();
        assert_eq!(parsed.currency, "BTC");
        assert_eq!(parsed.expiry, NaiveDate::from_ymd_opt(2025, 7, 11).unwrap());
        assert_eq!(parsed.strike, 60000);
        assert_eq!(parsed.option_type, OptionType::Call);
    }

    #[test]
    fn test_parse_single_digit_day() {
        let parsed = parse_instrument_name("ETH-1JAN25-3000-P").unwrap();
        assert_eq!(parsed.expiry, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(parsed.option_type, OptionType::Put);
    }

    #[test]
    fn test_reject_malformed_names() {
        assert_eq!(parse_instrument_name("BTC-PERPETUAL"), Err(Rejection::TooFewParts));
        assert_eq!(parse_instrument_name("BTC-32JAN25-100-C"), Err(Rejection::BadExpiry));
        assert_eq!(parse_instrument_name("BTC-01XYZ25-100-C"), Err(Rejection::BadExpiry));
        assert_eq!(parse_instrument_name("BTC-01JAN25-abc-C"), Err(Rejection::BadStrike));
        assert_eq!(parse_instrument_name("BTC-01JAN25-0-C"), Err(Rejection::BadStrike));
        assert_eq!(parse_instrument_name("BTC-01JAN25-100-X"), Err(Rejection::BadType));
    }

    #[test]
    fn test_coerce_numbers_and_strings() {
        assert_eq!(coerce_f64(&json!(10)), Some(10.0));
        assert_eq!(coerce_f64(&json!("2.5")), Some(2.5));
        assert_eq!(coerce_f64(&json!("n/a")), None);
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!([1])), None);
    }

    #[test]
    fn test_coerce_decimal() {
        assert_eq!(coerce_decimal(&json!(65000.5)), Decimal::from_str("65000.5").ok());
        assert_eq!(coerce_decimal(&json!("0.001")), Decimal::from_str("0.001").ok());
        assert_eq!(coerce_decimal(&json!(1e-5)), Decimal::from_str("0.00001").ok());
        assert_eq!(coerce_decimal(&json!(true)), None);
    }

    #[test]
    fn test_greeks_default_when_absent_or_not_mapping() {
        let row = json!({"instrument_name": "BTC-01JAN25-50000-C", "greeks": "oops"});
        let contract = parse_contract(&row).unwrap();
        assert_eq!(contract.greeks, Greeks::default());

        let row = json!({
            "instrument_name": "BTC-01JAN25-50000-C",
            "greeks": {"delta": 0.5, "gamma": "0.01", "vega": 12.0}
        });
        let contract = parse_contract(&row).unwrap();
        assert_eq!(contract.greeks.delta, 0.5);
        assert_eq!(contract.greeks.gamma, 0.01);
        assert_eq!(contract.greeks.vega, 12.0);
        assert_eq!(contract.greeks.theta, 0.0);
    }

    #[test]
    fn test_parse_snapshot_counts_dropped_rows() {
        let rows = vec![
            json!({"instrument_name": "BTC-01JAN25-50000-C", "open_interest": 10, "volume": 1, "mark_iv": 50, "underlying_price": 49000}),
            json!({"instrument_name": "BTC-01JAN25-50000-P", "open_interest": 5, "volume": 2, "mark_iv": 55, "underlying_price": 49000}),
            json!({"instrument_name": "BTC-PERPETUAL"}),
            json!({"open_interest": 3}),
        ];

        let snapshot = parse_snapshot("btc", &rows, Utc::now());
        assert_eq!(snapshot.currency, "BTC");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.dropped, 2);
        for contract in &snapshot.contracts {
            assert_eq!(contract.expiration_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
            assert_eq!(contract.strike, 50000);
        }
        assert_eq!(snapshot.contracts[0].open_interest, 10.0);
        assert_eq!(snapshot.contracts[1].mark_iv, Some(55.0));
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_dropped_rows_logged_with_instrument() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let rows = vec![json!({"instrument_name": "BTC-PERPETUAL"}), json!({"open_interest": 3})];
        let snapshot = tracing::subscriber::with_default(subscriber, || {
            parse_snapshot("BTC", &rows, Utc::now())
        });
        assert_eq!(snapshot.dropped, 2);

        let logged = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logged.matches("Dropped malformed option row").count(), 2);
        assert!(logged.contains("BTC-PERPETUAL"));
        assert!(logged.contains("<missing>"));
    }

    #[test]
    fn test_missing_numbers_become_zero_or_none() {
        let row = json!({"instrument_name": "BTC-01JAN25-50000-C", "open_interest": "bad"});
        let contract = parse_contract(&row).unwrap();
        assert_eq!(contract.open_interest, 0.0);
        assert_eq!(contract.volume, 0.0);
        assert_eq!(contract.mark_iv, None);
        assert_eq!(contract.underlying_price, None);
    }
}
