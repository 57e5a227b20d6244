//! Common types used across TradingRoad

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// JSON envelope returned by every API endpoint
///
/// `{"success": true, "data": ...}` on success,
/// `{"success": false, "error": "..."}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed response carrying an error message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Maximum length of a currency or venue symbol
pub const MAX_SYMBOL_LEN: usize = 20;

/// Normalize a currency / symbol path segment (`btc` -> `BTC`).
///
/// Accepts ASCII letters, digits and `_`, up to [`MAX_SYMBOL_LEN`] characters.
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_SYMBOL_LEN {
        return Err(Error::invalid_input(format!("invalid symbol: {:?}", raw)));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(Error::invalid_input(format!("invalid symbol: {:?}", raw)));
    }
    Ok(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_ok() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1, 2]}));
    }

    #[test]
    fn test_api_response_error() {
        let json = serde_json::to_value(ApiResponse::<()>::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("btc").unwrap(), "BTC");
        assert_eq!(normalize_symbol("BTC_USDC").unwrap(), "BTC_USDC");
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("BTC-PERP").is_err());
        assert!(normalize_symbol("ABCDEFGHIJKLMNOPQRSTUVWXYZ").is_err());
    }
}
