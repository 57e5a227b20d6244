//! Market data error types

use thiserror::Error;

/// Errors that can occur during market data operations
#[derive(Error, Debug, Clone)]
pub enum MarketDataError {
    /// Upstream exchange could not be reached, timed out or answered non-2xx
    #[error("Upstream {provider} unavailable: {message}")]
    Upstream { provider: String, message: String },

    /// Upstream answered, but the body could not be decoded
    #[error("Failed to decode {provider} response: {message}")]
    Decode { provider: String, message: String },

    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Bad client input (query parameter, path segment)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Data not available
    #[error("Data not available: {0}")]
    DataNotAvailable(String),
}

impl MarketDataError {
    /// Create an upstream error
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// True when the failure came from an upstream provider rather than the caller
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Decode { .. })
    }
}

impl From<MarketDataError> for common::Error {
    fn from(err: MarketDataError) -> Self {
        match err {
            MarketDataError::InvalidInput(_) | MarketDataError::InvalidSymbol(_) => {
                common::Error::invalid_input(err.to_string())
            }
            MarketDataError::Upstream { .. } | MarketDataError::Decode { .. } => {
                common::Error::upstream(err.to_string())
            }
            MarketDataError::DataNotAvailable(_) => common::Error::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_upstream() {
        assert!(MarketDataError::upstream("deribit", "timeout").is_upstream());
        assert!(MarketDataError::decode("deribit", "eof").is_upstream());
        assert!(!MarketDataError::invalid_input("level").is_upstream());
    }

    #[test]
    fn test_common_error_status() {
        let err: common::Error = MarketDataError::invalid_input("level must be numeric").into();
        assert_eq!(err.status_code(), 400);

        let err: common::Error = MarketDataError::upstream("deribit", "502 Bad Gateway").into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("deribit"));

        let err: common::Error = MarketDataError::DataNotAvailable("BTCUSDT".into()).into();
        assert_eq!(err.status_code(), 500);
    }
}
