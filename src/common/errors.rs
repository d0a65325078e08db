//! Error types for the execution router

use thiserror::Error;

/// Result type alias using our BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for exchange execution
#[derive(Error, Debug)]
pub enum BridgeError {
    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Request signing errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Explicit rejection returned by an exchange
    #[error("{message} ({code})")]
    Exchange { code: i64, message: String },

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Trade intent failed validation
    #[error("Invalid trade intent: {0}")]
    InvalidIntent(String),

    /// Order quantity rounded down to zero
    #[error("Qty too small for {symbol}")]
    QuantityTooSmall { symbol: String },

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Build an exchange rejection from a code/message pair
    pub fn exchange(code: i64, message: impl Into<String>) -> Self {
        BridgeError::Exchange {
            code,
            message: message.into(),
        }
    }

    /// Whether this failure is a sizing failure rather than a transport/API one
    pub fn is_sizing_failure(&self) -> bool {
        matches!(self, BridgeError::QuantityTooSmall { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_error_is_verbatim() {
        let err = BridgeError::exchange(-2019, "Margin is insufficient.");
        assert_eq!(err.to_string(), "Margin is insufficient. (-2019)");
        assert!(!err.is_sizing_failure());
    }

    #[test]
    fn test_quantity_too_small() {
        let err = BridgeError::QuantityTooSmall {
            symbol: "BTCUSDT".to_string(),
        };
        assert!(err.is_sizing_failure());
        assert_eq!(err.to_string(), "Qty too small for BTCUSDT");
    }
}
