//! Cercalia error types

use thiserror::Error;

/// Errors that can occur while talking to the Cercalia API
#[derive(Debug, Error)]
pub enum CercaliaError {
    /// Connection to the Cercalia service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP request failed or returned a non-success status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// API key rejected by the service
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit or quota exceeded at HTTP level
    #[error("Rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimitExceeded {
        /// Seconds to wait before retrying (if provided by API)
        retry_after_secs: Option<u64>,
    },

    /// Request timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The vendor reported that the query matched nothing
    #[error("No results for {operation}")]
    NoResults {
        /// Operation that produced the sentinel
        operation: String,
    },

    /// Any other error code embedded in a vendor response
    #[error("Cercalia error {code} during {operation}: {message}")]
    Vendor {
        /// Operation that produced the error
        operation: String,
        /// Vendor error code
        code: String,
        /// Vendor error message
        message: String,
    },

    /// Input rejected before any request was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Required data missing from an otherwise valid response
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl CercaliaError {
    /// Returns true if repeating the same call could succeed
    ///
    /// Informational only; the client itself never retries.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::RequestFailed(_)
                | Self::Timeout { .. }
                | Self::RateLimitExceeded { .. }
        )
    }

    /// Returns true for the vendor "no results" sentinel
    #[must_use]
    pub const fn is_no_results(&self) -> bool {
        matches!(self, Self::NoResults { .. })
    }

    /// Returns true if the error was raised by local validation
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Convenience alias used throughout the crate
pub type Result<T, E = CercaliaError> = std::result::Result<T, E>;

/// Turn the "no results" sentinel into an empty value
///
/// Search-style operations treat an empty match as a normal outcome.
pub(crate) fn empty_on_no_results<T: Default>(result: Result<T>) -> Result<T> {
    match result {
        Err(CercaliaError::NoResults { operation }) => {
            tracing::debug!(%operation, "No results");
            Ok(T::default())
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(CercaliaError::ConnectionFailed("test".to_string()).is_retryable());
        assert!(CercaliaError::RequestFailed("test".to_string()).is_retryable());
        assert!(CercaliaError::Timeout { timeout_secs: 30 }.is_retryable());
        assert!(
            CercaliaError::RateLimitExceeded {
                retry_after_secs: Some(60)
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!CercaliaError::InvalidInput("test".to_string()).is_retryable());
        assert!(!CercaliaError::ParseError("test".to_string()).is_retryable());
        assert!(!CercaliaError::AuthenticationFailed("test".to_string()).is_retryable());
        assert!(
            !CercaliaError::NoResults {
                operation: "geocode".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_classification() {
        assert!(
            CercaliaError::NoResults {
                operation: "geocode".to_string()
            }
            .is_no_results()
        );
        assert!(CercaliaError::InvalidInput("x".to_string()).is_validation());
        assert!(!CercaliaError::NotFound("x".to_string()).is_validation());
    }

    #[test]
    fn test_error_display() {
        let err = CercaliaError::Vendor {
            operation: "route".to_string(),
            code: "50001".to_string(),
            message: "Invalid key".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("50001"));
        assert!(text.contains("route"));
        assert!(text.contains("Invalid key"));

        let err = CercaliaError::Timeout { timeout_secs: 10 };
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_empty_on_no_results() {
        let result: Result<Vec<u8>> = Err(CercaliaError::NoResults {
            operation: "prox".to_string(),
        });
        assert!(empty_on_no_results(result).unwrap().is_empty());

        let result: Result<Vec<u8>> = Err(CercaliaError::NotFound("x".to_string()));
        assert!(empty_on_no_results(result).is_err());

        let result: Result<Option<u8>> = Ok(Some(3));
        assert_eq!(empty_on_no_results(result).unwrap(), Some(3));
    }
}
