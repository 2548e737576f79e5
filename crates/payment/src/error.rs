//! Gateway error types.

use thiserror::Error;

/// Errors returned by a payment session gateway.
///
/// None of these are retried inside a request; the caller surfaces them
/// and the pending order stays in place.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider could not be reached.
    #[error("Payment provider unreachable: {0}")]
    Unreachable(String),

    /// The provider did not answer in time.
    #[error("Payment provider timed out")]
    Timeout,

    /// The provider refused the request.
    #[error("Payment provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider answered with something we cannot use.
    #[error("Invalid payment provider response: {0}")]
    InvalidResponse(String),

    /// The request could not be built.
    #[error("Invalid checkout request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Unreachable(err.to_string())
        }
    }
}

/// Convenience type alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;
