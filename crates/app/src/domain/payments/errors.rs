//! Payment gateway errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentGatewayError {
    #[error("payment amount must be positive, got {0}")]
    AmountInvalid(i64),

    #[error("payment intent id is invalid")]
    InvalidIntentId,

    #[error("payment processor did not respond in time")]
    UpstreamTimeout,

    #[error("payment processor returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("http error")]
    Http(#[source] reqwest::Error),
}

impl From<reqwest::Error> for PaymentGatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::UpstreamTimeout
        } else {
            Self::Http(error)
        }
    }
}

impl PaymentGatewayError {
    /// Whether the same request may succeed if the caller tries again later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamTimeout => true,
            Self::Upstream { status, .. } => *status >= 500,
            Self::AmountInvalid(_) | Self::InvalidIntentId | Self::Http(_) => false,
        }
    }
}
