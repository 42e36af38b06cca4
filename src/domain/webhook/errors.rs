//! Webhook error types.
//!
//! The status code decides whether the gateway redelivers: `2xx` is an
//! acknowledgement, `4xx` is not retried, `5xx` is redelivered.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature timestamp is older than the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signature timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the signature header or payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the event object.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The authoritative store write failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WebhookError {
    /// True for failures of the authenticity check.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
                | WebhookError::InvalidTimestamp
        )
    }

    /// Returns true if the gateway should redeliver this event.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Storage(_))
    }

    /// Maps the error to the HTTP status returned to the gateway.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            WebhookError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
