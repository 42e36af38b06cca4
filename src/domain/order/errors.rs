//! Checkout and order error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | ValidationFailed | 400 |
//! | AmountMismatch | 400 |
//! | UnsupportedSelection | 400 |
//! | OrderNotFound | 404 |
//! | InvalidState | 409 |
//! | CustomerResolution | 500 |
//! | Gateway | 500 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, ValidationError};
use crate::domain::pricing::ConfigurationError;

/// Errors raised by intent creation and order operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// A request field is missing or malformed.
    ValidationFailed { field: String, message: String },

    /// Client amount differs from the catalog subtotal.
    AmountMismatch { expected: i64, actual: i64 },

    /// The catalog does not price this selection.
    UnsupportedSelection(String),

    OrderNotFound(String),

    /// The order is not in a state that allows the operation.
    InvalidState { order_id: String, message: String },

    /// Neither the mapping store nor the gateway yielded a customer.
    CustomerResolution(String),

    /// The payment gateway rejected or failed the call.
    Gateway { message: String, retryable: bool },

    Infrastructure(String),
}

impl CheckoutError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CheckoutError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn amount_mismatch(expected: i64, actual: i64) -> Self {
        CheckoutError::AmountMismatch { expected, actual }
    }

    pub fn order_not_found(order_id: impl Into<String>) -> Self {
        CheckoutError::OrderNotFound(order_id.into())
    }

    pub fn invalid_state(order_id: &OrderId, message: impl Into<String>) -> Self {
        CheckoutError::InvalidState {
            order_id: order_id.to_string(),
            message: message.into(),
        }
    }

    pub fn customer_resolution(message: impl Into<String>) -> Self {
        CheckoutError::CustomerResolution(message.into())
    }

    pub fn gateway(message: impl Into<String>, retryable: bool) -> Self {
        CheckoutError::Gateway {
            message: message.into(),
            retryable,
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        CheckoutError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            CheckoutError::AmountMismatch { .. } => ErrorCode::AmountMismatch,
            CheckoutError::UnsupportedSelection(_) => ErrorCode::ConfigurationError,
            CheckoutError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            CheckoutError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            CheckoutError::CustomerResolution(_) => ErrorCode::CustomerNotFound,
            CheckoutError::Gateway { .. } => ErrorCode::PaymentGatewayError,
            CheckoutError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            CheckoutError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            CheckoutError::AmountMismatch { expected, actual } => format!(
                "Amount {} does not match the catalog price {}",
                actual, expected
            ),
            CheckoutError::UnsupportedSelection(reason) => reason.clone(),
            CheckoutError::OrderNotFound(id) => format!("Order not found: {}", id),
            CheckoutError::InvalidState { order_id, message } => {
                format!("Order {} cannot be updated: {}", order_id, message)
            }
            CheckoutError::CustomerResolution(msg) => {
                format!("Could not resolve payment customer: {}", msg)
            }
            CheckoutError::Gateway { message, .. } => format!("Payment gateway error: {}", message),
            CheckoutError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::Gateway { retryable, .. } => *retryable,
            CheckoutError::Infrastructure(_) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for CheckoutError {}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::validation(err.field().to_string(), err.to_string())
    }
}

impl From<ConfigurationError> for CheckoutError {
    fn from(err: ConfigurationError) -> Self {
        CheckoutError::UnsupportedSelection(err.to_string())
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => CheckoutError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::OrderNotFound => CheckoutError::OrderNotFound(
                err.details.get("order_id").cloned().unwrap_or(err.message),
            ),
            ErrorCode::InvalidStateTransition => CheckoutError::InvalidState {
                order_id: err
                    .details
                    .get("order_id")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => CheckoutError::Infrastructure(err.to_string()),
        }
    }
}

impl From<CheckoutError> for DomainError {
    fn from(err: CheckoutError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_mismatch_has_its_own_code() {
        let err = CheckoutError::amount_mismatch(2999, 100);
        assert_eq!(err.code(), ErrorCode::AmountMismatch);
        assert_eq!(
            err.message(),
            "Amount 100 does not match the catalog price 2999"
        );
    }

    #[test]
    fn only_gateway_and_infrastructure_are_retryable() {
        assert!(CheckoutError::gateway("timeout", true).is_retryable());
        assert!(!CheckoutError::gateway("card declined", false).is_retryable());
        assert!(CheckoutError::infrastructure("db down").is_retryable());
        assert!(!CheckoutError::validation("quantity", "too big").is_retryable());
    }

    #[test]
    fn validation_error_converts_with_field() {
        let err: CheckoutError = ValidationError::out_of_range("amount", 50, 100, 10).into();
        match err {
            CheckoutError::ValidationFailed { field, .. } => assert_eq!(field, "amount"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn domain_state_error_maps_to_invalid_state() {
        let domain = DomainError::new(ErrorCode::InvalidStateTransition, "nope")
            .with_detail("order_id", "ORD-1-abc");
        let err: CheckoutError = domain.into();
        assert_eq!(
            err,
            CheckoutError::InvalidState {
                order_id: "ORD-1-abc".to_string(),
                message: "nope".to_string()
            }
        );
    }

    #[test]
    fn database_error_maps_to_infrastructure() {
        let err: CheckoutError = DomainError::database("connection reset").into();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(err.is_retryable());
    }

    #[test]
    fn display_uses_message() {
        let err = CheckoutError::order_not_found("ORD-1");
        assert_eq!(err.to_string(), "Order not found: ORD-1");
    }
}
