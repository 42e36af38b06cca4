//! Authentication types for the domain layer.
//!
//! The identity provider is external. These types carry the verified caller
//! identity from the `SessionValidator` port into the checkout handlers.

use super::UserId;
use thiserror::Error;

/// Caller identity extracted from a validated bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Identifier issued by the identity provider.
    pub id: UserId,

    /// Contact identifier, used to find or create the gateway customer.
    pub email: String,

    /// Display name if the provider supplied one.
    pub display_name: Option<String>,

    pub email_verified: bool,
}

impl AuthenticatedUser {
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        display_name: Option<String>,
        email_verified: bool,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            display_name,
            email_verified,
        }
    }

    /// Normalized contact identifier used as the customer mapping key.
    pub fn contact(&self) -> String {
        normalize_contact(&self.email)
    }
}

/// Trims and lower-cases a contact identifier.
pub fn normalize_contact(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// The identity provider could not be reached or returned garbage.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this error indicates the user should re-authenticate.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::TokenExpired)
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new("user-1").unwrap(), email, None, true)
    }

    #[test]
    fn contact_is_normalized() {
        assert_eq!(user("  Buyer@Example.COM ").contact(), "buyer@example.com");
    }

    #[test]
    fn token_errors_require_reauthentication() {
        assert!(AuthError::InvalidToken.requires_reauthentication());
        assert!(AuthError::TokenExpired.requires_reauthentication());
        assert!(!AuthError::service_unavailable("down").requires_reauthentication());
    }

    #[test]
    fn only_service_unavailable_is_transient() {
        assert!(AuthError::service_unavailable("jwks fetch failed").is_transient());
        assert!(!AuthError::InvalidToken.is_transient());
    }

    #[test]
    fn service_unavailable_displays_reason() {
        let err = AuthError::service_unavailable("timeout");
        assert_eq!(err.to_string(), "Auth service unavailable: timeout");
    }
}
