//! Session validation port.
//!
//! The identity provider is external; this port turns a bearer credential
//! into a verified caller identity. Implementations must check issuer,
//! audience and expiry, and must fail closed.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts the caller identity.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed or badly signed tokens
/// - `AuthError::TokenExpired` for expired tokens
/// - `AuthError::ServiceUnavailable` when the provider cannot be reached
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validates a raw token (without the `Bearer ` prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
