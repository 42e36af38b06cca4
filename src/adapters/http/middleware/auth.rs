//! Bearer authentication for the payment API.
//!
//! ```text
//! Request → auth_middleware → AuthenticatedUser in extensions
//!                                      ↓
//!                              RequireAuth extractor in the handler
//! ```
//!
//! The middleware only resolves identities. Whether a route needs one is
//! decided by the handler taking `RequireAuth`, so the webhook and health
//! routes can share the same stack.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

/// Auth middleware state - the session validator port.
pub type AuthState = Arc<dyn SessionValidator>;

/// Validates `Authorization: Bearer <token>` when present.
///
/// A presented credential that cannot be verified is rejected here with
/// 401, including when the identity provider is unreachable. Requests
/// without a credential pass through untouched.
pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return next.run(request).await;
    };

    match validator.validate(token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            if e.is_transient() {
                tracing::error!(error = %e, "Identity provider unavailable; rejecting credential");
            } else {
                tracing::debug!(error = %e, "Bearer credential rejected");
            }
            AuthRejection::from(e).into_response()
        }
    }
}

/// Extractor for routes that need a verified caller.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Why a request was refused at the authentication step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No credential was presented.
    Unauthenticated,
    InvalidToken,
    TokenExpired,
    /// The identity provider could not be consulted.
    ProviderUnavailable,
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => AuthRejection::TokenExpired,
            AuthError::ServiceUnavailable(_) => AuthRejection::ProviderUnavailable,
            _ => AuthRejection::InvalidToken,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (error_code, message) = match self {
            AuthRejection::Unauthenticated => ("UNAUTHENTICATED", "Authentication required"),
            AuthRejection::InvalidToken => ("INVALID_TOKEN", "Invalid token"),
            AuthRejection::TokenExpired => ("TOKEN_EXPIRED", "Token expired"),
            AuthRejection::ProviderUnavailable => {
                ("AUTH_UNAVAILABLE", "Credential could not be verified")
            }
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error_code": error_code, "message": message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::domain::foundation::UserId;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn test_user() -> AuthenticatedUser {
        AuthenticatedUser::new(
            UserId::new("user-123").unwrap(),
            "buyer@example.com",
            None,
            true,
        )
    }

    async fn whoami(RequireAuth(user): RequireAuth) -> String {
        user.id.to_string()
    }

    fn app(validator: MockSessionValidator) -> Router {
        let state: AuthState = Arc::new(validator);
        Router::new()
            .route("/whoami", get(whoami))
            .route("/open", get(|| async { "open" }))
            .layer(middleware::from_fn_with_state(state, auth_middleware))
    }

    fn get_with(uri: &str, auth: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Middleware
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let app = app(MockSessionValidator::new().with_user("good", test_user()));

        let response = app
            .oneshot(get_with("/whoami", Some("Bearer good")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_rejected_by_extractor() {
        let app = app(MockSessionValidator::new());

        let response = app.oneshot(get_with("/whoami", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let app = app(MockSessionValidator::new());

        let response = app
            .oneshot(get_with("/open", Some("Bearer nope")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unreachable_provider_fails_closed() {
        let validator = MockSessionValidator::new()
            .with_user("good", test_user())
            .with_error(AuthError::service_unavailable("jwks timeout"));

        let response = app(validator)
            .oneshot(get_with("/whoami", Some("Bearer good")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn routes_without_extractor_stay_open() {
        let response = app(MockSessionValidator::new())
            .oneshot(get_with("/open", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_treated_as_absent() {
        let response = app(MockSessionValidator::new())
            .oneshot(get_with("/whoami", Some("Basic dXNlcjpwYXNz")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejections
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn auth_errors_map_to_rejections() {
        assert_eq!(
            AuthRejection::from(AuthError::TokenExpired),
            AuthRejection::TokenExpired
        );
        assert_eq!(
            AuthRejection::from(AuthError::InvalidToken),
            AuthRejection::InvalidToken
        );
        assert_eq!(
            AuthRejection::from(AuthError::service_unavailable("down")),
            AuthRejection::ProviderUnavailable
        );
    }

    #[test]
    fn every_rejection_is_401() {
        for rejection in [
            AuthRejection::Unauthenticated,
            AuthRejection::InvalidToken,
            AuthRejection::TokenExpired,
            AuthRejection::ProviderUnavailable,
        ] {
            assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }
}
