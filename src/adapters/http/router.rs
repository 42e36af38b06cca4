//! Top-level application router.
//!
//! Combines the checkout routes with the health probe and the shared
//! tower-http stack: request ids, tracing, timeout, CORS and compression.

use std::time::Duration;

use axum::{http::HeaderValue, middleware, routing::get, Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::checkout::{checkout_router, CheckoutAppState};
use super::middleware::{auth_middleware, AuthState};

/// Cross-cutting HTTP settings.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub request_timeout: Duration,
    /// Allowed browser origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            let trimmed = origin.trim();
            match HeaderValue::from_str(trimmed) {
                Ok(value) if !trimmed.is_empty() => Some(value),
                Ok(_) => None,
                Err(_) => {
                    tracing::warn!(origin = %trimmed, "Ignoring invalid CORS origin");
                    None
                }
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}

/// Builds the complete service router.
pub fn app_router(state: CheckoutAppState, auth: AuthState, settings: &RouterSettings) -> Router {
    let routes = checkout_router()
        .with_state(state)
        .layer(middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(settings.request_timeout))
                .layer(cors_layer(&settings.cors_origins))
                .layer(CompressionLayer::new()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_origin_list_is_accepted() {
        let _ = cors_layer(&[]);
    }

    #[test]
    fn invalid_origins_are_skipped() {
        let _ = cors_layer(&["https://shop.example.com".to_string(), "bad\norigin".to_string()]);
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(RouterSettings::default().request_timeout, Duration::from_secs(30));
    }
}
