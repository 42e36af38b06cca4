//! Axum routes for the checkout endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_payment_intent, get_order, handle_stripe_webhook, report_fulfillment,
    CheckoutAppState,
};

/// Customer-facing routes, mounted under `/api`.
///
/// - `POST /payments/intent` - start a checkout (bearer auth)
/// - `GET /orders/{order_id}` - the caller's order (bearer auth)
/// - `POST /webhooks/stripe` - gateway events (signature verified)
pub fn api_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/payments/intent", post(create_payment_intent))
        .route("/orders/:order_id", get(get_order))
        .route("/webhooks/stripe", post(handle_stripe_webhook))
}

/// Worker-facing routes, mounted under `/internal`.
///
/// - `POST /fulfillment/{order_id}/report` - completion report (shared token)
pub fn internal_routes() -> Router<CheckoutAppState> {
    Router::new().route("/fulfillment/:order_id/report", post(report_fulfillment))
}

/// Both route groups, ready to be mounted at the root.
pub fn checkout_router() -> Router<CheckoutAppState> {
    Router::new()
        .nest("/api", api_routes())
        .nest("/internal", internal_routes())
}
