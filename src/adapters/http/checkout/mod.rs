//! Checkout HTTP module - payment intents, orders, gateway webhooks and
//! fulfillment reports.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{CheckoutApiError, CheckoutAppState, WebhookApiError};
pub use routes::checkout_router;
