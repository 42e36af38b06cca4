//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port over the Stripe REST API:
//! - Customer lookup by email and creation
//! - Payment intent creation with order metadata
//!
//! Webhook signature verification is not here; it lives in
//! `domain::webhook` since it only needs the shared secret.
//!
//! # Security
//!
//! - The API key is held as `secrecy::SecretString` and only exposed when
//!   building the basic-auth header
//! - Mutating calls carry an `Idempotency-Key` header

mod api_types;
mod config;
mod mock_payment_gateway;
mod stripe_gateway;

pub use api_types::{StripeCustomer, StripeErrorBody, StripeList, StripePaymentIntent};
pub use config::StripeConfig;
pub use mock_payment_gateway::{MethodCall, MockPaymentGateway};
pub use stripe_gateway::StripePaymentGateway;
