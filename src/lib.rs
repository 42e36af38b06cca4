//! Engagement Checkout - payment intents, gateway webhook reconciliation and
//! order fulfillment for a social-engagement storefront.
//!
//! Layout follows ports and adapters:
//!
//! - `domain` - pricing, orders, subscriptions and webhook authenticity
//! - `ports` - traits for stores, the payment gateway, identity and fulfillment
//! - `application` - command and query handlers
//! - `adapters` - Stripe, PostgreSQL, in-memory, OIDC, HTTP and the worker queue
//! - `config` - environment-driven configuration and tracing setup

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
