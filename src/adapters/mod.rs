//! Adapters - implementations of the port interfaces.
//!
//! - `auth` - identity provider session validation
//! - `fulfillment` - queued dispatch to the fulfillment worker
//! - `http` - axum routes and middleware
//! - `memory` - in-memory repositories
//! - `postgres` - PostgreSQL repositories
//! - `stripe` - payment gateway client

pub mod auth;
pub mod fulfillment;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
