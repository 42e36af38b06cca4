//! HTTP adapters - the REST surface of the service.
//!
//! - `checkout` - payment intents, orders, gateway webhooks, worker reports
//! - `middleware` - bearer authentication
//! - `router` - top-level router and the shared tower-http stack

pub mod checkout;
pub mod middleware;
pub mod router;

pub use checkout::{checkout_router, CheckoutAppState};
pub use router::{app_router, RouterSettings};
