//! Pricing - service catalog and tax calculation.
//!
//! Pure and deterministic. The catalog subtotal is the only amount the
//! checkout trusts; client-submitted amounts are checked against it.

mod catalog;
mod errors;
mod service;

pub use catalog::{AmountBounds, PriceCatalog, Quote, TaxRate};
pub use errors::ConfigurationError;
pub use service::{Platform, ServiceType};
