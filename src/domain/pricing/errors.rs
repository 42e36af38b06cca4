//! Pricing errors.

use thiserror::Error;

use super::ServiceType;

/// A selection the catalog cannot price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Unknown service type: {0}")]
    UnknownService(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Quantity {quantity} is not offered for {service}")]
    UnsupportedQuantity { service: ServiceType, quantity: u32 },

    #[error("Tax rate of {0} basis points is outside 0..=10000")]
    InvalidTaxRate(u32),

    #[error("Amount overflow while pricing {0}")]
    AmountOverflow(ServiceType),
}
