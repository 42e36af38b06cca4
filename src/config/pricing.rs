//! Pricing configuration

use serde::Deserialize;

use crate::domain::pricing::{AmountBounds, PriceCatalog, TaxRate};

use super::error::ValidationError;

/// Tax rate and the accepted range for client-submitted amounts.
///
/// Prices themselves are compiled into the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Basis points (`1800` = 18%)
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,

    /// Minor units
    #[serde(default = "default_min_amount")]
    pub min_amount: i64,

    /// Minor units
    #[serde(default = "default_max_amount")]
    pub max_amount: i64,
}

impl PricingConfig {
    pub fn catalog(&self) -> Result<PriceCatalog, ValidationError> {
        let tax_rate =
            TaxRate::from_bps(self.tax_rate_bps).map_err(|_| ValidationError::InvalidTaxRate)?;
        Ok(PriceCatalog::standard().with_tax_rate(tax_rate))
    }

    pub fn bounds(&self) -> AmountBounds {
        AmountBounds::new(self.min_amount, self.max_amount)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.catalog()?;
        if self.min_amount <= 0 || self.min_amount > self.max_amount {
            return Err(ValidationError::InvalidAmountBounds);
        }
        Ok(())
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate_bps: default_tax_rate_bps(),
            min_amount: default_min_amount(),
            max_amount: default_max_amount(),
        }
    }
}

fn default_tax_rate_bps() -> u32 {
    TaxRate::STANDARD.bps()
}

fn default_min_amount() -> i64 {
    AmountBounds::default().min
}

fn default_max_amount() -> i64 {
    AmountBounds::default().max
}
