//! Static price catalog and tax calculation.
//!
//! All amounts are integer minor currency units. Tax is computed in basis
//! points with half-up rounding, so `total == subtotal + tax` holds exactly.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::{ConfigurationError, ServiceType};
use crate::domain::foundation::ValidationError;

const BPS_DENOMINATOR: i64 = 10_000;

/// Tax rate in basis points (`1800` = 18%).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Reference deployment rate.
    pub const STANDARD: TaxRate = TaxRate(1800);

    pub fn from_bps(bps: u32) -> Result<Self, ConfigurationError> {
        if bps as i64 > BPS_DENOMINATOR {
            return Err(ConfigurationError::InvalidTaxRate(bps));
        }
        Ok(Self(bps))
    }

    pub fn bps(&self) -> u32 {
        self.0
    }

    /// `round(amount * rate)`, half-up.
    pub fn tax_on(&self, amount: i64) -> Option<i64> {
        amount
            .checked_mul(self.0 as i64)?
            .checked_add(BPS_DENOMINATOR / 2)
            .map(|scaled| scaled / BPS_DENOMINATOR)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Priced selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
}

/// Configured bounds a client-submitted subtotal must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountBounds {
    pub min: i64,
    pub max: i64,
}

impl AmountBounds {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn check(&self, amount: i64) -> Result<(), ValidationError> {
        if amount < self.min || amount > self.max {
            return Err(ValidationError::out_of_range(
                "amount", self.min, self.max, amount,
            ));
        }
        Ok(())
    }
}

impl Default for AmountBounds {
    fn default() -> Self {
        Self::new(50, 1_000_000)
    }
}

type PriceTable = HashMap<ServiceType, BTreeMap<u32, i64>>;

static STANDARD_PRICES: Lazy<PriceTable> = Lazy::new(|| {
    let tiers: [(ServiceType, &[(u32, i64)]); 8] = [
        (
            ServiceType::InstagramFollowers,
            &[(100, 299), (500, 1299), (1000, 2399), (5000, 9999)],
        ),
        (
            ServiceType::InstagramLikes,
            &[(100, 149), (500, 599), (1000, 999)],
        ),
        (
            ServiceType::TiktokFollowers,
            &[(100, 349), (500, 1499), (1000, 2799)],
        ),
        (
            ServiceType::TiktokViews,
            &[(1000, 199), (5000, 799), (10000, 1399)],
        ),
        (
            ServiceType::YoutubeViews,
            &[(1000, 499), (5000, 1999), (10000, 3599)],
        ),
        (
            ServiceType::YoutubeSubscribers,
            &[(100, 999), (500, 4499), (1000, 8499)],
        ),
        (
            ServiceType::TwitchFollowers,
            &[(100, 399), (500, 1799), (1000, 3299)],
        ),
        (
            ServiceType::TwitchViewers,
            &[(100, 799), (250, 1599), (500, 2999), (1000, 5499)],
        ),
    ];

    tiers
        .into_iter()
        .map(|(service, prices)| (service, prices.iter().copied().collect()))
        .collect()
});

/// Price catalog: quantity tiers per service plus the tax rate.
#[derive(Debug, Clone)]
pub struct PriceCatalog {
    prices: PriceTable,
    tax_rate: TaxRate,
}

impl PriceCatalog {
    /// The storefront's static catalog at the standard tax rate.
    pub fn standard() -> Self {
        Self {
            prices: STANDARD_PRICES.clone(),
            tax_rate: TaxRate::STANDARD,
        }
    }

    pub fn with_tax_rate(mut self, tax_rate: TaxRate) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Catalog subtotal for a selection.
    pub fn subtotal(&self, service: ServiceType, quantity: u32) -> Result<i64, ConfigurationError> {
        self.prices
            .get(&service)
            .and_then(|tiers| tiers.get(&quantity))
            .copied()
            .ok_or(ConfigurationError::UnsupportedQuantity { service, quantity })
    }

    /// Prices a selection.
    pub fn quote(&self, service: ServiceType, quantity: u32) -> Result<Quote, ConfigurationError> {
        let subtotal = self.subtotal(service, quantity)?;
        let tax = self
            .tax_rate
            .tax_on(subtotal)
            .ok_or(ConfigurationError::AmountOverflow(service))?;
        let total = subtotal
            .checked_add(tax)
            .ok_or(ConfigurationError::AmountOverflow(service))?;

        Ok(Quote {
            subtotal,
            tax,
            total,
        })
    }

    /// Every `(service, quantity)` pair the catalog prices.
    pub fn offerings(&self) -> Vec<(ServiceType, u32)> {
        let mut offerings: Vec<_> = self
            .prices
            .iter()
            .flat_map(|(service, tiers)| tiers.keys().map(move |q| (*service, *q)))
            .collect();
        offerings.sort_by_key(|(service, quantity)| (service.as_str(), *quantity));
        offerings
    }
}

impl Default for PriceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
