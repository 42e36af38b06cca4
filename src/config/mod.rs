//! Application configuration
//!
//! Loaded from environment variables with the `ENGAGEMENT_CHECKOUT` prefix,
//! nested values separated by `__`. A `.env` file is read first when present.
//!
//! ```no_run
//! use engagement_checkout::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod fulfillment;
mod payment;
mod pricing;
mod server;
mod telemetry;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use fulfillment::FulfillmentConfig;
pub use payment::PaymentConfig;
pub use pricing::PricingConfig;
pub use server::{Environment, ServerConfig};
pub use telemetry::init_tracing;

use serde::Deserialize;

pub const ENV_PREFIX: &str = "ENGAGEMENT_CHECKOUT";

/// Root configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    pub payment: PaymentConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    pub fulfillment: FulfillmentConfig,
}

impl AppConfig {
    /// Reads `.env` (if present) and the environment.
    ///
    /// `ENGAGEMENT_CHECKOUT__PAYMENT__STRIPE_API_KEY=sk_test_...` sets
    /// `payment.stripe_api_key`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic checks across all sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        if self.is_production() && self.database.url().is_none() {
            return Err(ValidationError::MissingRequired("DATABASE_URL"));
        }
        self.payment.validate()?;
        self.auth.validate(self.server.environment)?;
        self.pricing.validate()?;
        self.fulfillment.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[(&str, &str)] = &[
        ("ENGAGEMENT_CHECKOUT__PAYMENT__STRIPE_API_KEY", "sk_test_xxx"),
        ("ENGAGEMENT_CHECKOUT__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx"),
        ("ENGAGEMENT_CHECKOUT__AUTH__ISSUER_URL", "https://id.example.com"),
        ("ENGAGEMENT_CHECKOUT__AUTH__AUDIENCE", "storefront-api"),
        ("ENGAGEMENT_CHECKOUT__FULFILLMENT__WORKER_URL", "https://worker.internal/orders"),
    ];

    const OPTIONAL: &[&str] = &[
        "ENGAGEMENT_CHECKOUT__SERVER__PORT",
        "ENGAGEMENT_CHECKOUT__SERVER__ENVIRONMENT",
        "ENGAGEMENT_CHECKOUT__DATABASE__URL",
        "ENGAGEMENT_CHECKOUT__PRICING__TAX_RATE_BPS",
    ];

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        for (key, value) in VARS.iter().chain(extra) {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        for (key, _) in VARS {
            env::remove_var(key);
        }
        for key in OPTIONAL {
            env::remove_var(key);
        }
        result
    }

    #[test]
    fn loads_minimal_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.payment.stripe_api_key, "sk_test_xxx");
        assert_eq!(config.auth.audience, "storefront-api");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pricing.tax_rate_bps, 1800);
        assert!(config.database.url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nested_numbers_are_parsed() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("ENGAGEMENT_CHECKOUT__SERVER__PORT", "3000"),
            ("ENGAGEMENT_CHECKOUT__PRICING__TAX_RATE_BPS", "500"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.pricing.tax_rate_bps, 500);
    }

    #[test]
    fn production_requires_a_database() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("ENGAGEMENT_CHECKOUT__SERVER__ENVIRONMENT", "production")])
            .unwrap();

        assert!(config.is_production());
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("DATABASE_URL"))
        );
    }

    #[test]
    fn production_with_database_validates() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("ENGAGEMENT_CHECKOUT__SERVER__ENVIRONMENT", "production"),
            ("ENGAGEMENT_CHECKOUT__DATABASE__URL", "postgresql://app@db/orders"),
        ])
        .unwrap();

        assert!(config.validate().is_ok());
    }
}
