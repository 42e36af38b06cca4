//! Payment gateway configuration (Stripe)

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use crate::adapters::stripe::StripeConfig;
use crate::application::handlers::checkout::DEFAULT_CURRENCY;
use crate::domain::webhook::{WebhookVerifier, DEFAULT_TOLERANCE_SECS};

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub stripe_api_key: String,

    /// Webhook signing secret (`whsec_...`)
    pub stripe_webhook_secret: String,

    /// Override for a stub server
    pub api_base_url: Option<String>,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Accepted age of a webhook signature timestamp
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_secs: i64,

    /// Acknowledge but skip test-mode events
    #[serde(default)]
    pub require_livemode: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PaymentConfig {
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Gateway client settings; the key leaves the config layer wrapped.
    pub fn stripe_config(&self) -> StripeConfig {
        let config = StripeConfig::new(SecretString::new(self.stripe_api_key.clone()))
            .with_timeout(Duration::from_secs(self.request_timeout_secs));
        match self.api_base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => config.with_base_url(url),
            None => config,
        }
    }

    pub fn webhook_verifier(&self) -> WebhookVerifier {
        WebhookVerifier::new(SecretString::new(self.stripe_webhook_secret.clone()))
            .with_tolerance(self.signature_tolerance_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if !self.stripe_api_key.starts_with("sk_") && !self.stripe_api_key.starts_with("rk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.signature_tolerance_secs <= 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            api_base_url: None,
            currency: default_currency(),
            signature_tolerance_secs: default_signature_tolerance(),
            require_livemode: false,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_signature_tolerance() -> i64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_request_timeout() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PaymentConfig {
        PaymentConfig {
            stripe_api_key: "sk_test_abcd1234".to_string(),
            stripe_webhook_secret: "whsec_xyz789".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn key_prefix_selects_mode() {
        assert!(valid().is_test_mode());
        let live = PaymentConfig {
            stripe_api_key: "sk_live_xxx".to_string(),
            ..valid()
        };
        assert!(live.is_live_mode());
        assert!(!live.is_test_mode());
    }

    #[test]
    fn defaults_to_inr_and_five_minute_tolerance() {
        let config = PaymentConfig::default();
        assert_eq!(config.currency, "inr");
        assert_eq!(config.signature_tolerance_secs, 300);
        assert!(!config.require_livemode);
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn missing_secrets_are_reported() {
        assert_eq!(
            PaymentConfig::default().validate(),
            Err(ValidationError::MissingRequired("STRIPE_API_KEY"))
        );
        let config = PaymentConfig {
            stripe_webhook_secret: String::new(),
            ..valid()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"))
        );
    }

    #[test]
    fn publishable_key_is_rejected() {
        let config = PaymentConfig {
            stripe_api_key: "pk_test_xxx".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStripeKey));
    }

    #[test]
    fn webhook_secret_needs_prefix() {
        let config = PaymentConfig {
            stripe_webhook_secret: "secret_xxx".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStripeWebhookSecret));
    }

    #[test]
    fn currency_must_be_iso_code() {
        let config = PaymentConfig {
            currency: "rupees".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCurrency));
    }
}
