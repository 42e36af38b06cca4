//! Identity provider configuration (OIDC)

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::auth::OidcConfig;

use super::error::ValidationError;
use super::server::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Expected `iss` claim
    pub issuer_url: String,

    /// Expected `aud` claim
    pub audience: String,

    /// Defaults to `<issuer>/.well-known/jwks.json`
    pub jwks_url: Option<String>,

    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,
}

impl AuthConfig {
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    pub fn oidc_config(&self) -> OidcConfig {
        let config = OidcConfig::new(&self.issuer_url, &self.audience)
            .with_cache_ttl(self.jwks_cache_ttl());
        match self.jwks_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => config.with_jwks_url(url),
            None => config,
        }
    }

    /// HTTPS is required for the issuer in production only.
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        if self.issuer_url.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_ISSUER_URL"));
        }
        if self.audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_AUDIENCE"));
        }
        if !self.issuer_url.starts_with("https://") && !self.issuer_url.starts_with("http://") {
            return Err(ValidationError::InvalidUrl("auth.issuer_url"));
        }
        if environment == Environment::Production && !self.issuer_url.starts_with("https://") {
            return Err(ValidationError::IssuerMustBeHttps);
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer_url: String::new(),
            audience: String::new(),
            jwks_url: None,
            jwks_cache_ttl_secs: default_jwks_cache_ttl(),
        }
    }
}

fn default_jwks_cache_ttl() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(issuer: &str) -> AuthConfig {
        AuthConfig {
            issuer_url: issuer.to_string(),
            audience: "storefront-api".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn cache_ttl_defaults_to_an_hour() {
        assert_eq!(AuthConfig::default().jwks_cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn missing_issuer_is_reported() {
        assert_eq!(
            AuthConfig::default().validate(Environment::Development),
            Err(ValidationError::MissingRequired("AUTH_ISSUER_URL"))
        );
    }

    #[test]
    fn plain_http_issuer_is_development_only() {
        let config = valid("http://localhost:8081");
        assert!(config.validate(Environment::Development).is_ok());
        assert_eq!(
            config.validate(Environment::Production),
            Err(ValidationError::IssuerMustBeHttps)
        );
    }

    #[test]
    fn oidc_config_carries_explicit_jwks_url() {
        let config = AuthConfig {
            jwks_url: Some("https://id.example.com/keys".to_string()),
            ..valid("https://id.example.com")
        };
        let oidc = config.oidc_config();
        assert_eq!(oidc.jwks_url.as_deref(), Some("https://id.example.com/keys"));
        assert_eq!(oidc.audience, "storefront-api");
    }
}
