//! OIDC adapter for bearer-token validation.
//!
//! Implements the `SessionValidator` port by:
//!
//! 1. Fetching the provider's JWKS (cached with a TTL)
//! 2. Verifying the JWT signature against the key named by `kid`
//! 3. Checking issuer, audience and expiry
//! 4. Mapping claims to `AuthenticatedUser`
//!
//! An unknown `kid` triggers one forced JWKS refresh so key rotation does not
//! lock callers out until the cache expires. Any failure to reach the provider
//! is `AuthError::ServiceUnavailable`; callers treat it as unauthenticated.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(3600);
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the OIDC validator.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Expected `iss` claim.
    pub issuer_url: String,

    /// Required entry in the `aud` claim.
    pub audience: String,

    /// JWKS location. Defaults to `<issuer>/.well-known/jwks.json`.
    pub jwks_url: Option<String>,

    pub jwks_cache_ttl: Duration,
}

impl OidcConfig {
    pub fn new(issuer_url: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer_url: issuer_url.into(),
            audience: audience.into(),
            jwks_url: None,
            jwks_cache_ttl: DEFAULT_JWKS_TTL,
        }
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = Some(url.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_cache_ttl = ttl;
        self
    }

    fn resolved_jwks_url(&self) -> String {
        match &self.jwks_url {
            Some(url) => url.clone(),
            None => format!(
                "{}/.well-known/jwks.json",
                self.issuer_url.trim_end_matches('/')
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,

    #[serde(default)]
    aud: Audience,

    #[serde(default)]
    email: Option<String>,

    #[serde(default)]
    email_verified: Option<bool>,

    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    preferred_username: Option<String>,
}

/// `aud` may be a string or an array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
enum Audience {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::None => false,
            Audience::Single(s) => s == expected,
            Audience::Multiple(v) => v.iter().any(|s| s == expected),
        }
    }
}

struct CachedJwks {
    jwks: JwkSet,
    fetched_at: Instant,
}

impl CachedJwks {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() <= ttl
    }
}

/// Production `SessionValidator`.
pub struct OidcSessionValidator {
    config: OidcConfig,
    http_client: reqwest::Client,
    cache: Arc<RwLock<Option<CachedJwks>>>,
}

impl OidcSessionValidator {
    /// Keys are fetched lazily on first validation.
    pub fn new(config: OidcConfig) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AuthError::service_unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            cache: Arc::new(RwLock::new(None)),
        })
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let url = self.config.resolved_jwks_url();
        tracing::debug!(url = %url, "Fetching JWKS");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch JWKS");
            AuthError::service_unavailable(format!("Failed to fetch JWKS: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(status = status.as_u16(), "JWKS endpoint returned an error");
            return Err(AuthError::service_unavailable(format!(
                "JWKS endpoint returned {}",
                status
            )));
        }

        let jwks: JwkSet = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse JWKS");
            AuthError::service_unavailable(format!("Failed to parse JWKS: {}", e))
        })?;

        tracing::debug!(keys = jwks.keys.len(), "Fetched JWKS");
        Ok(jwks)
    }

    /// Returns the cached key set, refreshing it when stale or when `force`.
    async fn jwks(&self, force: bool) -> Result<JwkSet, AuthError> {
        if !force {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh(self.config.jwks_cache_ttl)) {
                return Ok(cached.jwks.clone());
            }
        }

        let jwks = self.fetch_jwks().await?;
        *self.cache.write().await = Some(CachedJwks {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }

    async fn find_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(jwk) = self.jwks(false).await?.find(kid) {
            return Ok(jwk.clone());
        }

        tracing::info!(kid, "Unknown signing key, refreshing JWKS");
        self.jwks(true)
            .await?
            .find(kid)
            .cloned()
            .ok_or_else(|| {
                tracing::warn!(kid, "No JWKS entry for signing key");
                AuthError::InvalidToken
            })
    }

    fn decode_claims(&self, token: &str, jwk: &Jwk) -> Result<Claims, AuthError> {
        let algorithm = algorithm_for(jwk)?;
        let key = DecodingKey::from_jwk(jwk).map_err(|e| {
            tracing::warn!(error = %e, "Unusable JWKS entry");
            AuthError::InvalidToken
        })?;

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&self.config.issuer_url]);
        validation.set_audience(&[&self.config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "sub", "aud"]);

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => {
                        tracing::warn!(error = %e, "Token validation failed");
                        AuthError::InvalidToken
                    }
                }
            })
    }
}

fn algorithm_for(jwk: &Jwk) -> Result<Algorithm, AuthError> {
    match jwk.common.key_algorithm {
        Some(KeyAlgorithm::RS256) | None => Ok(Algorithm::RS256),
        Some(KeyAlgorithm::RS384) => Ok(Algorithm::RS384),
        Some(KeyAlgorithm::RS512) => Ok(Algorithm::RS512),
        Some(KeyAlgorithm::ES256) => Ok(Algorithm::ES256),
        Some(KeyAlgorithm::ES384) => Ok(Algorithm::ES384),
        Some(other) => {
            tracing::warn!(algorithm = ?other, "Unsupported JWKS algorithm");
            Err(AuthError::InvalidToken)
        }
    }
}

fn user_from_claims(claims: Claims, audience: &str) -> Result<AuthenticatedUser, AuthError> {
    if !claims.aud.contains(audience) {
        return Err(AuthError::InvalidToken);
    }

    let email = claims
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| {
            tracing::warn!("Token has no email claim");
            AuthError::InvalidToken
        })?;
    let id = UserId::new(claims.sub).map_err(|_| AuthError::InvalidToken)?;

    Ok(AuthenticatedUser::new(
        id,
        email,
        claims.name.or(claims.preferred_username),
        claims.email_verified.unwrap_or(false),
    ))
}

#[async_trait]
impl SessionValidator for OidcSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        let kid = header.kid.ok_or_else(|| {
            tracing::warn!("JWT missing 'kid' header");
            AuthError::InvalidToken
        })?;

        let jwk = self.find_key(&kid).await?;
        let claims = self.decode_claims(token, &jwk)?;
        user_from_claims(claims, &self.config.audience)
    }
}

impl std::fmt::Debug for OidcSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcSessionValidator")
            .field("issuer_url", &self.config.issuer_url)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(json: serde_json::Value) -> Claims {
        serde_json::from_value(json).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn jwks_url_defaults_to_well_known() {
        let config = OidcConfig::new("https://id.example.com/", "checkout-api");
        assert_eq!(
            config.resolved_jwks_url(),
            "https://id.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn explicit_jwks_url_wins() {
        let config = OidcConfig::new("https://id.example.com", "checkout-api")
            .with_jwks_url("https://id.example.com/oauth/v2/keys");
        assert_eq!(config.resolved_jwks_url(), "https://id.example.com/oauth/v2/keys");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Claims
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn audience_accepts_string_or_array() {
        let single = claims(serde_json::json!({"sub": "u1", "aud": "checkout-api"}));
        assert!(single.aud.contains("checkout-api"));

        let many = claims(serde_json::json!({"sub": "u1", "aud": ["other", "checkout-api"]}));
        assert!(many.aud.contains("checkout-api"));
        assert!(!many.aud.contains("admin-api"));
    }

    #[test]
    fn claims_map_to_user() {
        let user = user_from_claims(
            claims(serde_json::json!({
                "sub": "user-42",
                "aud": "checkout-api",
                "email": "fan@example.com",
                "email_verified": true,
                "preferred_username": "fan42"
            })),
            "checkout-api",
        )
        .unwrap();

        assert_eq!(user.id.as_str(), "user-42");
        assert_eq!(user.email, "fan@example.com");
        assert_eq!(user.display_name.as_deref(), Some("fan42"));
        assert!(user.email_verified);
    }

    #[test]
    fn missing_email_is_rejected() {
        let result = user_from_claims(
            claims(serde_json::json!({"sub": "user-42", "aud": "checkout-api"})),
            "checkout-api",
        );
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let result = user_from_claims(
            claims(serde_json::json!({"sub": "u", "aud": "other", "email": "a@b.c"})),
            "checkout-api",
        );
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Validation failures
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn garbage_token_is_invalid_without_network() {
        let validator = OidcSessionValidator::new(OidcConfig::new(
            "https://id.invalid",
            "checkout-api",
        ))
        .unwrap();

        assert_eq!(
            validator.validate("not-a-jwt").await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn unreachable_provider_is_service_unavailable() {
        let validator = OidcSessionValidator::new(
            OidcConfig::new("https://id.invalid", "checkout-api")
                .with_jwks_url("http://127.0.0.1:9/jwks"),
        )
        .unwrap();
        // header {"alg":"RS256","kid":"k1"}, empty claims, bogus signature
        let token = "eyJhbGciOiJSUzI1NiIsImtpZCI6ImsxIn0.e30.c2ln";

        let err = validator.validate(token).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn validator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OidcSessionValidator>();
    }
}
