//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Timestamp, ValidationError};

const ORDER_ID_PREFIX: &str = "ORD";

/// Caller-visible order identifier.
///
/// Format: `ORD-<unix-millis>-<32 hex chars>`. The hex suffix comes from a v4
/// UUID so ids cannot be guessed from the creation time alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generates a fresh order id stamped with the given creation time.
    pub fn generate(at: Timestamp) -> Self {
        Self(format!(
            "{}-{}-{}",
            ORDER_ID_PREFIX,
            at.as_unix_millis(),
            Uuid::new_v4().simple()
        ))
    }

    /// Parses an order id, validating its shape.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let mut parts = value.splitn(3, '-');
        let prefix = parts.next().unwrap_or_default();
        let millis = parts.next().unwrap_or_default();
        let suffix = parts.next().unwrap_or_default();

        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("order_id"));
        }
        if prefix != ORDER_ID_PREFIX
            || millis.is_empty()
            || !millis.chars().all(|c| c.is_ascii_digit())
            || suffix.len() != 32
            || !suffix.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(ValidationError::invalid_format(
                "order_id",
                "expected ORD-<millis>-<32 hex>",
            ));
        }
        Ok(Self(value))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// User identifier issued by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId, rejecting blank values.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_order_id_has_expected_shape() {
        let at = Timestamp::from_unix_secs(1_700_000_000).unwrap();
        let id = OrderId::generate(at);

        assert!(id.as_str().starts_with("ORD-1700000000000-"));
        assert!(OrderId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn generated_order_ids_are_unique() {
        let at = Timestamp::now();
        assert_ne!(OrderId::generate(at), OrderId::generate(at));
    }

    #[test]
    fn order_id_parse_rejects_wrong_prefix() {
        let err = OrderId::parse("INV-1-0123456789abcdef0123456789abcdef").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn order_id_parse_rejects_short_suffix() {
        assert!(OrderId::parse("ORD-1700000000000-abc").is_err());
    }

    #[test]
    fn order_id_parse_rejects_empty() {
        assert!(matches!(
            OrderId::parse("  "),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn user_id_rejects_blank() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
    }

    #[test]
    fn user_id_round_trips_through_display() {
        let id = UserId::new("user-42").unwrap();
        assert_eq!(id.to_string(), "user-42");
        assert_eq!("user-42".parse::<UserId>().unwrap(), id);
    }
}
