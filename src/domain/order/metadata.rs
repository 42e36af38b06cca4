//! Order metadata carried on the gateway payment intent.
//!
//! This is the only channel through which a later webhook learns what was
//! purchased, so every order-identifying field is written here.

use std::collections::HashMap;

use crate::domain::foundation::{OrderId, UserId, ValidationError};
use crate::domain::pricing::{ConfigurationError, Platform, ServiceType};

pub const KEY_ORDER_ID: &str = "order_id";
pub const KEY_OWNER_ID: &str = "owner_id";
pub const KEY_SERVICE_TYPE: &str = "service_type";
pub const KEY_QUANTITY: &str = "quantity";
pub const KEY_TARGET_REFERENCE: &str = "target_reference";
pub const KEY_PLATFORM: &str = "platform";
pub const KEY_AMOUNT_SUBTOTAL: &str = "amount_subtotal";
pub const KEY_AMOUNT_TAX: &str = "amount_tax";

/// What was purchased. Immutable once the order exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderContent {
    pub service_type: ServiceType,
    pub quantity: u32,
    pub target_reference: Option<String>,
    pub platform: Platform,
}

/// Typed view of the intent metadata map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMetadata {
    pub order_id: OrderId,
    pub owner_id: UserId,
    pub content: OrderContent,
    pub amount_subtotal: i64,
    pub amount_tax: i64,
}

impl OrderMetadata {
    /// Flattens into gateway metadata key/value pairs.
    ///
    /// An absent target reference is written as an empty string so the key
    /// set is always complete.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(KEY_ORDER_ID.to_string(), self.order_id.to_string());
        map.insert(KEY_OWNER_ID.to_string(), self.owner_id.to_string());
        map.insert(
            KEY_SERVICE_TYPE.to_string(),
            self.content.service_type.as_str().to_string(),
        );
        map.insert(KEY_QUANTITY.to_string(), self.content.quantity.to_string());
        map.insert(
            KEY_TARGET_REFERENCE.to_string(),
            self.content.target_reference.clone().unwrap_or_default(),
        );
        map.insert(
            KEY_PLATFORM.to_string(),
            self.content.platform.as_str().to_string(),
        );
        map.insert(
            KEY_AMOUNT_SUBTOTAL.to_string(),
            self.amount_subtotal.to_string(),
        );
        map.insert(KEY_AMOUNT_TAX.to_string(), self.amount_tax.to_string());
        map
    }

    /// Rebuilds the typed metadata from a gateway metadata map.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let order_id = OrderId::parse(required(map, KEY_ORDER_ID)?)?;
        let owner_id = UserId::new(required(map, KEY_OWNER_ID)?)?;
        let service_type: ServiceType = required(map, KEY_SERVICE_TYPE)?
            .parse()
            .map_err(|e: ConfigurationError| {
                ValidationError::invalid_format(KEY_SERVICE_TYPE, e.to_string())
            })?;
        let quantity = parse_number::<u32>(map, KEY_QUANTITY)?;
        let platform = match map.get(KEY_PLATFORM).map(|p| p.trim()) {
            Some(p) if !p.is_empty() => p.parse().map_err(
                |e: ConfigurationError| {
                    ValidationError::invalid_format(KEY_PLATFORM, e.to_string())
                },
            )?,
            _ => service_type.platform(),
        };
        let target_reference = map
            .get(KEY_TARGET_REFERENCE)
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self {
            order_id,
            owner_id,
            content: OrderContent {
                service_type,
                quantity,
                target_reference,
                platform,
            },
            amount_subtotal: parse_number::<i64>(map, KEY_AMOUNT_SUBTOTAL)?,
            amount_tax: parse_number::<i64>(map, KEY_AMOUNT_TAX)?,
        })
    }

    pub fn amount_total(&self) -> i64 {
        self.amount_subtotal + self.amount_tax
    }
}

fn required<'a>(map: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ValidationError> {
    map.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::empty_field(key))
}

fn parse_number<T: std::str::FromStr>(
    map: &HashMap<String, String>,
    key: &str,
) -> Result<T, ValidationError> {
    required(map, key)?
        .parse::<T>()
        .map_err(|_| ValidationError::invalid_format(key, "not a number"))
}
