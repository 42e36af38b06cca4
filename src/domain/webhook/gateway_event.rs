//! Gateway webhook event envelope.
//!
//! Only the fields reconciliation needs are captured; everything else in the
//! gateway's event schema is ignored. Event ids are informational and never
//! used for deduplication.

use serde::{Deserialize, Serialize};

use super::WebhookError;

/// Webhook event as delivered by the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayEvent {
    /// Event identifier (`evt_...`).
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    /// Creation time (Unix seconds).
    pub created: i64,

    pub data: GatewayEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Container for the event object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayEventData {
    /// Object the event is about; shape depends on `type`.
    pub object: serde_json::Value,
}

/// Event classes the processor routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEventKind {
    PaymentSucceeded,
    PaymentFailed,
    InvoicePaid,
    InvoicePaymentFailed,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    /// Acknowledged and ignored.
    Unknown,
}

impl GatewayEventKind {
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "payment_intent.succeeded" => Self::PaymentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentFailed,
            "invoice.paid" | "invoice.payment_succeeded" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            _ => Self::Unknown,
        }
    }

    /// Short name used in logs and the webhook response.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentSucceeded => "payment_succeeded",
            Self::PaymentFailed => "payment_failed",
            Self::InvoicePaid => "invoice_paid",
            Self::InvoicePaymentFailed => "invoice_payment_failed",
            Self::SubscriptionCreated => "subscription_created",
            Self::SubscriptionUpdated => "subscription_updated",
            Self::SubscriptionDeleted => "subscription_deleted",
            Self::Unknown => "unknown",
        }
    }
}

impl GatewayEvent {
    pub fn kind(&self) -> GatewayEventKind {
        GatewayEventKind::from_event_type(&self.event_type)
    }

    /// Deserializes the event object as the given payload type.
    pub fn object_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, WebhookError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            WebhookError::ParseError(format!("{} object: {}", self.event_type, e))
        })
    }
}

/// Builder for test events.
#[cfg(test)]
pub struct GatewayEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
}

#[cfg(test)]
impl Default for GatewayEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "payment_intent.succeeded".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
        }
    }
}

#[cfg(test)]
impl GatewayEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> GatewayEvent {
        GatewayEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: GatewayEventData {
                object: self.object,
            },
            livemode: false,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_minimal_event() {
        let json = r#"{
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "created": 1704067200,
            "data": { "object": { "id": "pi_1" } }
        }"#;

        let event: GatewayEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.kind(), GatewayEventKind::PaymentSucceeded);
        assert!(!event.livemode);
        assert_eq!(event.api_version, None);
    }

    #[test]
    fn missing_data_fails_to_parse() {
        let json = r#"{"id":"evt_1","type":"invoice.paid","created":1}"#;
        assert!(serde_json::from_str::<GatewayEvent>(json).is_err());
    }

    #[test]
    fn event_types_classify() {
        use GatewayEventKind::*;
        let cases = [
            ("payment_intent.succeeded", PaymentSucceeded),
            ("payment_intent.payment_failed", PaymentFailed),
            ("invoice.paid", InvoicePaid),
            ("invoice.payment_succeeded", InvoicePaid),
            ("invoice.payment_failed", InvoicePaymentFailed),
            ("customer.subscription.created", SubscriptionCreated),
            ("customer.subscription.updated", SubscriptionUpdated),
            ("customer.subscription.deleted", SubscriptionDeleted),
            ("charge.refunded", Unknown),
        ];
        for (raw, kind) in cases {
            assert_eq!(GatewayEventKind::from_event_type(raw), kind, "{}", raw);
        }
    }

    #[test]
    fn object_as_reports_event_type_on_failure() {
        #[derive(Debug, Deserialize)]
        struct NeedsId {
            #[allow(dead_code)]
            id: String,
        }

        let event = GatewayEventBuilder::new()
            .event_type("invoice.paid")
            .object(json!({ "amount": 5 }))
            .build();

        let err = event.object_as::<NeedsId>().unwrap_err();
        match err {
            WebhookError::ParseError(msg) => assert!(msg.starts_with("invoice.paid object")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
