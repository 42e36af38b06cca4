//! HTTP DTOs for the checkout, order and fulfillment-report endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::checkout::CreatePaymentIntentResult;
use crate::application::handlers::fulfillment::FulfillmentOutcome;
use crate::domain::foundation::Timestamp;
use crate::domain::order::Order;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/payments/intent`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub service_type: String,
    pub quantity: i64,
    /// Client-computed subtotal in minor units.
    pub amount: i64,
    #[serde(default, alias = "target_reference")]
    pub target_url: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Body of `POST /internal/fulfillment/{order_id}/report`.
#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentReportRequest {
    pub outcome: FulfillmentOutcome,
    #[serde(default)]
    pub reason: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    pub order_id: String,
    pub amount_subtotal: i64,
    pub amount_tax: i64,
    pub amount_total: i64,
}

impl From<CreatePaymentIntentResult> for PaymentIntentResponse {
    fn from(result: CreatePaymentIntentResult) -> Self {
        Self {
            client_secret: result.client_secret,
            order_id: result.order_id.to_string(),
            amount_subtotal: result.quote.subtotal,
            amount_tax: result.quote.tax,
            amount_total: result.quote.total,
        }
    }
}

/// Order as shown to its owner and to the fulfillment worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub service_type: String,
    pub quantity: u32,
    pub target_reference: Option<String>,
    pub platform: String,
    pub amount_subtotal: i64,
    pub amount_tax: i64,
    pub amount_total: i64,
    pub payment_status: String,
    pub status: String,
    pub fulfillment_status: String,
    pub failure_reason: Option<String>,
    /// ISO 8601.
    pub created_at: String,
    pub paid_at: Option<String>,
    pub fulfillment_completed_at: Option<String>,
}

fn iso(ts: &Timestamp) -> String {
    ts.as_datetime().to_rfc3339()
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.to_string(),
            service_type: order.service_type.to_string(),
            quantity: order.quantity,
            target_reference: order.target_reference.clone(),
            platform: order.platform.to_string(),
            amount_subtotal: order.amount_subtotal,
            amount_tax: order.amount_tax,
            amount_total: order.amount_total,
            payment_status: order.payment_status.to_string(),
            status: order.status.to_string(),
            fulfillment_status: order.fulfillment_status.to_string(),
            failure_reason: order.failure_reason.clone(),
            created_at: iso(&order.created_at),
            paid_at: order.paid_at.as_ref().map(iso),
            fulfillment_completed_at: order.fulfillment_completed_at.as_ref().map(iso),
        }
    }
}

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAckResponse {
    pub received: bool,
}

impl WebhookAckResponse {
    pub fn received() -> Self {
        Self { received: true }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable code for programmatic handling.
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{OrderId, UserId};
    use crate::domain::order::{OrderContent, OrderMetadata};
    use crate::domain::pricing::{Platform, Quote, ServiceType};
    use serde_json::json;

    #[test]
    fn intent_request_accepts_target_url() {
        let request: CreatePaymentIntentRequest = serde_json::from_value(json!({
            "service_type": "TWITCH_VIEWERS",
            "quantity": 500,
            "amount": 2999,
            "target_url": "https://twitch.tv/someone",
        }))
        .unwrap();

        assert_eq!(request.target_url.as_deref(), Some("https://twitch.tv/someone"));
        assert!(request.platform.is_none());
    }

    #[test]
    fn intent_request_accepts_target_reference_alias() {
        let request: CreatePaymentIntentRequest = serde_json::from_value(json!({
            "service_type": "INSTAGRAM_LIKES",
            "quantity": 100,
            "amount": 199,
            "target_reference": "@brand",
            "platform": "instagram",
        }))
        .unwrap();

        assert_eq!(request.target_url.as_deref(), Some("@brand"));
        assert_eq!(request.platform.as_deref(), Some("instagram"));
    }

    #[test]
    fn intent_request_requires_amount() {
        let result: Result<CreatePaymentIntentRequest, _> = serde_json::from_value(json!({
            "service_type": "TWITCH_VIEWERS",
            "quantity": 500,
        }));

        assert!(result.is_err());
    }

    #[test]
    fn intent_response_carries_the_quote() {
        let order_id = OrderId::generate(Timestamp::now());
        let response = PaymentIntentResponse::from(CreatePaymentIntentResult {
            client_secret: "pi_1_secret".to_string(),
            order_id: order_id.clone(),
            quote: Quote {
                subtotal: 2999,
                tax: 540,
                total: 3539,
            },
        });

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["order_id"], order_id.to_string());
        assert_eq!(value["amount_tax"], 540);
        assert_eq!(value["amount_total"], 3539);
    }

    #[test]
    fn report_request_parses_lowercase_outcome() {
        let request: FulfillmentReportRequest =
            serde_json::from_value(json!({ "outcome": "failed", "reason": "target private" }))
                .unwrap();

        assert_eq!(request.outcome, FulfillmentOutcome::Failed);
        assert_eq!(request.reason.as_deref(), Some("target private"));
    }

    #[test]
    fn order_response_uses_wire_names() {
        let meta = OrderMetadata {
            order_id: OrderId::generate(Timestamp::now()),
            owner_id: UserId::new("user-1").unwrap(),
            content: OrderContent {
                service_type: ServiceType::TwitchViewers,
                quantity: 500,
                target_reference: Some("https://twitch.tv/someone".to_string()),
                platform: Platform::Twitch,
            },
            amount_subtotal: 2999,
            amount_tax: 540,
        };
        let order = Order::from_metadata(&meta, "pi_1", Timestamp::now()).unwrap();

        let response = OrderResponse::from(&order);

        assert_eq!(response.service_type, "TWITCH_VIEWERS");
        assert_eq!(response.platform, "twitch");
        assert_eq!(response.amount_total, 3539);
        assert!(response.paid_at.is_none());
    }

    #[test]
    fn ack_serializes_received_true() {
        assert_eq!(
            serde_json::to_value(WebhookAckResponse::received()).unwrap(),
            json!({ "received": true })
        );
    }
}
