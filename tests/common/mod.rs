//! Shared fixtures for the integration suites.
//!
//! Everything runs against the in-memory stores, the mock payment gateway
//! and a recording fulfillment dispatcher.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use serde_json::{json, Value};
use sha2::Sha256;

use engagement_checkout::adapters::auth::MockSessionValidator;
use engagement_checkout::adapters::fulfillment::RecordingFulfillmentDispatcher;
use engagement_checkout::adapters::http::{app_router, CheckoutAppState, RouterSettings};
use engagement_checkout::adapters::memory::{
    InMemoryCustomerMappingRepository, InMemoryOrderRepository, InMemorySubscriptionRepository,
};
use engagement_checkout::adapters::stripe::MockPaymentGateway;
use engagement_checkout::application::handlers::checkout::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CustomerResolver, GetOrderHandler,
};
use engagement_checkout::application::handlers::fulfillment::{
    ReportFulfillmentHandler, TriggerFulfillmentHandler,
};
use engagement_checkout::application::handlers::webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, OrderReconciler,
    SubscriptionReconciler,
};
use engagement_checkout::domain::foundation::{AuthenticatedUser, UserId};
use engagement_checkout::domain::pricing::PriceCatalog;
use engagement_checkout::domain::webhook::WebhookVerifier;

pub const WEBHOOK_SECRET: &str = "whsec_integration_suite";
pub const REPORT_TOKEN: &str = "rpt_integration_suite";
pub const BUYER_TOKEN: &str = "buyer-token";
pub const OTHER_TOKEN: &str = "other-token";

// =============================================================================
// Identities
// =============================================================================

pub fn buyer() -> AuthenticatedUser {
    AuthenticatedUser::new(
        UserId::new("buyer-1").unwrap(),
        "Buyer@Example.com",
        Some("Buyer".to_string()),
        true,
    )
}

pub fn other_buyer() -> AuthenticatedUser {
    AuthenticatedUser::new(
        UserId::new("buyer-2").unwrap(),
        "someone.else@example.com",
        None,
        true,
    )
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub orders: InMemoryOrderRepository,
    pub subscriptions: InMemorySubscriptionRepository,
    pub mappings: InMemoryCustomerMappingRepository,
    pub gateway: MockPaymentGateway,
    pub dispatcher: RecordingFulfillmentDispatcher,
    pub create_intent: Arc<CreatePaymentIntentHandler>,
    pub get_order: Arc<GetOrderHandler>,
    pub webhook: Arc<HandleGatewayWebhookHandler>,
    pub report: Arc<ReportFulfillmentHandler>,
}

impl Harness {
    pub fn new() -> Self {
        let orders = InMemoryOrderRepository::new();
        let subscriptions = InMemorySubscriptionRepository::new();
        let mappings = InMemoryCustomerMappingRepository::new();
        let gateway = MockPaymentGateway::new();
        let dispatcher = RecordingFulfillmentDispatcher::new();

        let resolver = Arc::new(CustomerResolver::new(
            Arc::new(gateway.clone()),
            Arc::new(mappings.clone()),
        ));
        let trigger = Arc::new(TriggerFulfillmentHandler::new(
            Arc::new(orders.clone()),
            Arc::new(dispatcher.clone()),
        ));

        let create_intent = Arc::new(CreatePaymentIntentHandler::new(
            PriceCatalog::standard(),
            resolver.clone(),
            Arc::new(gateway.clone()),
            Arc::new(orders.clone()),
        ));
        let webhook = Arc::new(HandleGatewayWebhookHandler::new(
            WebhookVerifier::new(SecretString::new(WEBHOOK_SECRET.to_string())),
            OrderReconciler::new(Arc::new(orders.clone()), trigger),
            SubscriptionReconciler::new(Arc::new(subscriptions.clone()), resolver),
        ));

        Self {
            get_order: Arc::new(GetOrderHandler::new(Arc::new(orders.clone()))),
            report: Arc::new(ReportFulfillmentHandler::new(Arc::new(orders.clone()))),
            orders,
            subscriptions,
            mappings,
            gateway,
            dispatcher,
            create_intent,
            webhook,
        }
    }

    pub fn router(&self) -> Router {
        let state = CheckoutAppState {
            create_intent: self.create_intent.clone(),
            get_order: self.get_order.clone(),
            webhook: self.webhook.clone(),
            report_fulfillment: self.report.clone(),
            fulfillment_report_token: Some(Arc::new(SecretString::new(REPORT_TOKEN.to_string()))),
        };
        let validator = MockSessionValidator::new()
            .with_user(BUYER_TOKEN, buyer())
            .with_user(OTHER_TOKEN, other_buyer());

        app_router(state, Arc::new(validator), &RouterSettings::default())
    }

    /// Metadata and id of the n-th intent created at the mock gateway.
    pub fn intent(&self, index: usize) -> (String, HashMap<String, String>, i64) {
        let (intent, request) = self.gateway.created_intents()[index].clone();
        (intent.id, request.metadata, request.amount)
    }

    /// Delivers a correctly signed event.
    pub async fn deliver(
        &self,
        payload: &str,
    ) -> Result<
        engagement_checkout::application::handlers::webhook::HandleGatewayWebhookResult,
        engagement_checkout::domain::webhook::WebhookError,
    > {
        self.webhook
            .handle(HandleGatewayWebhookCommand {
                payload: payload.as_bytes().to_vec(),
                signature: Some(signature_header(WEBHOOK_SECRET, payload)),
            })
            .await
    }
}

pub fn twitch_viewers_500() -> CreatePaymentIntentCommand {
    CreatePaymentIntentCommand {
        owner: buyer(),
        service_type: "TWITCH_VIEWERS".to_string(),
        quantity: 500,
        amount: 2999,
        target_reference: Some("https://twitch.tv/some_streamer".to_string()),
        platform: Some("twitch".to_string()),
    }
}

// =============================================================================
// Webhook payloads
// =============================================================================

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// `Stripe-Signature` header value for `payload`, signed now.
pub fn signature_header(secret: &str, payload: &str) -> String {
    signature_header_at(secret, payload, now())
}

pub fn signature_header_at(secret: &str, payload: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

pub fn event(id: &str, event_type: &str, created: i64, object: Value) -> String {
    json!({
        "id": id,
        "object": "event",
        "type": event_type,
        "created": created,
        "livemode": false,
        "data": { "object": object },
    })
    .to_string()
}

pub fn payment_succeeded(
    event_id: &str,
    intent_id: &str,
    amount: i64,
    metadata: &HashMap<String, String>,
) -> String {
    event(
        event_id,
        "payment_intent.succeeded",
        now(),
        json!({
            "id": intent_id,
            "object": "payment_intent",
            "amount": amount,
            "currency": "inr",
            "metadata": metadata,
        }),
    )
}

pub fn payment_failed(
    event_id: &str,
    intent_id: &str,
    metadata: &HashMap<String, String>,
) -> String {
    event(
        event_id,
        "payment_intent.payment_failed",
        now(),
        json!({
            "id": intent_id,
            "object": "payment_intent",
            "metadata": metadata,
            "last_payment_error": { "code": "card_declined", "message": "Your card was declined." },
        }),
    )
}

pub fn subscription_event(
    event_id: &str,
    event_type: &str,
    created: i64,
    status: &str,
    period: (i64, i64),
) -> String {
    event(
        event_id,
        event_type,
        created,
        json!({
            "id": "sub_integration",
            "object": "subscription",
            "customer": "cus_integration",
            "status": status,
            "current_period_start": period.0,
            "current_period_end": period.1,
            "items": { "data": [{ "price": { "id": "price_growth_monthly" } }] },
        }),
    )
}

pub fn invoice_event(event_id: &str, event_type: &str, created: i64, period: (i64, i64)) -> String {
    event(
        event_id,
        event_type,
        created,
        json!({
            "id": format!("in_{}", event_id),
            "object": "invoice",
            "customer": "cus_integration",
            "subscription": "sub_integration",
            "lines": { "data": [{ "period": { "start": period.0, "end": period.1 } }] },
        }),
    )
}
