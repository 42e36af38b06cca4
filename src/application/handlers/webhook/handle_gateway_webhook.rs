//! HandleGatewayWebhookHandler - authenticates, classifies and dispatches
//! gateway webhook deliveries.
//!
//! Returns `Ok` for every authenticated event that was applied, already
//! reflected, or recognized and ignored. Errors are limited to
//! authentication failures, malformed payloads and failed store writes.

use crate::domain::foundation::Timestamp;
use crate::domain::webhook::{
    GatewayEventKind, InvoiceObject, PaymentIntentObject, SubscriptionObject, WebhookError,
    WebhookVerifier,
};

use super::{OrderReconciler, SubscriptionReconciler};

/// Raw delivery as received over HTTP.
#[derive(Debug, Clone)]
pub struct HandleGatewayWebhookCommand {
    pub payload: Vec<u8>,
    /// Value of the `Stripe-Signature` header, if sent.
    pub signature: Option<String>,
}

/// Effect of an authenticated event on local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied,
    /// Stored state already reflected the event.
    Unchanged,
    /// Recognized and acknowledged without effect.
    Ignored(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleGatewayWebhookResult {
    pub event_id: String,
    pub event_type: String,
    pub outcome: WebhookOutcome,
}

pub struct HandleGatewayWebhookHandler {
    verifier: WebhookVerifier,
    require_livemode: bool,
    orders: OrderReconciler,
    subscriptions: SubscriptionReconciler,
}

impl HandleGatewayWebhookHandler {
    pub fn new(
        verifier: WebhookVerifier,
        orders: OrderReconciler,
        subscriptions: SubscriptionReconciler,
    ) -> Self {
        Self {
            verifier,
            require_livemode: false,
            orders,
            subscriptions,
        }
    }

    /// Acknowledges test-mode events without applying them.
    pub fn with_require_livemode(mut self, require_livemode: bool) -> Self {
        self.require_livemode = require_livemode;
        self
    }

    #[tracing::instrument(
        name = "gateway_webhook",
        skip_all,
        fields(event_id = tracing::field::Empty, event_type = tracing::field::Empty)
    )]
    pub async fn handle(
        &self,
        cmd: HandleGatewayWebhookCommand,
    ) -> Result<HandleGatewayWebhookResult, WebhookError> {
        // 1. Authenticity, before anything in the body is trusted
        let Some(signature) = cmd.signature.as_deref() else {
            tracing::warn!("Webhook delivery without signature header");
            return Err(WebhookError::InvalidSignature);
        };
        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, signature)
            .map_err(|e| {
                tracing::warn!(error = %e, "Webhook delivery rejected");
                e
            })?;

        let span = tracing::Span::current();
        span.record("event_id", event.id.as_str());
        span.record("event_type", event.event_type.as_str());

        let result = |outcome| HandleGatewayWebhookResult {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            outcome,
        };

        if self.require_livemode && !event.livemode {
            tracing::warn!("Test-mode event received while live mode is required");
            return Ok(result(WebhookOutcome::Ignored("test-mode event")));
        }

        // 2. Classify and dispatch
        let created = Timestamp::from_unix_secs(event.created)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;
        let kind = event.kind();
        let outcome = match kind {
            GatewayEventKind::PaymentSucceeded => {
                let intent = event.object_as::<PaymentIntentObject>()?;
                self.orders.payment_succeeded(&intent).await?
            }
            GatewayEventKind::PaymentFailed => {
                let intent = event.object_as::<PaymentIntentObject>()?;
                self.orders.payment_failed(&intent).await?
            }
            GatewayEventKind::InvoicePaid => {
                let invoice = event.object_as::<InvoiceObject>()?;
                self.subscriptions.invoice_paid(&invoice, created).await?
            }
            GatewayEventKind::InvoicePaymentFailed => {
                let invoice = event.object_as::<InvoiceObject>()?;
                self.subscriptions
                    .invoice_payment_failed(&invoice, created)
                    .await?
            }
            GatewayEventKind::SubscriptionCreated | GatewayEventKind::SubscriptionUpdated => {
                let subscription = event.object_as::<SubscriptionObject>()?;
                self.subscriptions
                    .subscription_changed(&subscription, created)
                    .await?
            }
            GatewayEventKind::SubscriptionDeleted => {
                let subscription = event.object_as::<SubscriptionObject>()?;
                self.subscriptions
                    .subscription_deleted(&subscription, created)
                    .await?
            }
            GatewayEventKind::Unknown => WebhookOutcome::Ignored("unhandled event type"),
        };

        tracing::info!(kind = kind.as_str(), ?outcome, "Webhook processed");
        Ok(result(outcome))
    }
}
