//! Webhook handlers - gateway event intake and reconciliation.

mod handle_gateway_webhook;
mod order_reconciler;
mod subscription_reconciler;

pub use handle_gateway_webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, HandleGatewayWebhookResult,
    WebhookOutcome,
};
pub use order_reconciler::OrderReconciler;
pub use subscription_reconciler::SubscriptionReconciler;
