//! Application layer - commands, queries and their handlers.
//!
//! Handlers own no state beyond their ports. Writes from the webhook path are
//! version-checked and retried on conflict (see [`handlers::retry`]).

pub mod handlers;

pub use handlers::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
    CustomerResolver, FulfillmentOutcome, GetOrderHandler, GetOrderQuery,
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, HandleGatewayWebhookResult,
    OrderReconciler, ReportFulfillmentCommand, ReportFulfillmentHandler, ReportFulfillmentResult,
    SubscriptionReconciler, TriggerFulfillmentCommand, TriggerFulfillmentHandler, TriggerOutcome,
    WebhookOutcome,
};
