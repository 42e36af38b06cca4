//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations over the
//! ports.

pub mod checkout;
pub mod fulfillment;
pub mod retry;
pub mod webhook;

pub use checkout::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
    CustomerResolver, GetOrderHandler, GetOrderQuery,
};
pub use fulfillment::{
    FulfillmentOutcome, ReportFulfillmentCommand, ReportFulfillmentHandler,
    ReportFulfillmentResult, TriggerFulfillmentCommand, TriggerFulfillmentHandler,
    TriggerOutcome,
};
pub use webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, HandleGatewayWebhookResult,
    OrderReconciler, SubscriptionReconciler, WebhookOutcome,
};
