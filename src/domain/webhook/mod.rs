//! Webhook domain - authenticity checks and the gateway event model.

mod errors;
mod gateway_event;
mod payloads;
mod verifier;

pub use errors::WebhookError;
pub use gateway_event::{GatewayEvent, GatewayEventData, GatewayEventKind};
pub use payloads::{InvoiceObject, PaymentIntentObject, SubscriptionObject};
pub use verifier::{SignatureHeader, WebhookVerifier, DEFAULT_TOLERANCE_SECS};

#[cfg(test)]
pub use gateway_event::GatewayEventBuilder;
#[cfg(test)]
pub use verifier::compute_test_signature;
