//! Checkout handlers - customer resolution, intent creation and order lookup.

mod create_payment_intent;
mod customer_resolver;
mod get_order;

pub use create_payment_intent::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
    DEFAULT_CURRENCY, MAX_TARGET_REFERENCE_LEN,
};
pub use customer_resolver::CustomerResolver;
pub use get_order::{GetOrderHandler, GetOrderQuery};
