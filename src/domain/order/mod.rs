//! Order domain - the order aggregate and its fulfillment state machine.

mod aggregate;
mod errors;
mod metadata;
mod status;

pub use aggregate::Order;
pub use errors::CheckoutError;
pub use metadata::{OrderContent, OrderMetadata};
pub use status::{FulfillmentStatus, OrderStatus, PaymentStatus};
