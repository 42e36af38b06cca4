//! Ports - interfaces between the application core and infrastructure.
//!
//! Every port is an `async_trait` object used behind `Arc<dyn Port>`.

mod customer_mapping_repository;
mod fulfillment_dispatcher;
mod order_repository;
mod payment_gateway;
mod session_validator;
mod subscription_repository;

pub use customer_mapping_repository::{CustomerMapping, CustomerMappingRepository};
pub use fulfillment_dispatcher::{DispatchError, FulfillmentDispatcher, FulfillmentRequest};
pub use order_repository::OrderRepository;
pub use payment_gateway::{
    CreateCustomerRequest, CreatePaymentIntentRequest, Customer, PaymentError, PaymentErrorCode,
    PaymentGateway, PaymentIntent,
};
pub use session_validator::SessionValidator;
pub use subscription_repository::SubscriptionRepository;
