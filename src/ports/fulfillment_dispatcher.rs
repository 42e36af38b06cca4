//! Fulfillment dispatch port.
//!
//! Hands a claimed order to the external fulfillment worker. Dispatch is
//! fire-and-forget: implementations must not wait for the worker.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::OrderId;
use crate::domain::order::Order;
use crate::domain::pricing::{Platform, ServiceType};

/// Notification sent to the fulfillment worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentRequest {
    pub order_id: OrderId,
    pub service_type: ServiceType,
    pub quantity: u32,
    pub target_reference: Option<String>,
    pub platform: Platform,
}

impl From<&Order> for FulfillmentRequest {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            service_type: order.service_type,
            quantity: order.quantity,
            target_reference: order.target_reference.clone(),
            platform: order.platform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Fulfillment queue is full")]
    QueueFull,

    #[error("Fulfillment queue is closed")]
    QueueClosed,

    #[error("Fulfillment worker rejected the request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait FulfillmentDispatcher: Send + Sync {
    /// Enqueues the request for the worker. Never blocks on the worker.
    async fn dispatch(&self, request: FulfillmentRequest) -> Result<(), DispatchError>;
}
