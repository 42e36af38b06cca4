//! TriggerFulfillmentHandler - claims a paid order and hands it to the worker.
//!
//! The claim (`fulfillment_status: unstarted -> processing`) is persisted
//! with a version check before anything is dispatched, so among duplicate
//! deliveries exactly one notifies the worker.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, OrderId, Timestamp, Transition};
use crate::ports::{FulfillmentDispatcher, FulfillmentRequest, OrderRepository};

use crate::application::handlers::retry::update_order;

#[derive(Debug, Clone)]
pub struct TriggerFulfillmentCommand {
    pub order_id: OrderId,
}

/// What the trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Claimed and queued for the worker.
    Dispatched,
    /// Claimed, but the queue refused the request. The order stays
    /// `processing`.
    DispatchFailed,
    /// Unpaid or already claimed; nothing changed.
    NotReady,
    OrderMissing,
}

pub struct TriggerFulfillmentHandler {
    orders: Arc<dyn OrderRepository>,
    dispatcher: Arc<dyn FulfillmentDispatcher>,
}

impl TriggerFulfillmentHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        dispatcher: Arc<dyn FulfillmentDispatcher>,
    ) -> Self {
        Self { orders, dispatcher }
    }

    /// Fails only when the claim cannot be persisted.
    pub async fn handle(&self, cmd: TriggerFulfillmentCommand) -> Result<TriggerOutcome, DomainError> {
        // 1. Claim the order against its current stored state
        let now = Timestamp::now();
        let claimed = update_order(self.orders.as_ref(), &cmd.order_id, |order| {
            order.begin_fulfillment(now)
        })
        .await?;

        let order = match claimed {
            None => {
                tracing::warn!(order_id = %cmd.order_id, "Fulfillment trigger for unknown order");
                return Ok(TriggerOutcome::OrderMissing);
            }
            Some((order, Transition::Unchanged)) => {
                tracing::debug!(
                    order_id = %cmd.order_id,
                    payment_status = %order.payment_status,
                    fulfillment_status = %order.fulfillment_status,
                    "Order not ready for fulfillment, skipping"
                );
                return Ok(TriggerOutcome::NotReady);
            }
            Some((order, Transition::Applied)) => order,
        };

        // 2. Hand off, fire-and-forget
        match self.dispatcher.dispatch(FulfillmentRequest::from(&order)).await {
            Ok(()) => {
                tracing::info!(
                    order_id = %order.order_id,
                    service_type = %order.service_type,
                    quantity = order.quantity,
                    "Fulfillment dispatched"
                );
                Ok(TriggerOutcome::Dispatched)
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order.order_id,
                    error = %e,
                    "Fulfillment dispatch failed; order remains processing"
                );
                Ok(TriggerOutcome::DispatchFailed)
            }
        }
    }
}
