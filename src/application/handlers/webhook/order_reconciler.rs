//! OrderReconciler - applies payment intent events to orders.
//!
//! The webhook is the authority on payment state. Orders are located by the
//! `order_id` in intent metadata, then by intent id, and rebuilt from the
//! metadata when the intent-time write never landed.

use std::sync::Arc;

use crate::application::handlers::fulfillment::{TriggerFulfillmentCommand, TriggerFulfillmentHandler};
use crate::application::handlers::retry::update_order;
use crate::domain::foundation::{DomainError, OrderId, Timestamp, Transition};
use crate::domain::order::{Order, OrderMetadata};
use crate::domain::webhook::{PaymentIntentObject, WebhookError};
use crate::ports::OrderRepository;

use super::WebhookOutcome;

pub struct OrderReconciler {
    orders: Arc<dyn OrderRepository>,
    fulfillment: Arc<TriggerFulfillmentHandler>,
}

impl OrderReconciler {
    pub fn new(orders: Arc<dyn OrderRepository>, fulfillment: Arc<TriggerFulfillmentHandler>) -> Self {
        Self { orders, fulfillment }
    }

    /// `payment_intent.succeeded`: mark paid, then trigger fulfillment.
    ///
    /// The trigger runs on replays too; it is a no-op once the order is
    /// claimed, and it picks up orders whose earlier delivery stopped
    /// between the two steps. A failed trigger does not fail the delivery.
    pub async fn payment_succeeded(
        &self,
        intent: &PaymentIntentObject,
    ) -> Result<WebhookOutcome, WebhookError> {
        let now = Timestamp::now();

        // 1. Locate or rebuild the order
        let Some(order_id) = self.locate_or_rebuild(intent, now).await? else {
            return Ok(WebhookOutcome::Ignored("incomplete order metadata"));
        };

        // 2. Record the payment
        let (order, transition) = update_order(self.orders.as_ref(), &order_id, |order| {
            order.mark_paid(now)
        })
        .await
        .map_err(storage)?
        .ok_or_else(|| vanished(&order_id))?;

        if intent.amount != 0 && intent.amount != order.amount_total {
            tracing::warn!(
                order_id = %order_id,
                intent_amount = intent.amount,
                order_total = order.amount_total,
                "Captured amount differs from the order total"
            );
        }
        if transition.is_applied() {
            tracing::info!(order_id = %order_id, intent_id = %intent.id, "Order paid");
        }

        // 3. Claim and dispatch fulfillment; the payment is already recorded
        match self
            .fulfillment
            .handle(TriggerFulfillmentCommand {
                order_id: order_id.clone(),
            })
            .await
        {
            Ok(outcome) => {
                tracing::debug!(order_id = %order_id, ?outcome, "Fulfillment trigger finished");
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order_id,
                    error = %e,
                    "Fulfillment claim failed; order left paid with fulfillment unstarted"
                );
            }
        }

        Ok(WebhookOutcome::from(transition))
    }

    /// `payment_intent.payment_failed`: mark the payment failed.
    ///
    /// Ignored once the order is paid.
    pub async fn payment_failed(
        &self,
        intent: &PaymentIntentObject,
    ) -> Result<WebhookOutcome, WebhookError> {
        let now = Timestamp::now();
        let reason = intent.failure_reason();

        let Some(order_id) = self.locate_or_rebuild(intent, now).await? else {
            return Ok(WebhookOutcome::Ignored("incomplete order metadata"));
        };

        let (order, transition) = update_order(self.orders.as_ref(), &order_id, |order| {
            order.mark_payment_failed(reason.clone(), now)
        })
        .await
        .map_err(storage)?
        .ok_or_else(|| vanished(&order_id))?;

        if transition.is_applied() {
            tracing::info!(
                order_id = %order_id,
                reason = order.failure_reason.as_deref().unwrap_or("unknown"),
                "Order payment failed"
            );
        } else {
            tracing::debug!(
                order_id = %order_id,
                payment_status = %order.payment_status,
                "Payment failure does not change the order"
            );
        }

        Ok(WebhookOutcome::from(transition))
    }

    async fn locate_or_rebuild(
        &self,
        intent: &PaymentIntentObject,
        now: Timestamp,
    ) -> Result<Option<OrderId>, WebhookError> {
        let metadata = OrderMetadata::from_map(&intent.metadata);

        if let Ok(metadata) = &metadata {
            if self.orders.find_by_id(&metadata.order_id).await.map_err(storage)?.is_some() {
                return Ok(Some(metadata.order_id.clone()));
            }
        }
        if let Some(order) = self.orders.find_by_intent_id(&intent.id).await.map_err(storage)? {
            return Ok(Some(order.order_id));
        }

        let metadata = match metadata {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!(
                    intent_id = %intent.id,
                    error = %e,
                    "No order for intent and its metadata cannot rebuild one"
                );
                return Ok(None);
            }
        };
        let order = match Order::from_metadata(&metadata, intent.id.clone(), now) {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(
                    intent_id = %intent.id,
                    order_id = %metadata.order_id,
                    error = %e,
                    "Intent metadata describes an invalid order"
                );
                return Ok(None);
            }
        };

        if self.orders.insert_if_absent(&order).await.map_err(storage)? {
            tracing::info!(
                order_id = %order.order_id,
                intent_id = %intent.id,
                "Rebuilt missing order from intent metadata"
            );
        } else {
            tracing::debug!(order_id = %order.order_id, "Order inserted concurrently");
        }
        Ok(Some(metadata.order_id))
    }
}

impl From<Transition> for WebhookOutcome {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::Applied => WebhookOutcome::Applied,
            Transition::Unchanged => WebhookOutcome::Unchanged,
        }
    }
}

fn storage(err: DomainError) -> WebhookError {
    tracing::error!(error = %err, "Order store write failed");
    WebhookError::Storage(err.to_string())
}

fn vanished(order_id: &OrderId) -> WebhookError {
    WebhookError::Storage(format!("order {} disappeared during reconciliation", order_id))
}
