//! ReportFulfillmentHandler - records the worker's delivery outcome.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::application::handlers::retry::update_order;
use crate::domain::foundation::{OrderId, Timestamp, Transition};
use crate::domain::order::{CheckoutError, Order};
use crate::ports::OrderRepository;

/// Outcome reported by the fulfillment worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentOutcome {
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ReportFulfillmentCommand {
    pub order_id: String,
    pub outcome: FulfillmentOutcome,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportFulfillmentResult {
    pub order: Order,
    /// False when the report repeated an already recorded outcome.
    pub changed: bool,
}

pub struct ReportFulfillmentHandler {
    orders: Arc<dyn OrderRepository>,
}

impl ReportFulfillmentHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// Orders that are not in fulfillment reject the report with
    /// `InvalidState`.
    pub async fn handle(
        &self,
        cmd: ReportFulfillmentCommand,
    ) -> Result<ReportFulfillmentResult, CheckoutError> {
        let order_id = OrderId::parse(cmd.order_id.as_str())
            .map_err(|_| CheckoutError::order_not_found(cmd.order_id.clone()))?;
        let reason = cmd
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let now = Timestamp::now();
        let updated = update_order(self.orders.as_ref(), &order_id, |order| match cmd.outcome {
            FulfillmentOutcome::Completed => order.complete_fulfillment(now),
            FulfillmentOutcome::Failed => order.fail_fulfillment(reason.clone(), now),
        })
        .await
        .map_err(|e| {
            if e.is_conflict() {
                tracing::error!(order_id = %order_id, error = %e, "Fulfillment report lost to concurrent writes");
            }
            CheckoutError::from(e)
        })?;

        let Some((order, transition)) = updated else {
            return Err(CheckoutError::order_not_found(order_id.to_string()));
        };

        let changed = transition == Transition::Applied;
        if changed {
            tracing::info!(
                order_id = %order.order_id,
                outcome = ?cmd.outcome,
                status = %order.status,
                "Fulfillment outcome recorded"
            );
        } else {
            tracing::debug!(order_id = %order.order_id, outcome = ?cmd.outcome, "Repeated fulfillment report");
        }

        Ok(ReportFulfillmentResult { order, changed })
    }
}
