//! GetOrderHandler - query handler for a caller's own order.

use std::sync::Arc;

use crate::domain::foundation::{OrderId, UserId};
use crate::domain::order::{CheckoutError, Order};
use crate::ports::OrderRepository;

#[derive(Debug, Clone)]
pub struct GetOrderQuery {
    pub order_id: String,
    pub requested_by: UserId,
}

pub struct GetOrderHandler {
    orders: Arc<dyn OrderRepository>,
}

impl GetOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// Orders belonging to someone else are reported as not found, as are
    /// malformed ids.
    pub async fn handle(&self, query: GetOrderQuery) -> Result<Order, CheckoutError> {
        let order_id = OrderId::parse(query.order_id.as_str())
            .map_err(|_| CheckoutError::order_not_found(query.order_id.clone()))?;

        match self.orders.find_by_id(&order_id).await? {
            Some(order) if order.is_owned_by(&query.requested_by) => Ok(order),
            Some(_) => {
                tracing::debug!(
                    order_id = %order_id,
                    requested_by = %query.requested_by,
                    "Order requested by a non-owner"
                );
                Err(CheckoutError::order_not_found(order_id.to_string()))
            }
            None => Err(CheckoutError::order_not_found(order_id.to_string())),
        }
    }
}
