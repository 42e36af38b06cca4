//! Order repository port.
//!
//! Writes are conditional so concurrent webhook deliveries cannot overwrite
//! each other:
//!
//! - `insert_if_absent` never replaces an existing row;
//! - `update` only succeeds when the stored version equals `order.version`
//!   and fails with `ErrorCode::ConcurrentModification` otherwise.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId};
use crate::domain::order::Order;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts the order unless one with the same id or intent id exists.
    ///
    /// Returns `true` when this call created the row.
    async fn insert_if_absent(&self, order: &Order) -> Result<bool, DomainError>;

    /// Persists a mutated order, checking and bumping its version.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if no row exists
    /// - `ConcurrentModification` if the stored version moved on
    async fn update(&self, order: &Order) -> Result<(), DomainError>;

    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, DomainError>;

    async fn find_by_intent_id(&self, intent_id: &str) -> Result<Option<Order>, DomainError>;
}
