//! In-memory order repository.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::domain::order::Order;
use crate::ports::OrderRepository;

#[derive(Default)]
struct OrderTable {
    orders: HashMap<OrderId, Order>,
    by_intent: HashMap<String, OrderId>,
}

/// Orders keyed by id with a unique secondary index on the intent id.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    table: Arc<RwLock<OrderTable>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn all(&self) -> Vec<Order> {
        self.table.read().await.orders.values().cloned().collect()
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("order store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert_if_absent(&self, order: &Order) -> Result<bool, DomainError> {
        self.check_writable()?;

        let mut table = self.table.write().await;
        if table.orders.contains_key(&order.order_id)
            || table.by_intent.contains_key(&order.gateway_intent_id)
        {
            return Ok(false);
        }

        table
            .by_intent
            .insert(order.gateway_intent_id.clone(), order.order_id.clone());
        table.orders.insert(order.order_id.clone(), order.clone());
        Ok(true)
    }

    async fn update(&self, order: &Order) -> Result<(), DomainError> {
        self.check_writable()?;

        let mut table = self.table.write().await;
        let stored = table.orders.get_mut(&order.order_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order not found: {}", order.order_id),
            )
        })?;

        if stored.version != order.version {
            return Err(DomainError::concurrent_modification("order")
                .with_detail("order_id", order.order_id.to_string()));
        }

        let mut next = order.clone();
        next.version = order.version + 1;
        *stored = next;
        Ok(())
    }

    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.table.read().await.orders.get(order_id).cloned())
    }

    async fn find_by_intent_id(&self, intent_id: &str) -> Result<Option<Order>, DomainError> {
        let table = self.table.read().await;
        Ok(table
            .by_intent
            .get(intent_id)
            .and_then(|id| table.orders.get(id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::order::{OrderContent, PaymentStatus};
    use crate::domain::pricing::{Platform, Quote, ServiceType};

    fn order(intent_id: &str) -> Order {
        Order::new_pending(
            OrderId::generate(Timestamp::now()),
            intent_id,
            UserId::new("user-1").unwrap(),
            OrderContent {
                service_type: ServiceType::InstagramLikes,
                quantity: 100,
                target_reference: None,
                platform: Platform::Instagram,
            },
            Quote {
                subtotal: 149,
                tax: 27,
                total: 176,
            },
            Timestamp::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_if_absent_rejects_duplicate_id_and_intent() {
        let repo = InMemoryOrderRepository::new();
        let first = order("pi_1");

        assert!(repo.insert_if_absent(&first).await.unwrap());
        assert!(!repo.insert_if_absent(&first).await.unwrap());

        let same_intent = order("pi_1");
        assert!(!repo.insert_if_absent(&same_intent).await.unwrap());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn finds_by_id_and_intent() {
        let repo = InMemoryOrderRepository::new();
        let stored = order("pi_2");
        repo.insert_if_absent(&stored).await.unwrap();

        assert_eq!(repo.find_by_id(&stored.order_id).await.unwrap(), Some(stored.clone()));
        assert_eq!(repo.find_by_intent_id("pi_2").await.unwrap(), Some(stored));
        assert!(repo.find_by_intent_id("pi_other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_bumps_version() {
        let repo = InMemoryOrderRepository::new();
        let mut stored = order("pi_3");
        repo.insert_if_absent(&stored).await.unwrap();

        stored.mark_paid(Timestamp::now()).unwrap();
        repo.update(&stored).await.unwrap();

        let reloaded = repo.find_by_id(&stored.order_id).await.unwrap().unwrap();
        assert_eq!(reloaded.version, 1);
        assert_eq!(reloaded.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn update_with_stale_version_conflicts() {
        let repo = InMemoryOrderRepository::new();
        let original = order("pi_4");
        repo.insert_if_absent(&original).await.unwrap();

        let mut first = original.clone();
        first.mark_paid(Timestamp::now()).unwrap();
        repo.update(&first).await.unwrap();

        let mut second = original;
        second
            .mark_payment_failed(Some("declined".to_string()), Timestamp::now())
            .unwrap();
        let err = repo.update(&second).await.unwrap_err();

        assert!(err.is_conflict());
        let stored = repo.find_by_id(&second.order_id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn update_missing_order_is_not_found() {
        let repo = InMemoryOrderRepository::new();
        let err = repo.update(&order("pi_5")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn failing_writes_leave_reads_working() {
        let repo = InMemoryOrderRepository::new();
        let stored = order("pi_6");
        repo.insert_if_absent(&stored).await.unwrap();

        repo.set_fail_writes(true);
        let err = repo.insert_if_absent(&order("pi_7")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(repo.find_by_id(&stored.order_id).await.unwrap().is_some());
    }
}
