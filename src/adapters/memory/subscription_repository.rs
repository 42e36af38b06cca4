//! In-memory subscription repository.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

#[derive(Clone, Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: Arc<RwLock<HashMap<String, Subscription>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("subscription store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn insert_if_absent(&self, subscription: &Subscription) -> Result<bool, DomainError> {
        self.check_writable()?;

        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions.contains_key(&subscription.gateway_subscription_id) {
            return Ok(false);
        }
        subscriptions.insert(
            subscription.gateway_subscription_id.clone(),
            subscription.clone(),
        );
        Ok(true)
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.check_writable()?;

        let mut subscriptions = self.subscriptions.write().await;
        let stored = subscriptions
            .get_mut(&subscription.gateway_subscription_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::SubscriptionNotFound,
                    format!(
                        "Subscription not found: {}",
                        subscription.gateway_subscription_id
                    ),
                )
            })?;

        if stored.version != subscription.version {
            return Err(DomainError::concurrent_modification("subscription").with_detail(
                "gateway_subscription_id",
                subscription.gateway_subscription_id.clone(),
            ));
        }

        let mut next = subscription.clone();
        next.version = subscription.version + 1;
        *stored = next;
        Ok(())
    }

    async fn find_by_gateway_id(
        &self,
        gateway_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .get(gateway_subscription_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::subscription::{SubscriptionSnapshot, SubscriptionStatus};

    fn subscription(id: &str) -> Subscription {
        let now = Timestamp::now();
        Subscription::create(
            id,
            "cus_1",
            Some("fan@example.com".to_string()),
            SubscriptionSnapshot {
                status: SubscriptionStatus::Active,
                period: None,
                plan_id: None,
                event_created: now,
            },
            now,
        )
    }

    #[tokio::test]
    async fn insert_is_keyed_by_gateway_id() {
        let repo = InMemorySubscriptionRepository::new();

        assert!(repo.insert_if_absent(&subscription("sub_1")).await.unwrap());
        assert!(!repo.insert_if_absent(&subscription("sub_1")).await.unwrap());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn update_is_version_checked() {
        let repo = InMemorySubscriptionRepository::new();
        let original = subscription("sub_2");
        repo.insert_if_absent(&original).await.unwrap();

        let mut first = original.clone();
        first.cancel(Timestamp::now(), Timestamp::now());
        repo.update(&first).await.unwrap();

        let err = repo.update(&original).await.unwrap_err();
        assert!(err.is_conflict());

        let stored = repo.find_by_gateway_id("sub_2").await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Canceled);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let repo = InMemorySubscriptionRepository::new();
        let err = repo.update(&subscription("sub_x")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }
}
