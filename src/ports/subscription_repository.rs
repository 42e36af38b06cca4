//! Subscription repository port.
//!
//! Same conditional-write contract as the order repository.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::subscription::Subscription;

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts unless a row for the gateway subscription id exists.
    async fn insert_if_absent(&self, subscription: &Subscription) -> Result<bool, DomainError>;

    /// Version-checked update.
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    async fn find_by_gateway_id(
        &self,
        gateway_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;
}
