//! Version-checked writes with bounded reload-and-retry.
//!
//! Every order and subscription mutation goes through here: load the row,
//! apply the change to the fresh state, write it back with the version it
//! was loaded at. A `ConcurrentModification` means another delivery got
//! there first, so the change is re-applied against the newer row.

use std::future::Future;

use crate::domain::foundation::{DomainError, OrderId, Transition};
use crate::domain::order::Order;
use crate::domain::subscription::{SnapshotOutcome, Subscription};
use crate::ports::{OrderRepository, SubscriptionRepository};

/// Attempts per write before the conflict is surfaced to the caller.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Result of applying a change to an aggregate.
pub trait WriteOutcome: Copy + Send {
    /// True when the aggregate changed and must be written back.
    fn needs_write(&self) -> bool;
}

impl WriteOutcome for Transition {
    fn needs_write(&self) -> bool {
        self.is_applied()
    }
}

impl WriteOutcome for SnapshotOutcome {
    fn needs_write(&self) -> bool {
        self.is_applied()
    }
}

/// Runs `write` until it succeeds, fails with something other than a
/// version conflict, or runs out of attempts.
pub async fn with_conflict_retry<T, F, Fut>(entity: &str, mut write: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Err(e) if e.is_conflict() && attempt < MAX_WRITE_ATTEMPTS => {
                tracing::debug!(entity, attempt, "Version conflict, reloading");
                attempt += 1;
            }
            Err(e) if e.is_conflict() => {
                tracing::warn!(entity, attempts = attempt, "Giving up after repeated version conflicts");
                return Err(e);
            }
            other => return other,
        }
    }
}

/// Applies `change` to the stored order.
///
/// Returns `None` when the order does not exist. The returned order carries
/// the version it was written with.
pub async fn update_order<O, F>(
    orders: &dyn OrderRepository,
    order_id: &OrderId,
    change: F,
) -> Result<Option<(Order, O)>, DomainError>
where
    O: WriteOutcome,
    F: Fn(&mut Order) -> Result<O, DomainError> + Sync,
{
    let change = &change;
    with_conflict_retry("order", move || async move {
        let Some(mut order) = orders.find_by_id(order_id).await? else {
            return Ok(None);
        };
        let outcome = change(&mut order)?;
        if outcome.needs_write() {
            orders.update(&order).await?;
            order.version += 1;
        }
        Ok(Some((order, outcome)))
    })
    .await
}

/// Applies `change` to the stored subscription. `None` when absent.
pub async fn update_subscription<O, F>(
    subscriptions: &dyn SubscriptionRepository,
    gateway_subscription_id: &str,
    change: F,
) -> Result<Option<(Subscription, O)>, DomainError>
where
    O: WriteOutcome,
    F: Fn(&mut Subscription) -> O + Sync,
{
    let change = &change;
    with_conflict_retry("subscription", move || async move {
        let Some(mut subscription) = subscriptions
            .find_by_gateway_id(gateway_subscription_id)
            .await?
        else {
            return Ok(None);
        };
        let outcome = change(&mut subscription);
        if outcome.needs_write() {
            subscriptions.update(&subscription).await?;
            subscription.version += 1;
        }
        Ok(Some((subscription, outcome)))
    })
    .await
}
