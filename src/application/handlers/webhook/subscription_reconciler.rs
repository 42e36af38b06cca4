//! SubscriptionReconciler - mirrors gateway subscription events locally.
//!
//! Subscription and invoice events carry a snapshot of the subscription.
//! Snapshots are applied through `Subscription::apply_snapshot`, which
//! discards stale ones and treats `canceled` as terminal, so out-of-order
//! deliveries converge on the newest billing period.

use std::sync::Arc;

use crate::application::handlers::checkout::CustomerResolver;
use crate::application::handlers::retry::update_subscription;
use crate::domain::foundation::{DomainError, Timestamp, Transition};
use crate::domain::subscription::{
    SnapshotOutcome, Subscription, SubscriptionSnapshot, SubscriptionStatus,
};
use crate::domain::webhook::{InvoiceObject, SubscriptionObject, WebhookError};
use crate::ports::SubscriptionRepository;

use super::WebhookOutcome;

pub struct SubscriptionReconciler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    customers: Arc<CustomerResolver>,
}

impl SubscriptionReconciler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        customers: Arc<CustomerResolver>,
    ) -> Self {
        Self {
            subscriptions,
            customers,
        }
    }

    /// `customer.subscription.created` and `customer.subscription.updated`.
    ///
    /// Both upsert: an update that outruns its creation event creates the
    /// row, and the late creation event is then discarded as stale.
    pub async fn subscription_changed(
        &self,
        subscription: &SubscriptionObject,
        event_created: Timestamp,
    ) -> Result<WebhookOutcome, WebhookError> {
        let Some(status) = SubscriptionStatus::from_gateway(&subscription.status) else {
            tracing::info!(
                subscription_id = %subscription.id,
                gateway_status = %subscription.status,
                "Subscription status has no local meaning, ignoring"
            );
            return Ok(WebhookOutcome::Ignored("unmapped subscription status"));
        };
        let snapshot = SubscriptionSnapshot {
            status,
            period: subscription.billing_period()?,
            plan_id: subscription.plan_id(),
            event_created,
        };

        // 1. Existing row: apply the snapshot
        if let Some(outcome) = self.apply(&subscription.id, &snapshot).await? {
            return Ok(outcome);
        }

        // 2. New row
        let now = Timestamp::now();
        let contact = self.customers.contact_for_customer(&subscription.customer).await;
        if contact.is_none() {
            tracing::warn!(
                subscription_id = %subscription.id,
                customer_id = %subscription.customer,
                "No contact found for subscription customer"
            );
        }
        let row = Subscription::create(
            subscription.id.clone(),
            subscription.customer.clone(),
            contact,
            snapshot.clone(),
            now,
        );

        if self.subscriptions.insert_if_absent(&row).await.map_err(storage)? {
            tracing::info!(
                subscription_id = %row.gateway_subscription_id,
                status = %row.status,
                "Subscription recorded"
            );
            return Ok(WebhookOutcome::Applied);
        }

        // 3. Lost the insert race: apply against the winner
        Ok(self
            .apply(&subscription.id, &snapshot)
            .await?
            .unwrap_or(WebhookOutcome::Ignored("subscription not found")))
    }

    /// `customer.subscription.deleted`: cancel, keeping the row and period.
    pub async fn subscription_deleted(
        &self,
        subscription: &SubscriptionObject,
        event_created: Timestamp,
    ) -> Result<WebhookOutcome, WebhookError> {
        let now = Timestamp::now();
        let updated = update_subscription(self.subscriptions.as_ref(), &subscription.id, |s| {
            s.cancel(event_created, now)
        })
        .await
        .map_err(storage)?;

        match updated {
            None => {
                tracing::warn!(subscription_id = %subscription.id, "Deletion for unknown subscription");
                Ok(WebhookOutcome::Ignored("subscription not found"))
            }
            Some((_, Transition::Applied)) => {
                tracing::info!(subscription_id = %subscription.id, "Subscription canceled");
                Ok(WebhookOutcome::Applied)
            }
            Some((_, Transition::Unchanged)) => Ok(WebhookOutcome::Unchanged),
        }
    }

    /// `invoice.paid` / `invoice.payment_succeeded`: back to `active`.
    pub async fn invoice_paid(
        &self,
        invoice: &InvoiceObject,
        event_created: Timestamp,
    ) -> Result<WebhookOutcome, WebhookError> {
        self.invoice_event(invoice, SubscriptionStatus::Active, event_created)
            .await
    }

    /// `invoice.payment_failed`: `past_due`.
    pub async fn invoice_payment_failed(
        &self,
        invoice: &InvoiceObject,
        event_created: Timestamp,
    ) -> Result<WebhookOutcome, WebhookError> {
        self.invoice_event(invoice, SubscriptionStatus::PastDue, event_created)
            .await
    }

    async fn invoice_event(
        &self,
        invoice: &InvoiceObject,
        status: SubscriptionStatus,
        event_created: Timestamp,
    ) -> Result<WebhookOutcome, WebhookError> {
        let Some(subscription_id) = invoice.subscription_id() else {
            tracing::debug!(invoice_id = %invoice.id, "Invoice is not tied to a subscription");
            return Ok(WebhookOutcome::Ignored("invoice without subscription"));
        };
        let snapshot = SubscriptionSnapshot {
            status,
            period: invoice.billing_period()?,
            plan_id: None,
            event_created,
        };

        match self.apply(subscription_id, &snapshot).await? {
            Some(outcome) => Ok(outcome),
            None => {
                tracing::warn!(
                    invoice_id = %invoice.id,
                    subscription_id,
                    "Invoice for unknown subscription"
                );
                Ok(WebhookOutcome::Ignored("subscription not found"))
            }
        }
    }

    /// Applies a snapshot to the stored row. `None` when there is no row.
    async fn apply(
        &self,
        subscription_id: &str,
        snapshot: &SubscriptionSnapshot,
    ) -> Result<Option<WebhookOutcome>, WebhookError> {
        let now = Timestamp::now();
        let updated = update_subscription(self.subscriptions.as_ref(), subscription_id, |s| {
            s.apply_snapshot(snapshot, now)
        })
        .await
        .map_err(storage)?;

        Ok(updated.map(|(subscription, outcome)| match outcome {
            SnapshotOutcome::Applied => {
                tracing::info!(
                    subscription_id,
                    status = %subscription.status,
                    period_end = subscription.current_period_end.as_unix_secs(),
                    "Subscription updated"
                );
                WebhookOutcome::Applied
            }
            SnapshotOutcome::Unchanged => WebhookOutcome::Unchanged,
            SnapshotOutcome::Stale => {
                tracing::info!(subscription_id, "Discarding stale subscription snapshot");
                WebhookOutcome::Ignored("stale snapshot")
            }
            SnapshotOutcome::AlreadyCanceled => {
                tracing::info!(subscription_id, "Subscription already canceled, ignoring");
                WebhookOutcome::Ignored("subscription canceled")
            }
        }))
    }
}

fn storage(err: DomainError) -> WebhookError {
    tracing::error!(error = %err, "Subscription store write failed");
    WebhookError::Storage(err.to_string())
}
