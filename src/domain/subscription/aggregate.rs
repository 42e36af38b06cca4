//! Subscription aggregate.
//!
//! Mirrors a gateway subscription. Status must reflect the most recent
//! billing-period event, so every incoming snapshot is checked for staleness
//! before it is applied:
//!
//! - a snapshot whose period ends before the stored period is stale;
//! - with equal period ends, a snapshot from an event created before the
//!   newest applied event is stale;
//! - `canceled` is terminal and only the deletion event may set it without
//!   a period.

use crate::domain::foundation::{StateMachine, Timestamp, Transition};

use super::SubscriptionStatus;

/// Billing period bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// State a gateway event reports for a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub status: SubscriptionStatus,
    /// Absent when the event does not carry period information.
    pub period: Option<BillingPeriod>,
    pub plan_id: Option<String>,
    /// Creation time of the gateway event.
    pub event_created: Timestamp,
}

/// Result of applying a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Applied,
    Unchanged,
    Stale,
    AlreadyCanceled,
}

impl SnapshotOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SnapshotOutcome::Applied)
    }
}

/// Subscription aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub gateway_subscription_id: String,
    pub gateway_customer_id: String,
    pub owner_contact: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    pub plan_id: Option<String>,
    pub canceled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Creation time of the newest applied gateway event.
    pub last_event_at: Timestamp,
    pub version: i64,
}

impl Subscription {
    /// Creates the local row from a subscription-created snapshot.
    ///
    /// Without a period in the snapshot the period collapses to the event
    /// time; the next event with period data will replace it.
    pub fn create(
        gateway_subscription_id: impl Into<String>,
        gateway_customer_id: impl Into<String>,
        owner_contact: Option<String>,
        snapshot: SubscriptionSnapshot,
        now: Timestamp,
    ) -> Self {
        let period = snapshot.period.unwrap_or(BillingPeriod {
            start: snapshot.event_created,
            end: snapshot.event_created,
        });
        let canceled_at = (snapshot.status == SubscriptionStatus::Canceled).then_some(now);

        Self {
            gateway_subscription_id: gateway_subscription_id.into(),
            gateway_customer_id: gateway_customer_id.into(),
            owner_contact,
            status: snapshot.status,
            current_period_start: period.start,
            current_period_end: period.end,
            plan_id: snapshot.plan_id,
            canceled_at,
            created_at: now,
            updated_at: now,
            last_event_at: snapshot.event_created,
            version: 0,
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.status == SubscriptionStatus::Canceled
    }

    /// True when the snapshot describes an older state than the one stored.
    pub fn is_stale(&self, snapshot: &SubscriptionSnapshot) -> bool {
        match snapshot.period {
            Some(period) if period.end < self.current_period_end => true,
            Some(period) if period.end > self.current_period_end => false,
            _ => snapshot.event_created < self.last_event_at,
        }
    }

    /// Applies a created/updated/invoice snapshot.
    pub fn apply_snapshot(
        &mut self,
        snapshot: &SubscriptionSnapshot,
        now: Timestamp,
    ) -> SnapshotOutcome {
        if self.is_canceled() {
            return SnapshotOutcome::AlreadyCanceled;
        }
        if self.is_stale(snapshot) {
            return SnapshotOutcome::Stale;
        }
        if !self.status.can_transition_to(&snapshot.status) {
            return SnapshotOutcome::Stale;
        }

        let mut changed = false;
        if snapshot.status != self.status {
            self.status = snapshot.status;
            changed = true;
        }
        if let Some(period) = snapshot.period {
            if period.start != self.current_period_start || period.end != self.current_period_end {
                self.current_period_start = period.start;
                self.current_period_end = period.end;
                changed = true;
            }
        }
        if let Some(plan_id) = &snapshot.plan_id {
            if self.plan_id.as_ref() != Some(plan_id) {
                self.plan_id = Some(plan_id.clone());
                changed = true;
            }
        }
        if snapshot.event_created > self.last_event_at {
            self.last_event_at = snapshot.event_created;
            changed = true;
        }
        if self.status == SubscriptionStatus::Canceled {
            self.canceled_at = Some(now);
        }

        if !changed {
            return SnapshotOutcome::Unchanged;
        }
        self.updated_at = now;
        SnapshotOutcome::Applied
    }

    /// Marks the subscription canceled. Period fields are left untouched.
    pub fn cancel(&mut self, event_created: Timestamp, now: Timestamp) -> Transition {
        if self.is_canceled() {
            return Transition::Unchanged;
        }

        self.status = SubscriptionStatus::Canceled;
        self.canceled_at = Some(now);
        if event_created > self.last_event_at {
            self.last_event_at = event_created;
        }
        self.updated_at = now;
        Transition::Applied
    }
}
