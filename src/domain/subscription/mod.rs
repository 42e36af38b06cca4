//! Subscription domain - lifecycle of recurring billing mirrored from the gateway.

mod aggregate;
mod status;

pub use aggregate::{BillingPeriod, SnapshotOutcome, Subscription, SubscriptionSnapshot};
pub use status::SubscriptionStatus;
