//! Subscription mirror driven by subscription and invoice webhooks.

mod common;

use common::*;
use engagement_checkout::application::handlers::webhook::WebhookOutcome;
use engagement_checkout::domain::foundation::Timestamp;
use engagement_checkout::domain::subscription::SubscriptionStatus;
use engagement_checkout::ports::{CustomerMapping, CustomerMappingRepository, SubscriptionRepository};

const DAY: i64 = 86_400;
const T0: i64 = 1_760_000_000;

const FIRST_PERIOD: (i64, i64) = (T0, T0 + 30 * DAY);
const SECOND_PERIOD: (i64, i64) = (T0 + 30 * DAY, T0 + 60 * DAY);

async fn seed_contact(h: &Harness) {
    h.mappings
        .save_if_absent(&CustomerMapping {
            owner_contact: "subscriber@example.com".to_string(),
            gateway_customer_id: "cus_integration".to_string(),
            owner_id: None,
            created_at: Timestamp::now(),
        })
        .await
        .unwrap();
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn created_past_due_recovered_then_canceled() {
    let h = Harness::new();
    seed_contact(&h).await;

    // Created
    let created = h
        .deliver(&subscription_event(
            "evt_sub_1",
            "customer.subscription.created",
            T0,
            "active",
            FIRST_PERIOD,
        ))
        .await
        .unwrap();
    assert_eq!(created.outcome, WebhookOutcome::Applied);

    let row = h
        .subscriptions
        .find_by_gateway_id("sub_integration")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, SubscriptionStatus::Active);
    assert_eq!(row.gateway_customer_id, "cus_integration");
    assert_eq!(row.owner_contact.as_deref(), Some("subscriber@example.com"));
    assert_eq!(row.plan_id.as_deref(), Some("price_growth_monthly"));

    // Renewal fails
    h.deliver(&invoice_event(
        "evt_inv_1",
        "invoice.payment_failed",
        T0 + 30 * DAY + 60,
        SECOND_PERIOD,
    ))
    .await
    .unwrap();
    let row = h
        .subscriptions
        .find_by_gateway_id("sub_integration")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, SubscriptionStatus::PastDue);
    assert_eq!(row.current_period_end.as_unix_secs(), SECOND_PERIOD.1);

    // Retry succeeds
    h.deliver(&invoice_event(
        "evt_inv_2",
        "invoice.paid",
        T0 + 31 * DAY,
        SECOND_PERIOD,
    ))
    .await
    .unwrap();
    let row = h
        .subscriptions
        .find_by_gateway_id("sub_integration")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, SubscriptionStatus::Active);

    // Deleted
    let deleted = h
        .deliver(&subscription_event(
            "evt_sub_2",
            "customer.subscription.deleted",
            T0 + 40 * DAY,
            "canceled",
            SECOND_PERIOD,
        ))
        .await
        .unwrap();
    assert_eq!(deleted.outcome, WebhookOutcome::Applied);

    let row = h
        .subscriptions
        .find_by_gateway_id("sub_integration")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, SubscriptionStatus::Canceled);
    assert!(row.canceled_at.is_some());
    assert_eq!(row.current_period_start.as_unix_secs(), SECOND_PERIOD.0);
    assert_eq!(row.current_period_end.as_unix_secs(), SECOND_PERIOD.1);
    assert_eq!(h.subscriptions.len().await, 1);
}

#[tokio::test]
async fn canceled_subscription_ignores_later_updates() {
    let h = Harness::new();

    h.deliver(&subscription_event(
        "evt_sub_1",
        "customer.subscription.created",
        T0,
        "active",
        FIRST_PERIOD,
    ))
    .await
    .unwrap();
    h.deliver(&subscription_event(
        "evt_sub_2",
        "customer.subscription.deleted",
        T0 + DAY,
        "canceled",
        FIRST_PERIOD,
    ))
    .await
    .unwrap();

    let late = h
        .deliver(&subscription_event(
            "evt_sub_3",
            "customer.subscription.updated",
            T0 + 2 * DAY,
            "active",
            SECOND_PERIOD,
        ))
        .await
        .unwrap();

    assert!(matches!(late.outcome, WebhookOutcome::Ignored(_)));
    let row = h
        .subscriptions
        .find_by_gateway_id("sub_integration")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, SubscriptionStatus::Canceled);
    assert_eq!(row.current_period_end.as_unix_secs(), FIRST_PERIOD.1);
}

// =============================================================================
// Ordering tolerance
// =============================================================================

#[tokio::test]
async fn update_before_create_records_the_row_and_drops_the_late_create() {
    let h = Harness::new();

    let updated = h
        .deliver(&subscription_event(
            "evt_sub_2",
            "customer.subscription.updated",
            T0 + DAY,
            "past_due",
            FIRST_PERIOD,
        ))
        .await
        .unwrap();
    assert_eq!(updated.outcome, WebhookOutcome::Applied);

    let late_create = h
        .deliver(&subscription_event(
            "evt_sub_1",
            "customer.subscription.created",
            T0,
            "active",
            FIRST_PERIOD,
        ))
        .await
        .unwrap();
    assert!(matches!(late_create.outcome, WebhookOutcome::Ignored(_)));

    let row = h
        .subscriptions
        .find_by_gateway_id("sub_integration")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, SubscriptionStatus::PastDue);
    assert!(row.owner_contact.is_none());
}

#[tokio::test]
async fn replayed_snapshot_is_unchanged() {
    let h = Harness::new();
    let payload = subscription_event(
        "evt_sub_1",
        "customer.subscription.created",
        T0,
        "active",
        FIRST_PERIOD,
    );

    h.deliver(&payload).await.unwrap();
    let replay = h.deliver(&payload).await.unwrap();

    assert_eq!(replay.outcome, WebhookOutcome::Unchanged);
    assert_eq!(h.subscriptions.len().await, 1);
}

#[tokio::test]
async fn events_for_unknown_subscriptions_are_acknowledged_without_effect() {
    let h = Harness::new();

    let invoice = h
        .deliver(&invoice_event("evt_inv_1", "invoice.paid", T0, FIRST_PERIOD))
        .await
        .unwrap();
    let deleted = h
        .deliver(&subscription_event(
            "evt_sub_9",
            "customer.subscription.deleted",
            T0,
            "canceled",
            FIRST_PERIOD,
        ))
        .await
        .unwrap();

    assert!(matches!(invoice.outcome, WebhookOutcome::Ignored(_)));
    assert!(matches!(deleted.outcome, WebhookOutcome::Ignored(_)));
    assert!(h.subscriptions.is_empty().await);
}
