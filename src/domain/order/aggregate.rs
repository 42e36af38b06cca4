//! Order aggregate.
//!
//! An order is created `pending/pending/unstarted` when the payment intent is
//! created, then mutated only by webhook reconciliation and the fulfillment
//! state machine. Orders are never deleted.
//!
//! Every mutating method returns a [`Transition`]: replayed or stale inputs
//! yield `Unchanged` so callers can skip persistence and side effects.

use crate::domain::foundation::{
    DomainError, ErrorCode, OrderId, StateMachine, Timestamp, Transition, UserId,
};
use crate::domain::pricing::{Platform, Quote, ServiceType};

use super::{FulfillmentStatus, OrderContent, OrderMetadata, OrderStatus, PaymentStatus};

/// Order aggregate.
///
/// # Invariants
///
/// - `amount_total == amount_subtotal + amount_tax`
/// - `fulfillment_status != Unstarted` implies `payment_status == Paid`
/// - `order_id` and `gateway_intent_id` never change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub order_id: OrderId,
    pub gateway_intent_id: String,
    pub owner_id: UserId,
    pub service_type: ServiceType,
    pub quantity: u32,
    pub target_reference: Option<String>,
    pub platform: Platform,
    pub amount_subtotal: i64,
    pub amount_tax: i64,
    pub amount_total: i64,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub fulfillment_status: FulfillmentStatus,
    /// Last payment or fulfillment failure message.
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub paid_at: Option<Timestamp>,
    pub fulfillment_started_at: Option<Timestamp>,
    pub fulfillment_completed_at: Option<Timestamp>,
    pub updated_at: Timestamp,
    /// Optimistic concurrency counter, bumped by the repository on every write.
    pub version: i64,
}

impl Order {
    /// Creates a pending order at intent time.
    pub fn new_pending(
        order_id: OrderId,
        gateway_intent_id: impl Into<String>,
        owner_id: UserId,
        content: OrderContent,
        quote: Quote,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        if quote.total != quote.subtotal + quote.tax {
            return Err(DomainError::validation(
                "amount_total",
                "total must equal subtotal plus tax",
            ));
        }
        if content.platform != content.service_type.platform() {
            return Err(DomainError::validation(
                "platform",
                format!(
                    "{} is delivered on {}, not {}",
                    content.service_type,
                    content.service_type.platform(),
                    content.platform
                ),
            ));
        }
        let gateway_intent_id = gateway_intent_id.into();
        if gateway_intent_id.trim().is_empty() {
            return Err(DomainError::validation(
                "gateway_intent_id",
                "intent id cannot be empty",
            ));
        }

        Ok(Self {
            order_id,
            gateway_intent_id,
            owner_id,
            service_type: content.service_type,
            quantity: content.quantity,
            target_reference: content.target_reference,
            platform: content.platform,
            amount_subtotal: quote.subtotal,
            amount_tax: quote.tax,
            amount_total: quote.total,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            fulfillment_status: FulfillmentStatus::Unstarted,
            failure_reason: None,
            created_at: now,
            paid_at: None,
            fulfillment_started_at: None,
            fulfillment_completed_at: None,
            updated_at: now,
            version: 0,
        })
    }

    /// Reconstructs a pending order from intent metadata.
    ///
    /// Used when a webhook arrives for an order whose intent-time write was
    /// lost.
    pub fn from_metadata(
        metadata: &OrderMetadata,
        gateway_intent_id: impl Into<String>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        let quote = Quote {
            subtotal: metadata.amount_subtotal,
            tax: metadata.amount_tax,
            total: metadata.amount_total(),
        };
        Self::new_pending(
            metadata.order_id.clone(),
            gateway_intent_id,
            metadata.owner_id.clone(),
            metadata.content.clone(),
            quote,
            now,
        )
    }

    pub fn content(&self) -> OrderContent {
        OrderContent {
            service_type: self.service_type,
            quantity: self.quantity,
            target_reference: self.target_reference.clone(),
            platform: self.platform,
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    /// True when the fulfillment trigger would claim this order.
    pub fn is_ready_for_fulfillment(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
            && self.fulfillment_status == FulfillmentStatus::Unstarted
    }

    /// Records a successful payment.
    ///
    /// `paid` is absorbing. A success after a recorded failure wins while
    /// fulfillment is unstarted: the customer retried the same intent.
    pub fn mark_paid(&mut self, at: Timestamp) -> Result<Transition, DomainError> {
        match self.payment_status {
            PaymentStatus::Paid => return Ok(Transition::Unchanged),
            PaymentStatus::Failed if self.fulfillment_status != FulfillmentStatus::Unstarted => {
                return Ok(Transition::Unchanged)
            }
            _ => {}
        }

        self.payment_status = self
            .payment_status
            .transition_to(PaymentStatus::Paid)
            .map_err(|_| self.invalid("mark paid"))?;
        if matches!(self.status, OrderStatus::Pending | OrderStatus::Failed) {
            self.transition_status(OrderStatus::Processing)?;
        }
        self.paid_at = Some(at);
        self.failure_reason = None;
        self.updated_at = at;
        Ok(Transition::Applied)
    }

    /// Records a failed payment attempt. Ignored once paid.
    pub fn mark_payment_failed(
        &mut self,
        reason: Option<String>,
        at: Timestamp,
    ) -> Result<Transition, DomainError> {
        if self.payment_status != PaymentStatus::Pending {
            return Ok(Transition::Unchanged);
        }

        self.payment_status = self
            .payment_status
            .transition_to(PaymentStatus::Failed)
            .map_err(|_| self.invalid("mark payment failed"))?;
        if self.status == OrderStatus::Pending {
            self.transition_status(OrderStatus::Failed)?;
        }
        self.failure_reason = reason;
        self.updated_at = at;
        Ok(Transition::Applied)
    }

    /// Claims the order for fulfillment.
    ///
    /// No-op unless `payment_status == Paid` and fulfillment is unstarted.
    pub fn begin_fulfillment(&mut self, at: Timestamp) -> Result<Transition, DomainError> {
        if !self.is_ready_for_fulfillment() {
            return Ok(Transition::Unchanged);
        }

        self.fulfillment_status = self
            .fulfillment_status
            .transition_to(FulfillmentStatus::Processing)
            .map_err(|_| self.invalid("begin fulfillment"))?;
        if self.status == OrderStatus::Pending {
            self.transition_status(OrderStatus::Processing)?;
        }
        self.fulfillment_started_at = Some(at);
        self.updated_at = at;
        Ok(Transition::Applied)
    }

    /// Worker reported successful delivery.
    pub fn complete_fulfillment(&mut self, at: Timestamp) -> Result<Transition, DomainError> {
        if self.fulfillment_status == FulfillmentStatus::Completed {
            return Ok(Transition::Unchanged);
        }
        if self.fulfillment_status != FulfillmentStatus::Processing
            || self.status != OrderStatus::Processing
        {
            return Err(self.invalid("complete fulfillment"));
        }

        self.fulfillment_status = self
            .fulfillment_status
            .transition_to(FulfillmentStatus::Completed)
            .map_err(|_| self.invalid("complete fulfillment"))?;
        self.transition_status(OrderStatus::Completed)?;
        self.fulfillment_completed_at = Some(at);
        self.updated_at = at;
        Ok(Transition::Applied)
    }

    /// Worker reported a delivery failure.
    pub fn fail_fulfillment(
        &mut self,
        reason: Option<String>,
        at: Timestamp,
    ) -> Result<Transition, DomainError> {
        if self.fulfillment_status != FulfillmentStatus::Processing {
            return Err(self.invalid("fail fulfillment"));
        }
        match self.status {
            OrderStatus::Failed => Ok(Transition::Unchanged),
            OrderStatus::Processing => {
                self.transition_status(OrderStatus::Failed)?;
                self.failure_reason = reason;
                self.updated_at = at;
                Ok(Transition::Applied)
            }
            _ => Err(self.invalid("fail fulfillment")),
        }
    }

    fn transition_status(&mut self, target: OrderStatus) -> Result<(), DomainError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| self.invalid(&format!("move to {}", target)))?;
        Ok(())
    }

    fn invalid(&self, attempted: &str) -> DomainError {
        DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!(
                "Cannot {} order {} (status {}, payment {}, fulfillment {})",
                attempted, self.order_id, self.status, self.payment_status, self.fulfillment_status
            ),
        )
        .with_detail("order_id", self.order_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> OrderContent {
        OrderContent {
            service_type: ServiceType::TwitchViewers,
            quantity: 500,
            target_reference: Some("https://twitch.tv/streamer".to_string()),
            platform: Platform::Twitch,
        }
    }

    fn quote() -> Quote {
        Quote {
            subtotal: 2999,
            tax: 540,
            total: 3539,
        }
    }

    fn t(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(1_700_000_000 + secs).unwrap()
    }

    fn pending_order() -> Order {
        Order::new_pending(
            OrderId::generate(t(0)),
            "pi_123",
            UserId::new("user-1").unwrap(),
            content(),
            quote(),
            t(0),
        )
        .unwrap()
    }

    fn paid_order() -> Order {
        let mut order = pending_order();
        order.mark_paid(t(10)).unwrap();
        order
    }

    fn fulfilling_order() -> Order {
        let mut order = paid_order();
        order.begin_fulfillment(t(11)).unwrap();
        order
    }

    // ════════════════════════════════════════════════════════════════════════
    // Creation
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn new_order_starts_pending_everywhere() {
        let order = pending_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Unstarted);
        assert_eq!(order.amount_total, order.amount_subtotal + order.amount_tax);
    }

    #[test]
    fn new_order_rejects_inconsistent_total() {
        let bad = Quote {
            subtotal: 100,
            tax: 18,
            total: 120,
        };
        let err = Order::new_pending(
            OrderId::generate(t(0)),
            "pi_1",
            UserId::new("u").unwrap(),
            content(),
            bad,
            t(0),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn new_order_rejects_platform_mismatch() {
        let mut wrong = content();
        wrong.platform = Platform::Youtube;
        let result = Order::new_pending(
            OrderId::generate(t(0)),
            "pi_1",
            UserId::new("u").unwrap(),
            wrong,
            quote(),
            t(0),
        );
        assert!(result.is_err());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Payment
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn mark_paid_moves_pending_to_processing() {
        let mut order = pending_order();
        assert_eq!(order.mark_paid(t(5)).unwrap(), Transition::Applied);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Unstarted);
        assert_eq!(order.paid_at, Some(t(5)));
    }

    #[test]
    fn mark_paid_twice_is_unchanged() {
        let mut order = paid_order();
        let before = order.clone();
        assert_eq!(order.mark_paid(t(99)).unwrap(), Transition::Unchanged);
        assert_eq!(order, before);
    }

    #[test]
    fn payment_failure_after_success_is_ignored() {
        let mut order = paid_order();
        let before = order.clone();
        let outcome = order
            .mark_payment_failed(Some("card_declined".into()), t(20))
            .unwrap();
        assert_eq!(outcome, Transition::Unchanged);
        assert_eq!(order, before);
    }

    #[test]
    fn payment_failure_marks_order_failed_with_reason() {
        let mut order = pending_order();
        order
            .mark_payment_failed(Some("insufficient funds".into()), t(3))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(order.failure_reason.as_deref(), Some("insufficient funds"));
    }

    #[test]
    fn success_after_failure_recovers_order() {
        let mut order = pending_order();
        order.mark_payment_failed(None, t(1)).unwrap();

        assert_eq!(order.mark_paid(t(2)).unwrap(), Transition::Applied);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.failure_reason, None);
    }

    #[test]
    fn repeated_payment_failure_is_unchanged() {
        let mut order = pending_order();
        order.mark_payment_failed(None, t(1)).unwrap();
        assert_eq!(
            order.mark_payment_failed(None, t(2)).unwrap(),
            Transition::Unchanged
        );
    }

    // ════════════════════════════════════════════════════════════════════════
    // Fulfillment
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn begin_fulfillment_requires_payment() {
        let mut order = pending_order();
        let before = order.clone();
        assert_eq!(order.begin_fulfillment(t(1)).unwrap(), Transition::Unchanged);
        assert_eq!(order, before);
    }

    #[test]
    fn begin_fulfillment_claims_paid_order_once() {
        let mut order = paid_order();
        assert_eq!(order.begin_fulfillment(t(12)).unwrap(), Transition::Applied);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Processing);
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.fulfillment_started_at, Some(t(12)));

        assert_eq!(order.begin_fulfillment(t(13)).unwrap(), Transition::Unchanged);
        assert_eq!(order.fulfillment_started_at, Some(t(12)));
    }

    #[test]
    fn complete_fulfillment_finishes_order() {
        let mut order = fulfilling_order();
        assert_eq!(order.complete_fulfillment(t(30)).unwrap(), Transition::Applied);
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Completed);
        assert_eq!(order.fulfillment_completed_at, Some(t(30)));

        assert_eq!(order.complete_fulfillment(t(31)).unwrap(), Transition::Unchanged);
    }

    #[test]
    fn complete_fulfillment_rejects_unclaimed_order() {
        let mut order = paid_order();
        let err = order.complete_fulfillment(t(30)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn fail_fulfillment_records_reason_and_is_idempotent() {
        let mut order = fulfilling_order();
        assert_eq!(
            order
                .fail_fulfillment(Some("target account private".into()), t(40))
                .unwrap(),
            Transition::Applied
        );
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.failure_reason.as_deref(), Some("target account private"));

        assert_eq!(
            order.fail_fulfillment(None, t(41)).unwrap(),
            Transition::Unchanged
        );
    }

    #[test]
    fn completed_order_cannot_be_failed() {
        let mut order = fulfilling_order();
        order.complete_fulfillment(t(30)).unwrap();
        assert!(order.fail_fulfillment(None, t(31)).is_err());
    }

    #[test]
    fn failed_fulfillment_is_not_recovered_by_payment_replay() {
        let mut order = fulfilling_order();
        order.fail_fulfillment(None, t(40)).unwrap();
        assert_eq!(order.mark_paid(t(41)).unwrap(), Transition::Unchanged);
        assert_eq!(order.status, OrderStatus::Failed);
    }

    #[test]
    fn from_metadata_rebuilds_pending_order() {
        let metadata = OrderMetadata {
            order_id: OrderId::generate(t(0)),
            owner_id: UserId::new("user-9").unwrap(),
            content: content(),
            amount_subtotal: 2999,
            amount_tax: 540,
        };
        let order = Order::from_metadata(&metadata, "pi_9", t(5)).unwrap();
        assert_eq!(order.order_id, metadata.order_id);
        assert_eq!(order.amount_total, 3539);
        assert_eq!(order.gateway_intent_id, "pi_9");
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
