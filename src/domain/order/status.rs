//! Order, payment and fulfillment status machines.
//!
//! The three statuses move independently but are only ever changed through
//! the `Order` aggregate, which enforces the cross-status rules.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Overall order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at intent time, awaiting payment.
    Pending,

    /// Paid; fulfillment claimed or about to be.
    Processing,

    Completed,

    /// Payment failed, or the worker reported a delivery failure.
    Failed,
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Processing)
                | (Pending, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
                // A later successful attempt on the same intent
                | (Failed, Processing)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Processing, Failed],
            Processing => vec![Completed, Failed],
            Failed => vec![Processing],
            Completed => vec![],
        }
    }
}

/// Whether the money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Paid) | (Pending, Failed) | (Failed, Paid)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Paid, Failed],
            Failed => vec![Paid],
            Paid => vec![],
        }
    }
}

/// Progress of the external delivery work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Unstarted,
    Processing,
    Completed,
}

impl StateMachine for FulfillmentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use FulfillmentStatus::*;
        matches!((self, target), (Unstarted, Processing) | (Processing, Completed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use FulfillmentStatus::*;
        match self {
            Unstarted => vec![Processing],
            Processing => vec![Completed],
            Completed => vec![],
        }
    }
}

macro_rules! status_strings {
    ($ty:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            /// Storage and wire representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $s,)+
                }
            }

            /// Parses the storage representation.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($s => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

status_strings!(OrderStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

status_strings!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
});

status_strings!(FulfillmentStatus {
    Unstarted => "unstarted",
    Processing => "processing",
    Completed => "completed",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_happy_path() {
        let status = OrderStatus::Pending
            .transition_to(OrderStatus::Processing)
            .and_then(|s| s.transition_to(OrderStatus::Completed))
            .unwrap();
        assert_eq!(status, OrderStatus::Completed);
        assert!(status.is_terminal());
    }

    #[test]
    fn order_status_cannot_go_back_to_pending() {
        for from in [OrderStatus::Processing, OrderStatus::Completed, OrderStatus::Failed] {
            assert!(!from.can_transition_to(&OrderStatus::Pending));
        }
    }

    #[test]
    fn completed_order_cannot_fail() {
        assert!(OrderStatus::Completed.transition_to(OrderStatus::Failed).is_err());
    }

    #[test]
    fn paid_is_absorbing() {
        assert!(PaymentStatus::Paid.is_terminal());
        assert!(!PaymentStatus::Paid.can_transition_to(&PaymentStatus::Failed));
    }

    #[test]
    fn failed_payment_can_recover() {
        assert!(PaymentStatus::Failed.can_transition_to(&PaymentStatus::Paid));
    }

    #[test]
    fn fulfillment_is_strictly_forward() {
        assert!(FulfillmentStatus::Unstarted.can_transition_to(&FulfillmentStatus::Processing));
        assert!(!FulfillmentStatus::Unstarted.can_transition_to(&FulfillmentStatus::Completed));
        assert!(!FulfillmentStatus::Processing.can_transition_to(&FulfillmentStatus::Unstarted));
    }

    #[test]
    fn valid_transitions_agree_with_can_transition_to() {
        let all = [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Failed,
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn storage_strings_round_trip() {
        assert_eq!(OrderStatus::parse("processing"), Some(OrderStatus::Processing));
        assert_eq!(PaymentStatus::Paid.as_str(), "paid");
        assert_eq!(FulfillmentStatus::parse("unstarted"), Some(FulfillmentStatus::Unstarted));
        assert_eq!(OrderStatus::parse("shipped"), None);
    }

    #[test]
    fn serde_matches_storage_strings() {
        let json = serde_json::to_string(&FulfillmentStatus::Unstarted).unwrap();
        assert_eq!(json, "\"unstarted\"");
    }
}
