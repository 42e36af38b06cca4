//! Subscription status state machine.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Local mirror of the gateway subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,

    /// Latest invoice failed; the gateway is retrying.
    PastDue,

    /// Terminal. Rows are kept, never deleted.
    Canceled,
}

impl SubscriptionStatus {
    /// Maps a gateway status string onto the local status set.
    ///
    /// Returns `None` for statuses with no local meaning; events carrying
    /// them are ignored.
    pub fn from_gateway(status: &str) -> Option<Self> {
        match status {
            "active" | "trialing" => Some(SubscriptionStatus::Active),
            "past_due" | "unpaid" | "incomplete" | "paused" => Some(SubscriptionStatus::PastDue),
            "canceled" | "incomplete_expired" => Some(SubscriptionStatus::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    /// Parses the storage representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "canceled" => Some(SubscriptionStatus::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Active, Active)
                | (Active, PastDue)
                | (Active, Canceled)
                | (PastDue, PastDue)
                | (PastDue, Active)
                | (PastDue, Canceled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Active => vec![Active, PastDue, Canceled],
            PastDue => vec![PastDue, Active, Canceled],
            Canceled => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_statuses_map_to_local_set() {
        assert_eq!(SubscriptionStatus::from_gateway("trialing"), Some(SubscriptionStatus::Active));
        assert_eq!(SubscriptionStatus::from_gateway("unpaid"), Some(SubscriptionStatus::PastDue));
        assert_eq!(
            SubscriptionStatus::from_gateway("incomplete_expired"),
            Some(SubscriptionStatus::Canceled)
        );
        assert_eq!(SubscriptionStatus::from_gateway("something_new"), None);
    }

    #[test]
    fn canceled_is_terminal() {
        assert!(SubscriptionStatus::Canceled.is_terminal());
        assert!(SubscriptionStatus::Canceled
            .transition_to(SubscriptionStatus::Active)
            .is_err());
    }

    #[test]
    fn past_due_recovers_to_active() {
        assert_eq!(
            SubscriptionStatus::PastDue.transition_to(SubscriptionStatus::Active),
            Ok(SubscriptionStatus::Active)
        );
    }

    #[test]
    fn storage_strings_round_trip() {
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Canceled,
        ] {
            assert_eq!(SubscriptionStatus::parse(status.as_str()), Some(status));
        }
    }
}
