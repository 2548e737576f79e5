//! Order fulfillment status.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The fulfillment status of an order.
///
/// Status transitions:
/// ```text
/// Pending ──► Paid ──► Preparing ──► OutForDelivery ──► Delivered
///    │         │           │               │
///    └─────────┴───────────┴───────────────┴──► Cancelled
/// ```
/// Forward moves may skip steps. Nothing moves back to `Pending`, and
/// `Delivered` and `Cancelled` are terminal. [`Order::change_status`](super::Order::change_status)
/// additionally keeps unpaid orders out of `Paid` and the fulfillment steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Order persisted, waiting for the payment provider.
    #[default]
    Pending,

    /// Payment confirmed.
    Paid,

    /// Kitchen is preparing the food.
    Preparing,

    /// Handed to the courier.
    OutForDelivery,

    /// Delivered to the customer (terminal state).
    Delivered,

    /// Cancelled by the restaurant (terminal state).
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if the status may change from `self` to `next`.
    ///
    /// Staying on the same status is not a transition and returns false.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        match next {
            OrderStatus::Pending => false,
            OrderStatus::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Paid => 1,
            OrderStatus::Preparing => 2,
            OrderStatus::OutForDelivery => 3,
            OrderStatus::Delivered => 4,
            OrderStatus::Cancelled => 5,
        }
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out-for-delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::OutForDelivery));
        assert!(OrderStatus::OutForDelivery.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Preparing));
    }

    #[test]
    fn test_no_regressions() {
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::OutForDelivery.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Paid));
    }

    #[test]
    fn test_can_cancel_from_non_terminal_states() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::OutForDelivery.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in OrderStatus::ALL {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
    }

    #[test]
    fn test_same_status_is_not_a_transition() {
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Preparing));
    }

    #[test]
    fn test_parse_wire_names() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            "Out-For-Delivery".parse::<OrderStatus>().unwrap(),
            OrderStatus::OutForDelivery
        );
        assert_eq!(
            "Food Processing".parse::<OrderStatus>(),
            Err(OrderError::UnknownStatus("Food Processing".to_string()))
        );
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out-for-delivery\"");
        let parsed: OrderStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(parsed, OrderStatus::Delivered);
    }
}
