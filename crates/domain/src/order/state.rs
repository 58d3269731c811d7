//! Order state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The state of an order in its lifecycle.
///
/// ```text
/// Pending ──► Paid ──► InPreparation ──► Shipped ──► Delivered
///    │          │            │              │
///    └──────────┴────────────┴──────────────┴──────► Canceled
/// ```
///
/// The arrows show the usual flow, not a constraint: any non-sink state may
/// move to any other state. `Delivered` and `Canceled` are sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Freshly placed, awaiting payment.
    #[default]
    Pending,

    /// Payment confirmed.
    Paid,

    /// Being picked and packed.
    InPreparation,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer (sink).
    Delivered,

    /// Canceled; stock has been returned (sink).
    Canceled,
}

impl OrderState {
    /// Every state, in lifecycle order.
    pub const ALL: [OrderState; 6] = [
        OrderState::Pending,
        OrderState::Paid,
        OrderState::InPreparation,
        OrderState::Shipped,
        OrderState::Delivered,
        OrderState::Canceled,
    ];

    /// Returns true if no further transition is permitted.
    pub fn is_sink(&self) -> bool {
        matches!(self, OrderState::Delivered | OrderState::Canceled)
    }

    /// Checks whether the order may move to `target`.
    ///
    /// Only the current state matters: sink states reject everything, every
    /// other state accepts any target, including backwards moves.
    pub fn ensure_can_transition(&self, target: OrderState) -> Result<(), DomainError> {
        if self.is_sink() {
            return Err(DomainError::InvalidTransition {
                from: *self,
                to: target,
            });
        }
        Ok(())
    }

    /// Returns the wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "PENDING",
            OrderState::Paid => "PAID",
            OrderState::InPreparation => "IN_PREPARATION",
            OrderState::Shipped => "SHIPPED",
            OrderState::Delivered => "DELIVERED",
            OrderState::Canceled => "CANCELED",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parses a state name case-insensitively (`"paid"`, `"In_Preparation"`).
impl FromStr for OrderState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        OrderState::ALL
            .into_iter()
            .find(|state| state.as_str() == upper)
            .ok_or_else(|| DomainError::InvalidStateName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_pending() {
        assert_eq!(OrderState::default(), OrderState::Pending);
    }

    #[test]
    fn test_sink_states() {
        assert!(!OrderState::Pending.is_sink());
        assert!(!OrderState::Paid.is_sink());
        assert!(!OrderState::InPreparation.is_sink());
        assert!(!OrderState::Shipped.is_sink());
        assert!(OrderState::Delivered.is_sink());
        assert!(OrderState::Canceled.is_sink());
    }

    #[test]
    fn test_non_sink_states_accept_any_target() {
        for from in OrderState::ALL.into_iter().filter(|s| !s.is_sink()) {
            for to in OrderState::ALL {
                assert!(from.ensure_can_transition(to).is_ok(), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_backwards_transition_is_allowed() {
        assert!(
            OrderState::Shipped
                .ensure_can_transition(OrderState::Pending)
                .is_ok()
        );
    }

    #[test]
    fn test_sink_states_reject_every_target() {
        for from in [OrderState::Delivered, OrderState::Canceled] {
            for to in OrderState::ALL {
                assert_eq!(
                    from.ensure_can_transition(to),
                    Err(DomainError::InvalidTransition { from, to })
                );
            }
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("paid".parse::<OrderState>().unwrap(), OrderState::Paid);
        assert_eq!(
            "In_Preparation".parse::<OrderState>().unwrap(),
            OrderState::InPreparation
        );
        assert_eq!(
            "CANCELED".parse::<OrderState>().unwrap(),
            OrderState::Canceled
        );
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert_eq!(
            "LOST".parse::<OrderState>(),
            Err(DomainError::InvalidStateName("LOST".to_string()))
        );
        assert!("".parse::<OrderState>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for state in OrderState::ALL {
            assert_eq!(state.to_string().parse::<OrderState>().unwrap(), state);
        }
    }

    #[test]
    fn test_serialization_uses_wire_names() {
        let json = serde_json::to_string(&OrderState::InPreparation).unwrap();
        assert_eq!(json, "\"IN_PREPARATION\"");
        let parsed: OrderState = serde_json::from_str("\"SHIPPED\"").unwrap();
        assert_eq!(parsed, OrderState::Shipped);
    }
}
