//! Order lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The step an order has reached in its lifecycle.
///
/// Step transitions:
/// ```text
/// Received ──► Validated ──► AwaitingApproval ──► Charging ──► Shipping ──► Shipped
///     │             │               │                 │            │
///     │             │               ├──► Canceled     │            │
///     └─────────────┴───────────────┴─────────────────┴────────────┴──► Failed
/// ```
///
/// Declaration order is lifecycle order; the terminal exits sort last, so
/// an observed step sequence is always non-decreasing under `Ord`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStep {
    /// Order accepted for processing; the receive activity is running.
    #[default]
    Received,

    /// Receive acknowledged; the validate activity is running.
    Validated,

    /// Waiting for an approve or cancel signal, under a bounded wait.
    AwaitingApproval,

    /// Approved; the charge activity is running.
    Charging,

    /// Payment charged; the shipping child is in flight.
    Shipping,

    /// The carrier accepted the shipment (terminal state).
    Shipped,

    /// The order was canceled, explicitly or by approval timeout
    /// (terminal state).
    Canceled,

    /// An activity failed terminally or the shipment could not be
    /// dispatched (terminal state).
    Failed,
}

impl OrderStep {
    /// Returns true if the address can still be changed in this step.
    ///
    /// Once the shipping child has been spawned the shipment uses the
    /// address snapshot taken at spawn, so later updates are no-ops.
    pub fn address_mutable(&self) -> bool {
        matches!(
            self,
            OrderStep::Received
                | OrderStep::Validated
                | OrderStep::AwaitingApproval
                | OrderStep::Charging
        )
    }

    /// Returns true if a cancellation can still divert the step itself.
    ///
    /// After the charge begins, a cancel signal only records the flag;
    /// the lifecycle runs to its own terminal step.
    pub fn cancel_diverts(&self) -> bool {
        matches!(
            self,
            OrderStep::Received | OrderStep::Validated | OrderStep::AwaitingApproval
        )
    }

    /// Returns true if this is a terminal step (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStep::Shipped | OrderStep::Canceled | OrderStep::Failed
        )
    }

    /// Returns the step name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStep::Received => "received",
            OrderStep::Validated => "validated",
            OrderStep::AwaitingApproval => "awaiting_approval",
            OrderStep::Charging => "charging",
            OrderStep::Shipping => "shipping",
            OrderStep::Shipped => "shipped",
            OrderStep::Canceled => "canceled",
            OrderStep::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_is_received() {
        assert_eq!(OrderStep::default(), OrderStep::Received);
    }

    #[test]
    fn address_mutable_before_shipping() {
        assert!(OrderStep::Received.address_mutable());
        assert!(OrderStep::Validated.address_mutable());
        assert!(OrderStep::AwaitingApproval.address_mutable());
        assert!(OrderStep::Charging.address_mutable());
        assert!(!OrderStep::Shipping.address_mutable());
        assert!(!OrderStep::Shipped.address_mutable());
        assert!(!OrderStep::Canceled.address_mutable());
        assert!(!OrderStep::Failed.address_mutable());
    }

    #[test]
    fn cancel_diverts_before_charging() {
        assert!(OrderStep::Received.cancel_diverts());
        assert!(OrderStep::Validated.cancel_diverts());
        assert!(OrderStep::AwaitingApproval.cancel_diverts());
        assert!(!OrderStep::Charging.cancel_diverts());
        assert!(!OrderStep::Shipping.cancel_diverts());
        assert!(!OrderStep::Shipped.cancel_diverts());
    }

    #[test]
    fn terminal_steps() {
        assert!(!OrderStep::Received.is_terminal());
        assert!(!OrderStep::Validated.is_terminal());
        assert!(!OrderStep::AwaitingApproval.is_terminal());
        assert!(!OrderStep::Charging.is_terminal());
        assert!(!OrderStep::Shipping.is_terminal());
        assert!(OrderStep::Shipped.is_terminal());
        assert!(OrderStep::Canceled.is_terminal());
        assert!(OrderStep::Failed.is_terminal());
    }

    #[test]
    fn lifecycle_order_is_declaration_order() {
        assert!(OrderStep::Received < OrderStep::Validated);
        assert!(OrderStep::Validated < OrderStep::AwaitingApproval);
        assert!(OrderStep::AwaitingApproval < OrderStep::Charging);
        assert!(OrderStep::Charging < OrderStep::Shipping);
        assert!(OrderStep::Shipping < OrderStep::Shipped);
        assert!(OrderStep::Shipped < OrderStep::Canceled);
    }

    #[test]
    fn display_uses_snake_case() {
        assert_eq!(OrderStep::AwaitingApproval.to_string(), "awaiting_approval");
        assert_eq!(OrderStep::Shipped.to_string(), "shipped");
    }

    #[test]
    fn serialization_uses_snake_case() {
        let json = serde_json::to_string(&OrderStep::AwaitingApproval).unwrap();
        assert_eq!(json, "\"awaiting_approval\"");
        let step: OrderStep = serde_json::from_str("\"charging\"").unwrap();
        assert_eq!(step, OrderStep::Charging);
    }
}
