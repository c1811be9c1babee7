//! External signals accepted by an order instance.

use serde::{Deserialize, Serialize};

use super::value_objects::Address;

/// An asynchronous signal sent to a running order.
///
/// Signals are queued into the instance's mailbox and applied strictly in
/// receipt order by the single logical thread of the state machine; they
/// mutate state only and never invoke activities directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Signal {
    /// Approve the order for charging.
    Approve,

    /// Cancel the order, with a caller-supplied reason.
    CancelOrder { reason: String },

    /// Replace the shipping address.
    UpdateAddress { address: Address },
}

impl Signal {
    /// Returns the signal name, for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Approve => "approve",
            Signal::CancelOrder { .. } => "cancel_order",
            Signal::UpdateAddress { .. } => "update_address",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_names() {
        assert_eq!(Signal::Approve.name(), "approve");
        assert_eq!(
            Signal::CancelOrder {
                reason: "changed mind".into()
            }
            .name(),
            "cancel_order"
        );
        assert_eq!(
            Signal::UpdateAddress {
                address: Address::new("1 Main St", "Springfield")
            }
            .name(),
            "update_address"
        );
    }

    #[test]
    fn signal_serialization_roundtrip() {
        let signal = Signal::CancelOrder {
            reason: "changed mind".into(),
        };
        let json = serde_json::to_string(&signal).unwrap();
        let deserialized: Signal = serde_json::from_str(&json).unwrap();
        assert_eq!(signal, deserialized);
    }
}
