//! Terminal outcome of a shipping child workflow.

use serde::{Deserialize, Serialize};

/// The single value a shipping child produces.
///
/// Ownership transfers to the parent order on completion; the child has no
/// further existence afterward. A failed shipment is a normal outcome, not
/// an error: the parent completes its lifecycle with a `failed` status and
/// a reason rather than crashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShippingOutcome {
    /// The carrier accepted the shipment.
    Dispatched {
        /// Reference returned by the carrier.
        carrier_ref: String,
    },

    /// The shipment could not be dispatched.
    Failed {
        /// Why the shipment failed.
        reason: String,
    },
}

impl ShippingOutcome {
    /// Creates a dispatched outcome.
    pub fn dispatched(carrier_ref: impl Into<String>) -> Self {
        ShippingOutcome::Dispatched {
            carrier_ref: carrier_ref.into(),
        }
    }

    /// Creates a failed outcome.
    pub fn failed(reason: impl Into<String>) -> Self {
        ShippingOutcome::Failed {
            reason: reason.into(),
        }
    }

    /// Returns true if the shipment was dispatched.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, ShippingOutcome::Dispatched { .. })
    }

    /// Returns the carrier reference, if dispatched.
    pub fn carrier_ref(&self) -> Option<&str> {
        match self {
            ShippingOutcome::Dispatched { carrier_ref } => Some(carrier_ref),
            ShippingOutcome::Failed { .. } => None,
        }
    }

    /// Returns the failure reason, if the shipment failed.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            ShippingOutcome::Dispatched { .. } => None,
            ShippingOutcome::Failed { reason } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatched_outcome() {
        let outcome = ShippingOutcome::dispatched("CARRIER-1");
        assert!(outcome.is_dispatched());
        assert_eq!(outcome.carrier_ref(), Some("CARRIER-1"));
        assert!(outcome.failure_reason().is_none());
    }

    #[test]
    fn failed_outcome() {
        let outcome = ShippingOutcome::failed("no route to city");
        assert!(!outcome.is_dispatched());
        assert!(outcome.carrier_ref().is_none());
        assert_eq!(outcome.failure_reason(), Some("no route to city"));
    }

    #[test]
    fn serialization_roundtrip() {
        for outcome in [
            ShippingOutcome::dispatched("CARRIER-1"),
            ShippingOutcome::failed("no route"),
        ] {
            let json = serde_json::to_string(&outcome).unwrap();
            let deserialized: ShippingOutcome = serde_json::from_str(&json).unwrap();
            assert_eq!(outcome, deserialized);
        }
    }
}
