//! Shipment state machine.

use serde::{Deserialize, Serialize};

/// The step a shipment has reached.
///
/// ```text
/// Pending ──► Preparing ──► Dispatching ──► Dispatched
///                 │              │
///                 └──────────────┴──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStep {
    /// Shipment not started yet.
    #[default]
    Pending,

    /// The prepare-package activity is running.
    Preparing,

    /// The dispatch-carrier activity is running.
    Dispatching,

    /// The carrier accepted the shipment (terminal state).
    Dispatched,

    /// Preparation or dispatch failed terminally (terminal state).
    Failed,
}

impl ShipmentStep {
    /// Returns true if this is a terminal step.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStep::Dispatched | ShipmentStep::Failed)
    }

    /// Returns the step name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStep::Pending => "pending",
            ShipmentStep::Preparing => "preparing",
            ShipmentStep::Dispatching => "dispatching",
            ShipmentStep::Dispatched => "dispatched",
            ShipmentStep::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ShipmentStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_is_pending() {
        assert_eq!(ShipmentStep::default(), ShipmentStep::Pending);
    }

    #[test]
    fn terminal_steps() {
        assert!(!ShipmentStep::Pending.is_terminal());
        assert!(!ShipmentStep::Preparing.is_terminal());
        assert!(!ShipmentStep::Dispatching.is_terminal());
        assert!(ShipmentStep::Dispatched.is_terminal());
        assert!(ShipmentStep::Failed.is_terminal());
    }

    #[test]
    fn display() {
        assert_eq!(ShipmentStep::Preparing.to_string(), "preparing");
        assert_eq!(ShipmentStep::Dispatched.to_string(), "dispatched");
    }
}
