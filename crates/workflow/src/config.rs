//! Workflow configuration loaded from environment variables.

use std::time::Duration;

use runtime::RetryPolicy;

/// Tunables for the order orchestration, with environment overrides.
///
/// Reads from environment variables:
/// - `APPROVAL_WAIT_SECS` — bound on the approval wait (default: `4`)
/// - `ORDER_LANE_CAPACITY` — order-lane worker slots (default: `8`)
/// - `SHIPPING_LANE_CAPACITY` — shipping-lane worker slots (default: `4`)
///
/// The approval wait default mirrors the demo value; a real deployment is
/// expected to override it with its manual-review SLA.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Bound on the `approved || canceled` wait before the order is
    /// canceled implicitly.
    pub approval_wait: Duration,
    /// Worker slots on the order dispatch lane.
    pub order_lane_capacity: usize,
    /// Worker slots on the shipping dispatch lane.
    pub shipping_lane_capacity: usize,
    /// Retry policy for order-level activities.
    pub order_retry: RetryPolicy,
    /// Retry policy for shipping-level activities.
    pub shipping_retry: RetryPolicy,
}

impl WorkflowConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            approval_wait: std::env::var("APPROVAL_WAIT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.approval_wait),
            order_lane_capacity: std::env::var("ORDER_LANE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.order_lane_capacity),
            shipping_lane_capacity: std::env::var("SHIPPING_LANE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.shipping_lane_capacity),
            ..defaults
        }
    }

    /// Sets the approval wait bound.
    pub fn with_approval_wait(mut self, approval_wait: Duration) -> Self {
        self.approval_wait = approval_wait;
        self
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            approval_wait: Duration::from_secs(4),
            order_lane_capacity: 8,
            shipping_lane_capacity: 4,
            order_retry: RetryPolicy::default(),
            shipping_retry: RetryPolicy::default(),
        }
    }
}
