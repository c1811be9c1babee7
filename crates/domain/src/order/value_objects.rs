//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

use super::state::OrderStep;

/// A shipping address.
///
/// Mutable through the `update_address` signal until the shipping child is
/// spawned; the shipment itself uses the snapshot taken at spawn time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub zip: Option<String>,
}

impl Address {
    /// Creates an address with the required fields.
    pub fn new(street: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            state: None,
            zip: None,
        }
    }

    /// Sets the state/region.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Sets the postal code.
    pub fn with_zip(mut self, zip: impl Into<String>) -> Self {
        self.zip = Some(zip.into());
        self
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.street, self.city)?;
        if let Some(state) = &self.state {
            write!(f, ", {state}")?;
        }
        if let Some(zip) = &self.zip {
            write!(f, " {zip}")?;
        }
        Ok(())
    }
}

/// A line item in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Stock keeping unit.
    pub sku: String,
    /// Quantity ordered; must be positive.
    pub qty: u32,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(sku: impl Into<String>, qty: u32) -> Self {
        Self {
            sku: sku.into(),
            qty,
        }
    }
}

/// Returns the charge amount for a set of items.
///
/// Demo pricing: the amount is the sum of item quantities.
pub fn charge_amount(items: &[OrderItem]) -> u64 {
    items.iter().map(|item| u64::from(item.qty)).sum()
}

/// Why an order was canceled.
///
/// Both causes land on the same terminal step; the audit trail keeps them
/// distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelSource {
    /// An explicit `cancel_order` signal.
    Requested,
    /// The bounded approval wait elapsed with neither flag set.
    ApprovalTimeout,
}

impl CancelSource {
    /// Returns the source name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelSource::Requested => "requested",
            CancelSource::ApprovalTimeout => "approval_timeout",
        }
    }
}

impl std::fmt::Display for CancelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time view of an order, as returned by the status query.
///
/// Computed from current in-memory state with no side effects; safe to
/// read at any instant, including mid-retry or mid-child-wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub step: OrderStep,
    pub approved: bool,
    pub canceled: bool,
    pub address: Option<Address>,
    pub dispatch_failed_reason: Option<String>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            step: OrderStep::default(),
            approved: false,
            canceled: false,
            address: None,
            dispatch_failed_reason: None,
        }
    }
}
