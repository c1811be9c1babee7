//! Shipping-level activity contract and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::{Address, OrderItem};
use runtime::ActivityError;

use super::ledger::OrderLedger;

/// Outcome of the dispatch-carrier activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// The carrier accepted the shipment.
    Dispatched { carrier_ref: String },
    /// The carrier cannot deliver to this address; retrying won't help.
    Undeliverable { reason: String },
}

/// Shipping-level activities, dispatched on the shipping lane.
#[async_trait]
pub trait ShippingActivities: Send + Sync {
    /// Records package preparation.
    async fn prepare_package(
        &self,
        order_id: &OrderId,
        items: &[OrderItem],
    ) -> Result<(), ActivityError>;

    /// Hands the package to a carrier.
    async fn dispatch_carrier(
        &self,
        order_id: &OrderId,
        address: &Address,
    ) -> Result<DispatchResult, ActivityError>;
}

#[derive(Debug, Default)]
struct FailureState {
    fail_prepare: u32,
    fail_dispatch: u32,
    undeliverable: bool,
    prepare_calls: u32,
    dispatch_calls: u32,
    next_carrier: u32,
}

/// In-memory shipping activities writing to an [`OrderLedger`].
#[derive(Debug, Clone)]
pub struct InMemoryShippingActivities {
    ledger: OrderLedger,
    state: Arc<RwLock<FailureState>>,
}

impl InMemoryShippingActivities {
    /// Creates shipping activities over the given ledger.
    pub fn new(ledger: OrderLedger) -> Self {
        Self {
            ledger,
            state: Arc::new(RwLock::new(FailureState::default())),
        }
    }

    /// Makes the next `n` prepare attempts fail transiently.
    pub fn fail_next_prepare(&self, n: u32) {
        self.state.write().unwrap().fail_prepare = n;
    }

    /// Makes the next `n` dispatch attempts fail transiently.
    pub fn fail_next_dispatch(&self, n: u32) {
        self.state.write().unwrap().fail_dispatch = n;
    }

    /// Makes dispatch attempts return an undeliverable outcome.
    pub fn set_undeliverable(&self, undeliverable: bool) {
        self.state.write().unwrap().undeliverable = undeliverable;
    }

    /// Returns how many prepare attempts were made.
    pub fn prepare_calls(&self) -> u32 {
        self.state.read().unwrap().prepare_calls
    }

    /// Returns how many dispatch attempts were made.
    pub fn dispatch_calls(&self) -> u32 {
        self.state.read().unwrap().dispatch_calls
    }
}

#[async_trait]
impl ShippingActivities for InMemoryShippingActivities {
    async fn prepare_package(
        &self,
        order_id: &OrderId,
        items: &[OrderItem],
    ) -> Result<(), ActivityError> {
        {
            let mut state = self.state.write().unwrap();
            state.prepare_calls += 1;
            if state.fail_prepare > 0 {
                state.fail_prepare -= 1;
                return Err(ActivityError::transient("warehouse unavailable"));
            }
        }

        self.ledger.append_audit(
            order_id,
            "package_prepared",
            serde_json::json!({ "items": items }),
        );
        Ok(())
    }

    async fn dispatch_carrier(
        &self,
        order_id: &OrderId,
        address: &Address,
    ) -> Result<DispatchResult, ActivityError> {
        let carrier_ref = {
            let mut state = self.state.write().unwrap();
            state.dispatch_calls += 1;
            if state.fail_dispatch > 0 {
                state.fail_dispatch -= 1;
                return Err(ActivityError::transient("carrier API timeout"));
            }
            if state.undeliverable {
                return Ok(DispatchResult::Undeliverable {
                    reason: format!("no carrier serves {}", address.city),
                });
            }
            state.next_carrier += 1;
            format!("CARRIER-{:04}", state.next_carrier)
        };

        self.ledger.append_audit(
            order_id,
            "carrier_dispatched",
            serde_json::json!({ "carrier_ref": carrier_ref, "address": address }),
        );
        Ok(DispatchResult::Dispatched { carrier_ref })
    }
}
