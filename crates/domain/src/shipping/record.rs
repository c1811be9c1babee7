//! Shipment state machine record.

use common::{InstanceId, OrderId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::machine::StateMachine;
use crate::order::Address;

use super::events::ShippingEvent;
use super::outcome::ShippingOutcome;
use super::state::ShipmentStep;

/// The event-sourced state of one shipping child instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentRecord {
    id: Option<InstanceId>,
    #[serde(default)]
    version: Version,
    order_id: Option<OrderId>,
    address: Option<Address>,
    step: ShipmentStep,
    carrier_ref: Option<String>,
    failure_reason: Option<String>,
}

impl StateMachine for ShipmentRecord {
    type Event = ShippingEvent;

    fn instance_type() -> &'static str {
        "ShippingWorkflow"
    }

    fn id(&self) -> Option<&InstanceId> {
        self.id.as_ref()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            ShippingEvent::ShipmentStarted(data) => {
                self.id = Some(InstanceId::for_shipping(&data.order_id));
                self.order_id = Some(data.order_id);
                self.address = Some(data.address);
                self.step = ShipmentStep::Preparing;
            }
            ShippingEvent::PackagePrepared => {
                self.step = ShipmentStep::Dispatching;
            }
            ShippingEvent::CarrierDispatched(data) => {
                self.carrier_ref = Some(data.carrier_ref);
                self.step = ShipmentStep::Dispatched;
            }
            ShippingEvent::ShipmentFailed(data) => {
                self.failure_reason = Some(data.reason);
                self.step = ShipmentStep::Failed;
            }
        }
    }
}

// Query methods
impl ShipmentRecord {
    /// Returns the parent order ID.
    pub fn order_id(&self) -> Option<&OrderId> {
        self.order_id.as_ref()
    }

    /// Returns the address snapshot the shipment uses.
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Returns the current step.
    pub fn step(&self) -> ShipmentStep {
        self.step
    }

    /// Returns the carrier reference, if dispatched.
    pub fn carrier_ref(&self) -> Option<&str> {
        self.carrier_ref.as_deref()
    }

    /// Returns the failure reason, if the shipment failed.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the terminal outcome, once the shipment has reached one.
    pub fn outcome(&self) -> Option<ShippingOutcome> {
        match self.step {
            ShipmentStep::Dispatched => self.carrier_ref.clone().map(ShippingOutcome::dispatched),
            ShipmentStep::Failed => Some(ShippingOutcome::failed(
                self.failure_reason.clone().unwrap_or_default(),
            )),
            _ => None,
        }
    }
}
