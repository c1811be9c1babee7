//! Order state machine record.

use common::{InstanceId, OrderId, PaymentId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::machine::StateMachine;

use super::events::OrderEvent;
use super::signals::Signal;
use super::state::OrderStep;
use super::value_objects::{Address, CancelSource, OrderItem, StatusSnapshot};

/// The event-sourced state of one order instance.
///
/// Owned exclusively by the order's workflow task for the life of the
/// process; external persistence mirrors it but never owns it. All fields
/// are derived by folding [`OrderEvent`]s, so a record rebuilt from the
/// store matches the live one exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderRecord {
    id: Option<InstanceId>,
    #[serde(default)]
    version: Version,
    order_id: Option<OrderId>,
    payment_id: Option<PaymentId>,
    items: Vec<OrderItem>,
    step: OrderStep,
    approved: bool,
    canceled: bool,
    cancel_source: Option<CancelSource>,
    address: Option<Address>,
    dispatch_failed_reason: Option<String>,
    failure_reason: Option<String>,
}

impl StateMachine for OrderRecord {
    type Event = OrderEvent;

    fn instance_type() -> &'static str {
        "OrderWorkflow"
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
            OrderEvent::OrderStarted(data) => {
                self.id = Some(InstanceId::for_order(&data.order_id));
                self.order_id = Some(data.order_id);
                self.payment_id = Some(data.payment_id);
                self.items = data.items;
                self.address = Some(data.address);
                self.step = OrderStep::Received;
            }
            OrderEvent::OrderReceived => {
                self.step = OrderStep::Validated;
            }
            OrderEvent::OrderValidated => {
                self.step = OrderStep::AwaitingApproval;
            }
            OrderEvent::ApprovalGranted => {
                self.approved = true;
            }
            OrderEvent::OrderCanceled(data) => {
                self.canceled = true;
                self.cancel_source = Some(data.source);
                // A cancellation recorded after the charge began only sets
                // the flag; the step keeps its own course.
                if self.step.cancel_diverts() {
                    self.step = OrderStep::Canceled;
                }
            }
            OrderEvent::AddressUpdated(data) => {
                self.address = Some(data.address);
            }
            OrderEvent::ChargingStarted => {
                self.step = OrderStep::Charging;
            }
            OrderEvent::PaymentCharged(_) => {
                // Recorded for the audit trail; ShippingStarted moves the step.
            }
            OrderEvent::ShippingStarted(_) => {
                self.step = OrderStep::Shipping;
            }
            OrderEvent::OrderShipped(_) => {
                self.step = OrderStep::Shipped;
            }
            OrderEvent::DispatchFailed(data) => {
                self.dispatch_failed_reason = Some(data.reason);
                self.step = OrderStep::Failed;
            }
            OrderEvent::OrderFailed(data) => {
                self.failure_reason = Some(data.reason);
                self.step = OrderStep::Failed;
            }
        }
    }
}

// Query methods
impl OrderRecord {
    /// Returns the order ID.
    pub fn order_id(&self) -> Option<&OrderId> {
        self.order_id.as_ref()
    }

    /// Returns the payment ID.
    pub fn payment_id(&self) -> Option<&PaymentId> {
        self.payment_id.as_ref()
    }

    /// Returns the order items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the current lifecycle step.
    pub fn step(&self) -> OrderStep {
        self.step
    }

    /// Returns true if an approve signal has been accepted.
    pub fn approved(&self) -> bool {
        self.approved
    }

    /// Returns true if a cancellation has been recorded.
    pub fn canceled(&self) -> bool {
        self.canceled
    }

    /// Returns the cancellation cause, if any.
    pub fn cancel_source(&self) -> Option<CancelSource> {
        self.cancel_source
    }

    /// Returns the current shipping address.
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Returns the shipping failure reason, if the child failed.
    pub fn dispatch_failed_reason(&self) -> Option<&str> {
        self.dispatch_failed_reason.as_deref()
    }

    /// Returns the terminal failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns true if the order reached a terminal step.
    pub fn is_terminal(&self) -> bool {
        self.step.is_terminal()
    }

    /// Returns the point-in-time status snapshot.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            step: self.step,
            approved: self.approved,
            canceled: self.canceled,
            address: self.address.clone(),
            dispatch_failed_reason: self.dispatch_failed_reason.clone(),
        }
    }
}

// Signal policy
impl OrderRecord {
    /// Decides which event, if any, a signal produces against the current
    /// state.
    ///
    /// Signals on a terminal instance, repeated approve/cancel signals, and
    /// address updates after shipping started all resolve to `None`: the
    /// signal is consumed without error and without effect.
    pub fn on_signal(&self, signal: &Signal) -> Option<OrderEvent> {
        if self.step.is_terminal() {
            return None;
        }
        match signal {
            Signal::Approve => (!self.approved && !self.canceled).then_some(OrderEvent::ApprovalGranted),
            Signal::CancelOrder { reason } => (!self.canceled)
                .then(|| OrderEvent::order_canceled(reason.clone(), CancelSource::Requested)),
            Signal::UpdateAddress { address } => self
                .step
                .address_mutable()
                .then(|| OrderEvent::address_updated(address.clone())),
        }
    }
}
