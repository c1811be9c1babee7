//! Shipping child workflow events.

use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::machine::DomainEvent;
use crate::order::Address;

/// Events recorded by a shipping child instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShippingEvent {
    /// The child was spawned for an order, with the parent's address
    /// snapshot.
    ShipmentStarted(ShipmentStartedData),

    /// The prepare-package activity succeeded.
    PackagePrepared,

    /// The dispatch-carrier activity succeeded (terminal).
    CarrierDispatched(CarrierDispatchedData),

    /// Preparation or dispatch failed terminally (terminal).
    ShipmentFailed(ShipmentFailedData),
}

impl DomainEvent for ShippingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShippingEvent::ShipmentStarted(_) => "ShipmentStarted",
            ShippingEvent::PackagePrepared => "PackagePrepared",
            ShippingEvent::CarrierDispatched(_) => "CarrierDispatched",
            ShippingEvent::ShipmentFailed(_) => "ShipmentFailed",
        }
    }
}

/// Data for the ShipmentStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentStartedData {
    /// The parent order.
    pub order_id: OrderId,
    /// The address snapshot taken when the parent spawned the child.
    pub address: Address,
}

/// Data for the CarrierDispatched event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierDispatchedData {
    /// Reference returned by the carrier.
    pub carrier_ref: String,
}

/// Data for the ShipmentFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentFailedData {
    /// Why the shipment failed.
    pub reason: String,
}

// Convenience constructors
impl ShippingEvent {
    /// Creates a ShipmentStarted event.
    pub fn shipment_started(order_id: OrderId, address: Address) -> Self {
        ShippingEvent::ShipmentStarted(ShipmentStartedData { order_id, address })
    }

    /// Creates a CarrierDispatched event.
    pub fn carrier_dispatched(carrier_ref: impl Into<String>) -> Self {
        ShippingEvent::CarrierDispatched(CarrierDispatchedData {
            carrier_ref: carrier_ref.into(),
        })
    }

    /// Creates a ShipmentFailed event.
    pub fn shipment_failed(reason: impl Into<String>) -> Self {
        ShippingEvent::ShipmentFailed(ShipmentFailedData {
            reason: reason.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types() {
        assert_eq!(
            ShippingEvent::shipment_started(
                OrderId::new("ORD-1"),
                Address::new("1 Main St", "Springfield")
            )
            .event_type(),
            "ShipmentStarted"
        );
        assert_eq!(ShippingEvent::PackagePrepared.event_type(), "PackagePrepared");
        assert_eq!(
            ShippingEvent::carrier_dispatched("CARRIER-1").event_type(),
            "CarrierDispatched"
        );
        assert_eq!(
            ShippingEvent::shipment_failed("no route").event_type(),
            "ShipmentFailed"
        );
    }

    #[test]
    fn serialization_roundtrip() {
        let events = vec![
            ShippingEvent::shipment_started(
                OrderId::new("ORD-1"),
                Address::new("1 Main St", "Springfield"),
            ),
            ShippingEvent::PackagePrepared,
            ShippingEvent::carrier_dispatched("CARRIER-1"),
            ShippingEvent::shipment_failed("no route"),
        ];

        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let deserialized: ShippingEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event.event_type(), deserialized.event_type());
        }
    }
}
