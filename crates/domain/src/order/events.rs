//! Order workflow events.

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId};
use serde::{Deserialize, Serialize};

use crate::machine::DomainEvent;

use super::value_objects::{Address, CancelSource, OrderItem};

/// Events that can occur during the order lifecycle.
///
/// The full ordered stream of these events is the authoritative history of
/// an order; folding it through [`super::OrderRecord`] reconstructs the
/// live state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// The order was started with its immutable inputs.
    OrderStarted(OrderStartedData),

    /// The receive activity acknowledged the order.
    OrderReceived,

    /// The validate activity accepted the order.
    OrderValidated,

    /// An approve signal was accepted.
    ApprovalGranted,

    /// A cancellation was recorded, either explicit or by approval
    /// timeout.
    OrderCanceled(OrderCanceledData),

    /// An address update signal was accepted.
    AddressUpdated(AddressUpdatedData),

    /// The charge activity was dispatched.
    ChargingStarted,

    /// The charge activity succeeded.
    PaymentCharged(PaymentChargedData),

    /// The shipping child was spawned with an address snapshot.
    ShippingStarted(ShippingStartedData),

    /// The shipping child returned a dispatched outcome (terminal).
    OrderShipped(OrderShippedData),

    /// The shipping child returned a failure outcome (terminal).
    DispatchFailed(DispatchFailedData),

    /// An activity failed terminally or a business rejection occurred
    /// (terminal).
    OrderFailed(OrderFailedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderStarted(_) => "OrderStarted",
            OrderEvent::OrderReceived => "OrderReceived",
            OrderEvent::OrderValidated => "OrderValidated",
            OrderEvent::ApprovalGranted => "ApprovalGranted",
            OrderEvent::OrderCanceled(_) => "OrderCanceled",
            OrderEvent::AddressUpdated(_) => "AddressUpdated",
            OrderEvent::ChargingStarted => "ChargingStarted",
            OrderEvent::PaymentCharged(_) => "PaymentCharged",
            OrderEvent::ShippingStarted(_) => "ShippingStarted",
            OrderEvent::OrderShipped(_) => "OrderShipped",
            OrderEvent::DispatchFailed(_) => "DispatchFailed",
            OrderEvent::OrderFailed(_) => "OrderFailed",
        }
    }
}

/// Data for the OrderStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStartedData {
    /// Caller-supplied order identity.
    pub order_id: OrderId,
    /// Payment identity, the natural key for the idempotent charge.
    pub payment_id: PaymentId,
    /// Items being ordered.
    pub items: Vec<OrderItem>,
    /// Initial shipping address.
    pub address: Address,
    /// When the order was started.
    pub started_at: DateTime<Utc>,
}

/// Data for the OrderCanceled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCanceledData {
    /// Caller-supplied or synthesized reason.
    pub reason: String,
    /// Whether the cancellation was explicit or an approval timeout.
    pub source: CancelSource,
}

/// Data for the AddressUpdated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressUpdatedData {
    /// The replacement address.
    pub address: Address,
}

/// Data for the PaymentCharged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentChargedData {
    /// Amount charged.
    pub amount: u64,
}

/// Data for the ShippingStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingStartedData {
    /// The address snapshot handed to the shipping child at spawn time.
    pub address: Address,
}

/// Data for the OrderShipped event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderShippedData {
    /// Carrier reference returned by the dispatch activity.
    pub carrier_ref: String,
}

/// Data for the DispatchFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchFailedData {
    /// Why the shipment could not be dispatched.
    pub reason: String,
}

/// Data for the OrderFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFailedData {
    /// Why the order failed.
    pub reason: String,
}

// Convenience constructors
impl OrderEvent {
    /// Creates an OrderStarted event.
    pub fn order_started(
        order_id: OrderId,
        payment_id: PaymentId,
        items: Vec<OrderItem>,
        address: Address,
    ) -> Self {
        OrderEvent::OrderStarted(OrderStartedData {
            order_id,
            payment_id,
            items,
            address,
            started_at: Utc::now(),
        })
    }

    /// Creates an OrderCanceled event.
    pub fn order_canceled(reason: impl Into<String>, source: CancelSource) -> Self {
        OrderEvent::OrderCanceled(OrderCanceledData {
            reason: reason.into(),
            source,
        })
    }

    /// Creates an AddressUpdated event.
    pub fn address_updated(address: Address) -> Self {
        OrderEvent::AddressUpdated(AddressUpdatedData { address })
    }

    /// Creates a PaymentCharged event.
    pub fn payment_charged(amount: u64) -> Self {
        OrderEvent::PaymentCharged(PaymentChargedData { amount })
    }

    /// Creates a ShippingStarted event.
    pub fn shipping_started(address: Address) -> Self {
        OrderEvent::ShippingStarted(ShippingStartedData { address })
    }

    /// Creates an OrderShipped event.
    pub fn order_shipped(carrier_ref: impl Into<String>) -> Self {
        OrderEvent::OrderShipped(OrderShippedData {
            carrier_ref: carrier_ref.into(),
        })
    }

    /// Creates a DispatchFailed event.
    pub fn dispatch_failed(reason: impl Into<String>) -> Self {
        OrderEvent::DispatchFailed(DispatchFailedData {
            reason: reason.into(),
        })
    }

    /// Creates an OrderFailed event.
    pub fn order_failed(reason: impl Into<String>) -> Self {
        OrderEvent::OrderFailed(OrderFailedData {
            reason: reason.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_event() -> OrderEvent {
        OrderEvent::order_started(
            OrderId::new("ORD-1"),
            PaymentId::new("PAY-1"),
            vec![OrderItem::new("SKU-1", 2)],
            Address::new("1 Main St", "Springfield"),
        )
    }

    #[test]
    fn event_types() {
        assert_eq!(started_event().event_type(), "OrderStarted");
        assert_eq!(OrderEvent::OrderReceived.event_type(), "OrderReceived");
        assert_eq!(OrderEvent::OrderValidated.event_type(), "OrderValidated");
        assert_eq!(OrderEvent::ApprovalGranted.event_type(), "ApprovalGranted");
        assert_eq!(
            OrderEvent::order_canceled("changed mind", CancelSource::Requested).event_type(),
            "OrderCanceled"
        );
        assert_eq!(
            OrderEvent::address_updated(Address::new("2 Elm St", "Shelbyville")).event_type(),
            "AddressUpdated"
        );
        assert_eq!(OrderEvent::ChargingStarted.event_type(), "ChargingStarted");
        assert_eq!(OrderEvent::payment_charged(5).event_type(), "PaymentCharged");
        assert_eq!(
            OrderEvent::shipping_started(Address::new("1 Main St", "Springfield")).event_type(),
            "ShippingStarted"
        );
        assert_eq!(
            OrderEvent::order_shipped("CARRIER-1").event_type(),
            "OrderShipped"
        );
        assert_eq!(
            OrderEvent::dispatch_failed("no route").event_type(),
            "DispatchFailed"
        );
        assert_eq!(
            OrderEvent::order_failed("payment declined").event_type(),
            "OrderFailed"
        );
    }

    #[test]
    fn serialization_roundtrip() {
        let events = vec![
            started_event(),
            OrderEvent::OrderReceived,
            OrderEvent::OrderValidated,
            OrderEvent::ApprovalGranted,
            OrderEvent::order_canceled("late", CancelSource::ApprovalTimeout),
            OrderEvent::address_updated(Address::new("2 Elm St", "Shelbyville")),
            OrderEvent::ChargingStarted,
            OrderEvent::payment_charged(5),
            OrderEvent::shipping_started(Address::new("1 Main St", "Springfield")),
            OrderEvent::order_shipped("CARRIER-1"),
            OrderEvent::dispatch_failed("no route"),
            OrderEvent::order_failed("payment declined"),
        ];

        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event.event_type(), deserialized.event_type());
        }
    }

    #[test]
    fn canceled_event_keeps_cause() {
        let event = OrderEvent::order_canceled("changed mind", CancelSource::Requested);
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();

        if let OrderEvent::OrderCanceled(data) = deserialized {
            assert_eq!(data.reason, "changed mind");
            assert_eq!(data.source, CancelSource::Requested);
        } else {
            panic!("Expected OrderCanceled event");
        }
    }
}
