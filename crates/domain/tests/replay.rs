//! Replay tests: a record rebuilt from stored history matches the live one.

use common::{InstanceId, OrderId, PaymentId};
use domain::{
    Address, CancelSource, DomainEvent, OrderEvent, OrderRecord, OrderStep, StateMachine,
};
use event_store::{AppendOptions, EventEnvelope, EventStore, InMemoryEventStore, Version};

async fn append_all(store: &InMemoryEventStore, instance_id: &InstanceId, events: &[OrderEvent]) {
    let mut version = Version::initial();
    for event in events {
        let next = version.next();
        let envelope = EventEnvelope::builder()
            .event_type(event.event_type())
            .instance_id(instance_id.clone())
            .instance_type(OrderRecord::instance_type())
            .version(next)
            .payload(event)
            .unwrap()
            .build();
        store
            .append(vec![envelope], AppendOptions::expect_version(version))
            .await
            .unwrap();
        version = next;
    }
}

async fn replay(store: &InMemoryEventStore, instance_id: &InstanceId) -> OrderRecord {
    let mut record = OrderRecord::default();
    let envelopes = store.get_events_for_instance(instance_id).await.unwrap();
    for envelope in envelopes {
        let event: OrderEvent = serde_json::from_value(envelope.payload).unwrap();
        record.apply(event);
        record.set_version(envelope.version);
    }
    record
}

fn shipped_history() -> Vec<OrderEvent> {
    let address = Address::new("1 Main St", "Springfield").with_zip("62701");
    vec![
        OrderEvent::order_started(
            OrderId::new("ORD-1"),
            PaymentId::new("PAY-1"),
            vec![domain::OrderItem::new("SKU-1", 2)],
            address.clone(),
        ),
        OrderEvent::OrderReceived,
        OrderEvent::OrderValidated,
        OrderEvent::ApprovalGranted,
        OrderEvent::ChargingStarted,
        OrderEvent::payment_charged(2),
        OrderEvent::shipping_started(address),
        OrderEvent::order_shipped("CARRIER-1"),
    ]
}

#[tokio::test]
async fn replayed_record_matches_live_fold() {
    let store = InMemoryEventStore::new();
    let instance_id = InstanceId::new("ORD-1");
    let history = shipped_history();

    let mut live = OrderRecord::default();
    live.apply_events(history.iter().cloned());

    append_all(&store, &instance_id, &history).await;
    let replayed = replay(&store, &instance_id).await;

    assert_eq!(replayed.status(), live.status());
    assert_eq!(replayed.step(), OrderStep::Shipped);
    assert_eq!(replayed.version(), Version::new(history.len() as i64));
}

#[tokio::test]
async fn replayed_cancellation_keeps_cause() {
    let store = InMemoryEventStore::new();
    let instance_id = InstanceId::new("ORD-2");
    let history = vec![
        OrderEvent::order_started(
            OrderId::new("ORD-2"),
            PaymentId::new("PAY-2"),
            vec![domain::OrderItem::new("SKU-1", 1)],
            Address::new("2 Elm St", "Shelbyville"),
        ),
        OrderEvent::OrderReceived,
        OrderEvent::OrderValidated,
        OrderEvent::order_canceled("approval wait elapsed", CancelSource::ApprovalTimeout),
    ];

    append_all(&store, &instance_id, &history).await;
    let replayed = replay(&store, &instance_id).await;

    assert_eq!(replayed.step(), OrderStep::Canceled);
    assert!(replayed.canceled());
    assert_eq!(replayed.cancel_source(), Some(CancelSource::ApprovalTimeout));
}
