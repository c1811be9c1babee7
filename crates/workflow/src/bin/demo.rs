//! Demo driver: runs one approved order end to end, then shows an
//! unattended order canceling itself when the approval wait elapses.

use common::OrderId;
use domain::{Address, OrderItem};
use event_store::InMemoryEventStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use workflow::{
    InMemoryOrderActivities, InMemoryShippingActivities, OrderCoordinator, OrderLedger,
    StartOrder, WorkflowConfig,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkflowConfig::from_env();
    let store = InMemoryEventStore::new();
    let ledger = OrderLedger::new();
    let coordinator = OrderCoordinator::new(
        store,
        InMemoryOrderActivities::new(ledger.clone()),
        InMemoryShippingActivities::new(ledger.clone()),
        config,
    );

    // Approved order: receive → validate → approve → charge → ship
    let handle = coordinator
        .start_order(StartOrder::new(
            "ORD-1001",
            "PAY-1001",
            vec![
                OrderItem::new("SKU-KEYBOARD", 1),
                OrderItem::new("SKU-MOUSE", 2),
            ],
            Address::new("1 Main St", "Springfield")
                .with_state("IL")
                .with_zip("62701"),
        ))
        .await
        .expect("start ORD-1001");
    handle.approve();
    let status = handle.until_terminal().await;
    tracing::info!(step = %status.step, approved = status.approved, "ORD-1001 finished");

    for event in ledger.audit_for(&OrderId::new("ORD-1001")) {
        tracing::info!(event = %event.event_type, "audit");
    }

    // Unattended order: nobody approves, the wait elapses, the order
    // cancels itself.
    let handle = coordinator
        .start_order(StartOrder::new(
            "ORD-1002",
            "PAY-1002",
            vec![OrderItem::new("SKU-KEYBOARD", 1)],
            Address::new("2 Elm St", "Shelbyville"),
        ))
        .await
        .expect("start ORD-1002");
    let status = handle.until_terminal().await;
    tracing::info!(step = %status.step, canceled = status.canceled, "ORD-1002 finished");
}
