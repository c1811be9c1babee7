//! Coordinator for order workflow instances.

use std::collections::HashMap;
use std::sync::Arc;

use common::{InstanceId, OrderId, PaymentId};
use domain::{
    Address, DomainEvent, OrderItem, OrderRecord, ShipmentRecord, StateMachine, StatusSnapshot,
};
use event_store::{AppendOptions, EventEnvelope, EventStore, EventStoreExt};
use runtime::DispatchLane;
use tokio::sync::{RwLock, mpsc, watch};

use crate::activities::{OrderActivities, ShippingActivities};
use crate::config::WorkflowConfig;
use crate::error::{Result, WorkflowError};
use crate::handle::OrderHandle;
use crate::lifecycle::{OrderContext, OrderFlow};

/// Start request for an order instance.
///
/// The order ID is the idempotency key for process identity: starting
/// twice with the same ID yields one instance.
#[derive(Debug, Clone)]
pub struct StartOrder {
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub items: Vec<OrderItem>,
    pub address: Address,
}

impl StartOrder {
    /// Creates a start request.
    pub fn new(
        order_id: impl Into<OrderId>,
        payment_id: impl Into<PaymentId>,
        items: Vec<OrderItem>,
        address: Address,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            payment_id: payment_id.into(),
            items,
            address,
        }
    }
}

pub(crate) struct Inner<S, A, Sh> {
    pub(crate) store: S,
    pub(crate) order_activities: A,
    pub(crate) shipping_activities: Sh,
    pub(crate) config: WorkflowConfig,
    pub(crate) order_lane: DispatchLane,
    pub(crate) shipping_lane: DispatchLane,
    instances: RwLock<HashMap<OrderId, OrderHandle>>,
}

/// Owns the arena of live order instances and the two dispatch lanes.
///
/// Orders share nothing with each other; the coordinator only maps IDs to
/// handles. Every instance's state is independently reconstructable from
/// its own history via [`OrderCoordinator::get_order`].
pub struct OrderCoordinator<S, A, Sh> {
    inner: Arc<Inner<S, A, Sh>>,
}

impl<S, A, Sh> Clone for OrderCoordinator<S, A, Sh> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, Sh> OrderCoordinator<S, A, Sh>
where
    S: EventStore + 'static,
    A: OrderActivities + 'static,
    Sh: ShippingActivities + 'static,
{
    /// Creates a coordinator over a store and activity implementations.
    pub fn new(
        store: S,
        order_activities: A,
        shipping_activities: Sh,
        config: WorkflowConfig,
    ) -> Self {
        let order_lane = DispatchLane::new("orders", config.order_lane_capacity);
        let shipping_lane = DispatchLane::new("shipping", config.shipping_lane_capacity);
        Self {
            inner: Arc::new(Inner {
                store,
                order_activities,
                shipping_activities,
                config,
                order_lane,
                shipping_lane,
                instances: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Starts an order workflow, or returns the handle of the already
    /// running instance with this ID.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn start_order(&self, request: StartOrder) -> Result<OrderHandle> {
        validate_start(&request)?;

        let mut instances = self.inner.instances.write().await;
        if let Some(handle) = instances.get(&request.order_id) {
            tracing::info!("start is idempotent; returning existing instance");
            return Ok(handle.clone());
        }
        if self
            .inner
            .store
            .instance_exists(&InstanceId::for_order(&request.order_id))
            .await?
        {
            return Err(WorkflowError::DuplicateOrder(request.order_id));
        }

        metrics::counter!("order_workflows_started").increment(1);
        tracing::info!("order workflow starting");

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
        let handle = OrderHandle::new(request.order_id.clone(), signal_tx, status_rx);
        instances.insert(request.order_id.clone(), handle.clone());
        drop(instances);

        let ctx = OrderContext {
            order_id: request.order_id,
            payment_id: request.payment_id,
            items: request.items,
            address: request.address,
            signals: signal_rx,
            status: status_tx,
        };
        tokio::spawn(OrderFlow::new(Arc::clone(&self.inner), ctx).run());

        Ok(handle)
    }

    /// Returns the handle of an instance, if one was started here.
    pub async fn handle(&self, order_id: &OrderId) -> Option<OrderHandle> {
        self.inner.instances.read().await.get(order_id).cloned()
    }

    /// Rebuilds an order record from its stored history.
    pub async fn get_order(&self, order_id: &OrderId) -> Result<Option<OrderRecord>> {
        load(&self.inner.store, &InstanceId::for_order(order_id)).await
    }

    /// Rebuilds the shipping child's record from its stored history.
    pub async fn get_shipment(&self, order_id: &OrderId) -> Result<Option<ShipmentRecord>> {
        load(&self.inner.store, &InstanceId::for_shipping(order_id)).await
    }
}

fn validate_start(request: &StartOrder) -> Result<()> {
    if request.items.is_empty() {
        return Err(WorkflowError::InvalidStart(
            "order has no items".to_string(),
        ));
    }
    for item in &request.items {
        if item.qty == 0 {
            return Err(WorkflowError::InvalidStart(format!(
                "item {} has zero quantity",
                item.sku
            )));
        }
    }
    Ok(())
}

/// Rebuilds a state machine by folding its stored event stream.
async fn load<S: EventStore, M: StateMachine>(
    store: &S,
    instance_id: &InstanceId,
) -> Result<Option<M>> {
    let envelopes = store.get_events_for_instance(instance_id).await?;
    if envelopes.is_empty() {
        return Ok(None);
    }

    let mut machine = M::default();
    for envelope in envelopes {
        let event: M::Event = serde_json::from_value(envelope.payload)?;
        machine.apply(event);
        machine.set_version(envelope.version);
    }
    Ok(Some(machine))
}

/// Appends one event to an instance's history, then folds it into the
/// machine.
///
/// The append carries the machine's current version as the expected
/// version, so a second writer for the same instance would conflict
/// instead of corrupting the stream.
pub(crate) async fn record_event<S: EventStore, M: StateMachine>(
    store: &S,
    instance_id: &InstanceId,
    machine: &mut M,
    event: M::Event,
) -> Result<()> {
    let next = machine.version().next();
    let envelope = EventEnvelope::builder()
        .event_type(event.event_type())
        .instance_id(instance_id.clone())
        .instance_type(M::instance_type())
        .version(next)
        .payload(&event)?
        .build();
    store
        .append_event(envelope, AppendOptions::expect_version(machine.version()))
        .await?;
    machine.apply(event);
    machine.set_version(next);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::{InMemoryOrderActivities, InMemoryShippingActivities, OrderLedger};
    use event_store::InMemoryEventStore;

    fn coordinator() -> OrderCoordinator<
        InMemoryEventStore,
        InMemoryOrderActivities,
        InMemoryShippingActivities,
    > {
        let ledger = OrderLedger::new();
        OrderCoordinator::new(
            InMemoryEventStore::new(),
            InMemoryOrderActivities::new(ledger.clone()),
            InMemoryShippingActivities::new(ledger),
            WorkflowConfig::default(),
        )
    }

    fn address() -> Address {
        Address::new("1 Main St", "Springfield")
    }

    #[tokio::test]
    async fn start_rejects_empty_items() {
        let coordinator = coordinator();
        let result = coordinator
            .start_order(StartOrder::new("ORD-1", "PAY-1", vec![], address()))
            .await;
        assert!(matches!(result, Err(WorkflowError::InvalidStart(_))));
    }

    #[tokio::test]
    async fn start_rejects_zero_quantity() {
        let coordinator = coordinator();
        let result = coordinator
            .start_order(StartOrder::new(
                "ORD-1",
                "PAY-1",
                vec![OrderItem::new("SKU-1", 0)],
                address(),
            ))
            .await;
        assert!(matches!(result, Err(WorkflowError::InvalidStart(_))));
    }

    #[tokio::test]
    async fn unknown_order_has_no_handle_or_history() {
        let coordinator = coordinator();
        let order_id = OrderId::new("ORD-404");
        assert!(coordinator.handle(&order_id).await.is_none());
        assert!(coordinator.get_order(&order_id).await.unwrap().is_none());
        assert!(coordinator.get_shipment(&order_id).await.unwrap().is_none());
    }
}
