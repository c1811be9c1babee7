//! The shipping child workflow.
//!
//! Spawned by the order flow once payment succeeds, addressed as
//! `ship-{order_id}` with its own history stream, and dispatched entirely
//! on the shipping lane. The child's only communication with its parent is
//! the [`ShippingOutcome`] it returns; a failed shipment is a normal value,
//! never a parent error.

use std::sync::Arc;

use common::{InstanceId, OrderId};
use domain::{Address, OrderItem, ShipmentRecord, ShippingEvent, ShippingOutcome};
use event_store::EventStore;

use crate::activities::{DispatchResult, OrderActivities, ShippingActivities};
use crate::coordinator::{Inner, record_event};
use crate::error::Result;

pub(crate) async fn run<S, A, Sh>(
    inner: Arc<Inner<S, A, Sh>>,
    order_id: OrderId,
    items: Vec<OrderItem>,
    address: Address,
) -> ShippingOutcome
where
    S: EventStore + 'static,
    A: OrderActivities + 'static,
    Sh: ShippingActivities + 'static,
{
    let instance_id = InstanceId::for_shipping(&order_id);
    match drive(&inner, &instance_id, &order_id, &items, &address).await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::error!(order_id = %order_id, %error, "shipping workflow aborted");
            ShippingOutcome::failed(format!("shipping history unavailable: {error}"))
        }
    }
}

async fn drive<S, A, Sh>(
    inner: &Arc<Inner<S, A, Sh>>,
    instance_id: &InstanceId,
    order_id: &OrderId,
    items: &[OrderItem],
    address: &Address,
) -> Result<ShippingOutcome>
where
    S: EventStore + 'static,
    A: OrderActivities + 'static,
    Sh: ShippingActivities + 'static,
{
    let mut record = ShipmentRecord::default();
    record_event(
        &inner.store,
        instance_id,
        &mut record,
        ShippingEvent::shipment_started(order_id.clone(), address.clone()),
    )
    .await?;
    tracing::info!(order_id = %order_id, instance_id = %instance_id, "shipping workflow started");

    // Step 1: prepare the package
    let prepared = runtime::execute(
        &inner.shipping_lane,
        &inner.config.shipping_retry,
        "prepare_package",
        || inner.shipping_activities.prepare_package(order_id, items),
    )
    .await;
    if let Err(failure) = prepared {
        let reason = failure.to_string();
        record_event(
            &inner.store,
            instance_id,
            &mut record,
            ShippingEvent::shipment_failed(reason.clone()),
        )
        .await?;
        metrics::counter!("shipments_failed").increment(1);
        return Ok(ShippingOutcome::failed(reason));
    }
    record_event(
        &inner.store,
        instance_id,
        &mut record,
        ShippingEvent::PackagePrepared,
    )
    .await?;

    // Step 2: dispatch the carrier
    let dispatched = runtime::execute(
        &inner.shipping_lane,
        &inner.config.shipping_retry,
        "dispatch_carrier",
        || inner.shipping_activities.dispatch_carrier(order_id, address),
    )
    .await;
    let (event, outcome) = match dispatched {
        Ok(DispatchResult::Dispatched { carrier_ref }) => (
            ShippingEvent::carrier_dispatched(carrier_ref.clone()),
            ShippingOutcome::dispatched(carrier_ref),
        ),
        Ok(DispatchResult::Undeliverable { reason }) => (
            ShippingEvent::shipment_failed(reason.clone()),
            ShippingOutcome::failed(reason),
        ),
        Err(failure) => {
            let reason = failure.to_string();
            (
                ShippingEvent::shipment_failed(reason.clone()),
                ShippingOutcome::failed(reason),
            )
        }
    };
    record_event(&inner.store, instance_id, &mut record, event).await?;

    if outcome.is_dispatched() {
        metrics::counter!("shipments_dispatched").increment(1);
    } else {
        metrics::counter!("shipments_failed").increment(1);
    }
    Ok(outcome)
}
