//! The order lifecycle driver.
//!
//! One `OrderFlow` runs per order as a single logical task. It alone owns
//! the order's record: activities are dispatched in sequence, queued
//! signals are merged between activities and at the two suspension points
//! (the bounded approval wait and the child wait), and every transition is
//! appended to the store before the published snapshot changes.

use std::sync::Arc;

use common::{InstanceId, OrderId, PaymentId};
use domain::{
    Address, CancelSource, OrderEvent, OrderItem, OrderRecord, OrderStep, ShippingOutcome, Signal,
    StatusSnapshot, charge_amount,
};
use event_store::EventStore;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

use crate::activities::{ChargeResult, OrderActivities, ShippingActivities, Validation};
use crate::coordinator::{Inner, record_event};
use crate::error::Result;
use crate::shipping;

/// Everything a spawned order task owns.
pub(crate) struct OrderContext {
    pub(crate) order_id: OrderId,
    pub(crate) payment_id: PaymentId,
    pub(crate) items: Vec<OrderItem>,
    pub(crate) address: Address,
    pub(crate) signals: mpsc::UnboundedReceiver<Signal>,
    pub(crate) status: watch::Sender<StatusSnapshot>,
}

pub(crate) struct OrderFlow<S, A, Sh> {
    inner: Arc<Inner<S, A, Sh>>,
    instance_id: InstanceId,
    order_id: OrderId,
    payment_id: PaymentId,
    items: Vec<OrderItem>,
    start_address: Address,
    signals: mpsc::UnboundedReceiver<Signal>,
    signals_open: bool,
    status: watch::Sender<StatusSnapshot>,
    record: OrderRecord,
}

impl<S, A, Sh> OrderFlow<S, A, Sh>
where
    S: EventStore + 'static,
    A: OrderActivities + 'static,
    Sh: ShippingActivities + 'static,
{
    pub(crate) fn new(inner: Arc<Inner<S, A, Sh>>, ctx: OrderContext) -> Self {
        Self {
            inner,
            instance_id: InstanceId::for_order(&ctx.order_id),
            order_id: ctx.order_id,
            payment_id: ctx.payment_id,
            items: ctx.items,
            start_address: ctx.address,
            signals: ctx.signals,
            signals_open: true,
            status: ctx.status,
            record: OrderRecord::default(),
        }
    }

    pub(crate) async fn run(mut self) {
        let started = Instant::now();
        match self.drive().await {
            Ok(()) => {
                let step = self.record.step();
                metrics::histogram!("order_workflow_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                metrics::counter!("order_workflows_completed", "step" => step.as_str())
                    .increment(1);
                tracing::info!(order_id = %self.order_id, %step, "order workflow finished");
            }
            Err(error) => {
                // The history could not be written. Publish a failed
                // snapshot so queriers never see an ambiguous hang.
                tracing::error!(order_id = %self.order_id, %error, "order workflow aborted");
                self.status.send_modify(|s| s.step = OrderStep::Failed);
            }
        }
    }

    async fn drive(&mut self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        let order_id = self.order_id.clone();
        let items = self.items.clone();

        self.emit(OrderEvent::order_started(
            order_id.clone(),
            self.payment_id.clone(),
            items.clone(),
            self.start_address.clone(),
        ))
        .await?;

        // Step 1: receive
        let address = self.current_address();
        let received = runtime::execute(
            &inner.order_lane,
            &inner.config.order_retry,
            "receive_order",
            || inner.order_activities.receive_order(&order_id, &items, &address),
        )
        .await;
        match received {
            Ok(()) => self.emit(OrderEvent::OrderReceived).await?,
            Err(failure) => return self.fail(failure.to_string()).await,
        }
        self.drain_signals().await?;
        if self.record.is_terminal() {
            return Ok(());
        }

        // Step 2: validate
        let validated = runtime::execute(
            &inner.order_lane,
            &inner.config.order_retry,
            "validate_order",
            || inner.order_activities.validate_order(&order_id, &items),
        )
        .await;
        match validated {
            Ok(Validation::Ok) => self.emit(OrderEvent::OrderValidated).await?,
            Ok(Validation::Rejected { reason }) => {
                return self.fail(format!("order rejected: {reason}")).await;
            }
            Err(failure) => return self.fail(failure.to_string()).await,
        }
        self.drain_signals().await?;
        if self.record.is_terminal() {
            return Ok(());
        }

        // Step 3: bounded wait for approval or cancellation
        self.await_approval().await?;
        if self.record.canceled() {
            return Ok(());
        }

        // Step 4: charge
        self.emit(OrderEvent::ChargingStarted).await?;
        let payment_id = self.payment_id.clone();
        let amount = charge_amount(&items);
        let charged = runtime::execute(
            &inner.order_lane,
            &inner.config.order_retry,
            "charge_payment",
            || inner.order_activities.charge_payment(&order_id, &payment_id, amount),
        )
        .await;
        match charged {
            Ok(ChargeResult::Charged { amount }) => {
                self.emit(OrderEvent::payment_charged(amount)).await?;
            }
            Ok(ChargeResult::Declined { reason }) => {
                return self.fail(format!("payment declined: {reason}")).await;
            }
            Err(failure) => return self.fail(failure.to_string()).await,
        }
        self.drain_signals().await?;

        // Step 5: delegate to the shipping child with the address snapshot
        // taken now; later address updates cannot reach the shipment.
        let snapshot_address = self.current_address();
        self.emit(OrderEvent::shipping_started(snapshot_address.clone()))
            .await?;
        let child = tokio::spawn(shipping::run(
            Arc::clone(&self.inner),
            order_id.clone(),
            items.clone(),
            snapshot_address,
        ));

        // Step 6: merge the child outcome
        match self.await_child(child).await? {
            ShippingOutcome::Dispatched { carrier_ref } => {
                self.emit(OrderEvent::order_shipped(carrier_ref)).await?;
            }
            ShippingOutcome::Failed { reason } => {
                tracing::warn!(order_id = %self.order_id, %reason, "shipment failed");
                self.emit(OrderEvent::dispatch_failed(reason)).await?;
            }
        }
        Ok(())
    }

    /// Suspends until `approved || canceled` or the configured bound
    /// elapses, applying signals in receipt order while suspended.
    ///
    /// The whole queued batch is applied before the condition is
    /// evaluated, so a cancellation queued behind an approval still wins.
    async fn await_approval(&mut self) -> Result<()> {
        let deadline = sleep(self.inner.config.approval_wait);
        tokio::pin!(deadline);

        loop {
            self.drain_signals().await?;
            if self.record.canceled() || self.record.approved() {
                return Ok(());
            }
            tokio::select! {
                () = &mut deadline => {
                    tracing::info!(order_id = %self.order_id, "approval wait elapsed");
                    self.emit(OrderEvent::order_canceled(
                        "approval wait elapsed",
                        CancelSource::ApprovalTimeout,
                    ))
                    .await?;
                    return Ok(());
                }
                maybe = self.signals.recv(), if self.signals_open => match maybe {
                    Some(signal) => self.apply_signal(&signal).await?,
                    None => self.signals_open = false,
                }
            }
        }
    }

    /// Suspends until the shipping child returns its outcome, still
    /// consuming signals so late callers are never blocked or errored.
    async fn await_child(
        &mut self,
        mut child: JoinHandle<ShippingOutcome>,
    ) -> Result<ShippingOutcome> {
        loop {
            tokio::select! {
                joined = &mut child => {
                    return Ok(joined.unwrap_or_else(|error| {
                        ShippingOutcome::failed(format!("shipping workflow aborted: {error}"))
                    }));
                }
                maybe = self.signals.recv(), if self.signals_open => match maybe {
                    Some(signal) => self.apply_signal(&signal).await?,
                    None => self.signals_open = false,
                }
            }
        }
    }

    /// Applies every signal already queued, in receipt order.
    async fn drain_signals(&mut self) -> Result<()> {
        while let Ok(signal) = self.signals.try_recv() {
            self.apply_signal(&signal).await?;
        }
        Ok(())
    }

    async fn apply_signal(&mut self, signal: &Signal) -> Result<()> {
        match self.record.on_signal(signal) {
            Some(event) => {
                tracing::info!(
                    order_id = %self.order_id,
                    signal = signal.name(),
                    "signal applied"
                );
                self.emit(event).await
            }
            None => {
                tracing::debug!(
                    order_id = %self.order_id,
                    signal = signal.name(),
                    step = %self.record.step(),
                    "signal had no effect"
                );
                Ok(())
            }
        }
    }

    async fn fail(&mut self, reason: String) -> Result<()> {
        tracing::warn!(order_id = %self.order_id, %reason, "order failed");
        self.emit(OrderEvent::order_failed(reason)).await
    }

    /// Appends the event to the history, folds it into the record, and
    /// publishes the new snapshot.
    async fn emit(&mut self, event: OrderEvent) -> Result<()> {
        record_event(&self.inner.store, &self.instance_id, &mut self.record, event).await?;
        self.status.send_replace(self.record.status());
        Ok(())
    }

    fn current_address(&self) -> Address {
        self.record
            .address()
            .cloned()
            .unwrap_or_else(|| self.start_address.clone())
    }
}
