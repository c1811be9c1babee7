//! Signal and query surface of a running order.

use common::OrderId;
use domain::{Address, Signal, StatusSnapshot};
use tokio::sync::{mpsc, watch};

/// External handle to one order instance.
///
/// Signals are fire-and-forget: they enqueue into the instance's mailbox
/// and are applied in receipt order by the workflow task. Queries read the
/// last published snapshot and never block, whatever the workflow is doing.
///
/// A signal sent after the order reached a terminal step is accepted and
/// dropped silently, so callers racing the terminal transition never see
/// an error.
#[derive(Debug, Clone)]
pub struct OrderHandle {
    order_id: OrderId,
    signals: mpsc::UnboundedSender<Signal>,
    status: watch::Receiver<StatusSnapshot>,
}

impl OrderHandle {
    pub(crate) fn new(
        order_id: OrderId,
        signals: mpsc::UnboundedSender<Signal>,
        status: watch::Receiver<StatusSnapshot>,
    ) -> Self {
        Self {
            order_id,
            signals,
            status,
        }
    }

    /// Returns the order ID this handle addresses.
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Enqueues a signal for the workflow task.
    pub fn signal(&self, signal: Signal) {
        metrics::counter!("order_signals_total", "signal" => signal.name()).increment(1);
        if self.signals.send(signal).is_err() {
            // Instance already terminal; the signal is a recorded no-op.
            tracing::debug!(order_id = %self.order_id, "signal after terminal step dropped");
        }
    }

    /// Approves the order for charging.
    pub fn approve(&self) {
        self.signal(Signal::Approve);
    }

    /// Cancels the order.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.signal(Signal::CancelOrder {
            reason: reason.into(),
        });
    }

    /// Replaces the shipping address.
    pub fn update_address(&self, address: Address) {
        self.signal(Signal::UpdateAddress { address });
    }

    /// Returns the current status snapshot without blocking.
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    /// Waits until the order reaches a terminal step and returns the final
    /// snapshot.
    pub async fn until_terminal(&self) -> StatusSnapshot {
        let mut status = self.status.clone();
        if let Ok(snapshot) = status.wait_for(|s| s.step.is_terminal()).await {
            return snapshot.clone();
        }
        // Publisher gone; the last snapshot is all there is.
        status.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::OrderStep;

    fn handle() -> (
        OrderHandle,
        mpsc::UnboundedReceiver<Signal>,
        watch::Sender<StatusSnapshot>,
    ) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
        (
            OrderHandle::new(OrderId::new("ORD-1"), signal_tx, status_rx),
            signal_rx,
            status_tx,
        )
    }

    #[tokio::test]
    async fn signals_enqueue_in_receipt_order() {
        let (handle, mut signal_rx, _status_tx) = handle();

        handle.cancel("changed mind");
        handle.approve();

        assert!(matches!(
            signal_rx.recv().await.unwrap(),
            Signal::CancelOrder { .. }
        ));
        assert!(matches!(signal_rx.recv().await.unwrap(), Signal::Approve));
    }

    #[tokio::test]
    async fn signal_after_receiver_dropped_does_not_error() {
        let (handle, signal_rx, _status_tx) = handle();
        drop(signal_rx);

        // Accepted without error, dropped silently
        handle.approve();
        handle.cancel("too late");
        handle.update_address(Address::new("2 Elm St", "Shelbyville"));
    }

    #[tokio::test]
    async fn status_reads_last_published_snapshot() {
        let (handle, _signal_rx, status_tx) = handle();
        assert_eq!(handle.status().step, OrderStep::Received);

        status_tx.send_modify(|s| s.step = OrderStep::AwaitingApproval);
        assert_eq!(handle.status().step, OrderStep::AwaitingApproval);
    }

    #[tokio::test]
    async fn until_terminal_returns_final_snapshot() {
        let (handle, _signal_rx, status_tx) = handle();

        let waiter = tokio::spawn({
            let handle = handle.clone();
            async move { handle.until_terminal().await }
        });

        status_tx.send_modify(|s| s.step = OrderStep::Charging);
        status_tx.send_modify(|s| {
            s.step = OrderStep::Shipped;
            s.approved = true;
        });

        let snapshot = waiter.await.unwrap();
        assert_eq!(snapshot.step, OrderStep::Shipped);
        assert!(snapshot.approved);
    }
}
