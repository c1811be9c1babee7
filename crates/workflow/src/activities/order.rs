//! Order-level activity contract and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, PaymentId};
use domain::{Address, OrderItem};
use runtime::ActivityError;

use super::ledger::{OrderLedger, PaymentRecord, PaymentStatus};

/// Outcome of the validate-order activity.
///
/// A rejection is a normal business outcome, not a transport error; it is
/// never retried and routes the order to its failed transition with a
/// reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The order is valid.
    Ok,
    /// The order cannot be fulfilled as submitted.
    Rejected { reason: String },
}

/// Outcome of the charge-payment activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeResult {
    /// The payment was charged (or had already been charged by an earlier
    /// attempt).
    Charged { amount: u64 },
    /// The payment was declined.
    Declined { reason: String },
}

/// Order-level activities, dispatched on the order lane.
///
/// Each call is one attempt; the retry driver re-invokes on transient
/// failure, so every external write in here must be idempotent.
#[async_trait]
pub trait OrderActivities: Send + Sync {
    /// Records the incoming order and emits the received audit event.
    async fn receive_order(
        &self,
        order_id: &OrderId,
        items: &[OrderItem],
        address: &Address,
    ) -> Result<(), ActivityError>;

    /// Validates the order items and marks the order validated.
    async fn validate_order(
        &self,
        order_id: &OrderId,
        items: &[OrderItem],
    ) -> Result<Validation, ActivityError>;

    /// Charges the payment idempotently, keyed by payment ID.
    async fn charge_payment(
        &self,
        order_id: &OrderId,
        payment_id: &PaymentId,
        amount: u64,
    ) -> Result<ChargeResult, ActivityError>;
}

#[derive(Debug, Default)]
struct FailureState {
    fail_receive: u32,
    fail_validate: u32,
    fail_charge: u32,
    decline_charge: bool,
    receive_calls: u32,
    validate_calls: u32,
    charge_calls: u32,
}

/// In-memory order activities writing to an [`OrderLedger`].
///
/// Supports injecting transient failures per activity (`fail_next_*`) and
/// a payment decline, for exercising retry and failure paths.
#[derive(Debug, Clone)]
pub struct InMemoryOrderActivities {
    ledger: OrderLedger,
    state: Arc<RwLock<FailureState>>,
}

impl InMemoryOrderActivities {
    /// Creates order activities over the given ledger.
    pub fn new(ledger: OrderLedger) -> Self {
        Self {
            ledger,
            state: Arc::new(RwLock::new(FailureState::default())),
        }
    }

    /// Makes the next `n` receive attempts fail transiently.
    pub fn fail_next_receive(&self, n: u32) {
        self.state.write().unwrap().fail_receive = n;
    }

    /// Makes the next `n` validate attempts fail transiently.
    pub fn fail_next_validate(&self, n: u32) {
        self.state.write().unwrap().fail_validate = n;
    }

    /// Makes the next `n` charge attempts fail transiently.
    pub fn fail_next_charge(&self, n: u32) {
        self.state.write().unwrap().fail_charge = n;
    }

    /// Makes charge attempts return a decline.
    pub fn set_decline_charge(&self, decline: bool) {
        self.state.write().unwrap().decline_charge = decline;
    }

    /// Returns how many receive attempts were made.
    pub fn receive_calls(&self) -> u32 {
        self.state.read().unwrap().receive_calls
    }

    /// Returns how many validate attempts were made.
    pub fn validate_calls(&self) -> u32 {
        self.state.read().unwrap().validate_calls
    }

    /// Returns how many charge attempts were made.
    pub fn charge_calls(&self) -> u32 {
        self.state.read().unwrap().charge_calls
    }

    fn take_failure(&self, pick: impl Fn(&mut FailureState) -> &mut u32) -> bool {
        let mut state = self.state.write().unwrap();
        let remaining = pick(&mut state);
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl OrderActivities for InMemoryOrderActivities {
    async fn receive_order(
        &self,
        order_id: &OrderId,
        items: &[OrderItem],
        address: &Address,
    ) -> Result<(), ActivityError> {
        self.state.write().unwrap().receive_calls += 1;
        if self.take_failure(|s| &mut s.fail_receive) {
            return Err(ActivityError::transient("order store unavailable"));
        }

        self.ledger.upsert_order(order_id, address, "received");
        self.ledger.append_audit(
            order_id,
            "order_received",
            serde_json::json!({ "items": items, "address": address }),
        );
        Ok(())
    }

    async fn validate_order(
        &self,
        order_id: &OrderId,
        items: &[OrderItem],
    ) -> Result<Validation, ActivityError> {
        self.state.write().unwrap().validate_calls += 1;
        if self.take_failure(|s| &mut s.fail_validate) {
            return Err(ActivityError::transient("order store unavailable"));
        }

        if items.is_empty() {
            return Ok(Validation::Rejected {
                reason: "no items to validate".to_string(),
            });
        }

        self.ledger.mark_order_state(order_id, "validated");
        self.ledger
            .append_audit(order_id, "order_validated", serde_json::json!({}));
        Ok(Validation::Ok)
    }

    async fn charge_payment(
        &self,
        order_id: &OrderId,
        payment_id: &PaymentId,
        amount: u64,
    ) -> Result<ChargeResult, ActivityError> {
        self.state.write().unwrap().charge_calls += 1;
        if self.take_failure(|s| &mut s.fail_charge) {
            return Err(ActivityError::transient("payment gateway unavailable"));
        }

        if self.state.read().unwrap().decline_charge {
            self.ledger.insert_payment_if_absent(PaymentRecord {
                payment_id: payment_id.clone(),
                order_id: order_id.clone(),
                amount,
                status: PaymentStatus::Failed,
            });
            self.ledger.append_audit(
                order_id,
                "payment_declined",
                serde_json::json!({ "payment_id": payment_id }),
            );
            return Ok(ChargeResult::Declined {
                reason: "card declined".to_string(),
            });
        }

        // Upsert by payment ID; a retried attempt reads back the row the
        // first attempt wrote.
        let stored = self.ledger.insert_payment_if_absent(PaymentRecord {
            payment_id: payment_id.clone(),
            order_id: order_id.clone(),
            amount,
            status: PaymentStatus::Charged,
        });
        self.ledger.append_audit(
            order_id,
            "payment_charged",
            serde_json::json!({
                "payment_id": payment_id,
                "amount": stored.amount,
                "status": stored.status,
            }),
        );
        Ok(ChargeResult::Charged {
            amount: stored.amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activities() -> (InMemoryOrderActivities, OrderLedger) {
        let ledger = OrderLedger::new();
        (InMemoryOrderActivities::new(ledger.clone()), ledger)
    }

    fn order_inputs() -> (OrderId, Vec<OrderItem>, Address) {
        (
            OrderId::new("ORD-1"),
            vec![OrderItem::new("SKU-1", 2), OrderItem::new("SKU-2", 1)],
            Address::new("1 Main St", "Springfield"),
        )
    }

    #[tokio::test]
    async fn receive_writes_order_and_audit() {
        let (activities, ledger) = activities();
        let (order_id, items, address) = order_inputs();

        activities
            .receive_order(&order_id, &items, &address)
            .await
            .unwrap();

        assert_eq!(ledger.order(&order_id).unwrap().state, "received");
        assert_eq!(ledger.audit_types_for(&order_id), vec!["order_received"]);
        assert_eq!(activities.receive_calls(), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let (activities, _ledger) = activities();
        let (order_id, items, address) = order_inputs();

        activities.fail_next_receive(2);

        assert!(
            activities
                .receive_order(&order_id, &items, &address)
                .await
                .is_err()
        );
        assert!(
            activities
                .receive_order(&order_id, &items, &address)
                .await
                .is_err()
        );
        assert!(
            activities
                .receive_order(&order_id, &items, &address)
                .await
                .is_ok()
        );
        assert_eq!(activities.receive_calls(), 3);
    }

    #[tokio::test]
    async fn validate_rejects_empty_items() {
        let (activities, ledger) = activities();
        let order_id = OrderId::new("ORD-1");

        let outcome = activities.validate_order(&order_id, &[]).await.unwrap();
        assert!(matches!(outcome, Validation::Rejected { .. }));
        assert!(ledger.audit_types_for(&order_id).is_empty());
    }

    #[tokio::test]
    async fn charge_is_idempotent_across_attempts() {
        let (activities, ledger) = activities();
        let (order_id, _items, _address) = order_inputs();
        let payment_id = PaymentId::new("PAY-1");

        let first = activities
            .charge_payment(&order_id, &payment_id, 3)
            .await
            .unwrap();
        assert_eq!(first, ChargeResult::Charged { amount: 3 });

        // A duplicate attempt hits the existing row
        let second = activities
            .charge_payment(&order_id, &payment_id, 3)
            .await
            .unwrap();
        assert_eq!(second, ChargeResult::Charged { amount: 3 });
        assert_eq!(ledger.payment_count(), 1);
    }

    #[tokio::test]
    async fn declined_charge_is_a_value_not_an_error() {
        let (activities, ledger) = activities();
        let (order_id, _items, _address) = order_inputs();
        let payment_id = PaymentId::new("PAY-1");

        activities.set_decline_charge(true);
        let outcome = activities
            .charge_payment(&order_id, &payment_id, 3)
            .await
            .unwrap();

        assert!(matches!(outcome, ChargeResult::Declined { .. }));
        assert_eq!(
            ledger.payment(&payment_id).unwrap().status,
            PaymentStatus::Failed
        );
    }
}
