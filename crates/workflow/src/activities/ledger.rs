//! In-memory stand-in for the external persistence collaborator.
//!
//! Mirrors the schema the activities write to: an order snapshot table
//! keyed by order ID, a payment ledger keyed by payment ID, and an
//! append-only audit event log. All writes are idempotent upserts by
//! natural key.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId};
use domain::Address;
use serde::{Deserialize, Serialize};

/// Row in the order snapshot table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredOrder {
    pub order_id: OrderId,
    pub state: String,
    pub address: Address,
    pub updated_at: DateTime<Utc>,
}

/// Status of a payment in the ledger.
///
/// A payment row is written at most once; re-executed attempts hit the
/// existing row. A missing row is an uncharged (pending) payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Charged,
    Failed,
}

/// Row in the payment ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub amount: u64,
    pub status: PaymentStatus,
}

/// Append-only audit fact emitted by an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub order_id: OrderId,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LedgerState {
    orders: HashMap<OrderId, StoredOrder>,
    payments: HashMap<PaymentId, PaymentRecord>,
    audit: Vec<AuditEvent>,
}

/// Shared in-memory ledger behind the activity implementations.
#[derive(Debug, Clone, Default)]
pub struct OrderLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl OrderLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the order snapshot row.
    pub fn upsert_order(&self, order_id: &OrderId, address: &Address, state: &str) {
        let mut ledger = self.state.write().unwrap();
        ledger.orders.insert(
            order_id.clone(),
            StoredOrder {
                order_id: order_id.clone(),
                state: state.to_string(),
                address: address.clone(),
                updated_at: Utc::now(),
            },
        );
    }

    /// Updates the state column of an existing order row, if present.
    pub fn mark_order_state(&self, order_id: &OrderId, state: &str) {
        let mut ledger = self.state.write().unwrap();
        if let Some(row) = ledger.orders.get_mut(order_id) {
            row.state = state.to_string();
            row.updated_at = Utc::now();
        }
    }

    /// Inserts a payment row unless one already exists for this payment ID,
    /// then returns the stored row.
    ///
    /// This is the `ON CONFLICT DO NOTHING` upsert that makes the charge
    /// activity safe across retries.
    pub fn insert_payment_if_absent(&self, payment: PaymentRecord) -> PaymentRecord {
        let mut ledger = self.state.write().unwrap();
        ledger
            .payments
            .entry(payment.payment_id.clone())
            .or_insert(payment)
            .clone()
    }

    /// Appends an audit event.
    pub fn append_audit(&self, order_id: &OrderId, event_type: &str, payload: serde_json::Value) {
        let mut ledger = self.state.write().unwrap();
        ledger.audit.push(AuditEvent {
            order_id: order_id.clone(),
            event_type: event_type.to_string(),
            payload,
            timestamp: Utc::now(),
        });
    }

    /// Returns the stored order row, if any.
    pub fn order(&self, order_id: &OrderId) -> Option<StoredOrder> {
        self.state.read().unwrap().orders.get(order_id).cloned()
    }

    /// Returns the payment row, if any.
    pub fn payment(&self, payment_id: &PaymentId) -> Option<PaymentRecord> {
        self.state.read().unwrap().payments.get(payment_id).cloned()
    }

    /// Returns the number of payment rows.
    pub fn payment_count(&self) -> usize {
        self.state.read().unwrap().payments.len()
    }

    /// Returns the audit trail of one order, in timestamp order.
    pub fn audit_for(&self, order_id: &OrderId) -> Vec<AuditEvent> {
        let ledger = self.state.read().unwrap();
        let mut events: Vec<_> = ledger
            .audit
            .iter()
            .filter(|e| &e.order_id == order_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        events
    }

    /// Returns the audit event types of one order, in append order.
    pub fn audit_types_for(&self, order_id: &OrderId) -> Vec<String> {
        self.audit_for(order_id)
            .into_iter()
            .map(|e| e.event_type)
            .collect()
    }
}
