//! Activity contracts and in-memory implementations.
//!
//! Activities are the only place the system touches external storage or
//! external services, and the only place nondeterminism (latency, flaky
//! transports) is allowed. Every write they perform is idempotent by
//! natural key, because a retried attempt may re-execute it.

pub mod ledger;
pub mod order;
pub mod shipping;

pub use ledger::{AuditEvent, OrderLedger, PaymentRecord, PaymentStatus, StoredOrder};
pub use order::{ChargeResult, InMemoryOrderActivities, OrderActivities, Validation};
pub use shipping::{DispatchResult, InMemoryShippingActivities, ShippingActivities};
