//! Shared identifier types for the order orchestration system.

pub mod types;

pub use types::{InstanceId, OrderId, PaymentId};
