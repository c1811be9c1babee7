//! Domain layer for the order orchestration system.
//!
//! This crate holds the pure, deterministic half of the system:
//! - `StateMachine` and `DomainEvent` traits for event-sourced folds
//! - the order lifecycle state machine (`OrderRecord`, `OrderStep`,
//!   `OrderEvent`, `Signal`)
//! - the shipping child state machine (`ShipmentRecord`, `ShipmentStep`,
//!   `ShippingEvent`, `ShippingOutcome`)
//!
//! Nothing here performs IO, reads clocks for decisions, or retries
//! anything; transitions are derived entirely from the ordered event
//! history, so a record rebuilt from the store always matches the live
//! instance.

pub mod machine;
pub mod order;
pub mod shipping;

pub use machine::{DomainEvent, StateMachine};
pub use order::{
    Address, CancelSource, OrderEvent, OrderItem, OrderRecord, OrderStep, Signal, StatusSnapshot,
    charge_amount,
};
pub use shipping::{ShipmentRecord, ShipmentStep, ShippingEvent, ShippingOutcome};
