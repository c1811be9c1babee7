//! Event history for workflow instances.
//!
//! Every workflow instance (an order, or its shipping child) owns an
//! append-only stream of events keyed by its [`InstanceId`]. The stream is
//! the authoritative record of the instance: folding it back through the
//! instance's state machine reconstructs the exact state the live process
//! holds, which is what makes the lifecycle replayable across restarts.

pub mod error;
pub mod event;
pub mod memory;
pub mod store;

pub use common::InstanceId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use store::{AppendOptions, EventStore, EventStoreExt};
