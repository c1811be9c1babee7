//! Core state machine and domain event traits.

use common::InstanceId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// This is used for serialization and event store filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for event-sourced state machines.
///
/// A state machine instance is rebuilt by replaying its events in stream
/// order. `apply` must be pure and deterministic:
/// - given the same state and event it always produces the same new state
/// - it has no side effects
/// - it does not fail (events are facts that have already happened)
pub trait StateMachine: Default + Send + Sync + Sized {
    /// The type of events this machine produces and consumes.
    type Event: DomainEvent;

    /// Returns the instance type name.
    ///
    /// Used for event store organization.
    fn instance_type() -> &'static str;

    /// Returns the instance's identity.
    ///
    /// Returns None for a new, uninitialized instance.
    fn id(&self) -> Option<&InstanceId>;

    /// Returns the current version of the instance stream.
    fn version(&self) -> Version;

    /// Sets the instance version.
    ///
    /// Called after folding events loaded from the store.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the instance, updating its state.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}
