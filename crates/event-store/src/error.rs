use thiserror::Error;

use crate::{InstanceId, Version};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// A concurrency conflict occurred when appending events.
    /// The expected version did not match the actual version.
    #[error(
        "Concurrency conflict for instance {instance_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        instance_id: InstanceId,
        expected: Version,
        actual: Version,
    },

    /// The events handed to `append` do not form a valid batch.
    #[error("Append validation error: {0}")]
    Validation(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
