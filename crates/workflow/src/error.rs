//! Workflow error types.

use common::OrderId;
use event_store::EventStoreError;
use thiserror::Error;

/// Errors surfaced by the coordinator's public operations.
///
/// Activity failures never appear here: they are routed to explicit
/// terminal transitions inside the workflow instead of propagating to
/// callers.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The start request failed validation.
    #[error("invalid start request: {0}")]
    InvalidStart(String),

    /// An order with this ID has already run to completion.
    #[error("order {0} already has a recorded history")]
    DuplicateOrder(OrderId),

    /// Event store error.
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for workflow results.
pub type Result<T> = std::result::Result<T, WorkflowError>;
