//! Capacity-bounded dispatch lanes.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A named, capacity-bounded dispatch lane.
///
/// An activity attempt holds one permit for its duration, so at most
/// `capacity` attempts run concurrently per lane. Order-level and
/// shipping-level work run on two independent lanes; exhausting one has
/// no effect on the other.
#[derive(Debug, Clone)]
pub struct DispatchLane {
    name: &'static str,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl DispatchLane {
    /// Creates a lane with the given worker capacity.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free worker slot on this lane.
    ///
    /// The returned permit is released when dropped, at the end of the
    /// attempt.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .expect("lane semaphore is never closed")
    }

    /// Returns the lane name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the lane capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of currently free worker slots.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
