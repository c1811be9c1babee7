//! Hosting-substrate surface for the order orchestration system.
//!
//! This crate fixes the two contracts the workflows are written against
//! without reimplementing a durable-execution engine:
//!
//! - [`DispatchLane`]: a named, capacity-bounded permit pool. The order
//!   and shipping state machines dispatch their activities on separate
//!   lanes, so a slow carrier cannot starve order-level scheduling.
//! - [`RetryPolicy`] and [`execute`]: the per-activity retry contract —
//!   per-attempt timeout, total timeout, attempt cap, capped exponential
//!   backoff, and a non-retryable short-circuit for business rejections.
//!
//! Every terminal failure surfaces as an [`ActivityFailure`] value the
//! owning state machine must route to an explicit transition; nothing in
//! here panics a workflow.

pub mod lane;
pub mod retry;

pub use lane::DispatchLane;
pub use retry::{ActivityError, ActivityFailure, RetryPolicy, execute};
