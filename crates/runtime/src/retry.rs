//! Activity retry policy and execution.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep, timeout};

use crate::lane::DispatchLane;

/// Failure of a single activity attempt.
#[derive(Debug, Clone, Error)]
pub enum ActivityError {
    /// Infrastructure trouble; the attempt may be retried.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Business rejection; retrying cannot change the outcome.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl ActivityError {
    /// Creates a transient (retryable) error.
    pub fn transient(message: impl Into<String>) -> Self {
        ActivityError::Transient(message.into())
    }

    /// Creates a business rejection (non-retryable).
    pub fn rejected(message: impl Into<String>) -> Self {
        ActivityError::Rejected(message.into())
    }

    /// Returns true if another attempt is allowed for this error kind.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActivityError::Transient(_))
    }
}

/// Terminal failure of an activity invocation.
///
/// Produced once the retry policy gives up; the owning state machine must
/// route it to an explicit failure transition.
#[derive(Debug, Clone, Error)]
pub enum ActivityFailure {
    /// Every allowed attempt failed.
    #[error("activity '{activity}' exhausted {attempts} attempts: {last_error}")]
    Exhausted {
        activity: String,
        attempts: u32,
        last_error: String,
    },

    /// The total timeout elapsed before a successful attempt.
    #[error("activity '{activity}' exceeded its total timeout after {attempts} attempts: {last_error}")]
    DeadlineExceeded {
        activity: String,
        attempts: u32,
        last_error: String,
    },

    /// A non-retryable error kind occurred; no further attempts were made.
    #[error("activity '{activity}' rejected: {reason}")]
    NonRetryable { activity: String, reason: String },
}

impl ActivityFailure {
    /// Returns the name of the failed activity.
    pub fn activity(&self) -> &str {
        match self {
            ActivityFailure::Exhausted { activity, .. }
            | ActivityFailure::DeadlineExceeded { activity, .. }
            | ActivityFailure::NonRetryable { activity, .. } => activity,
        }
    }
}

/// Retry policy surface for one activity invocation.
///
/// The policy fixes the declared bounds (attempt cap, per-attempt and
/// total timeouts) and the backoff parameters; scheduling between
/// attempts belongs to the hosting runtime.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Backoff delay before the second attempt.
    pub initial_interval: Duration,
    /// Upper bound on the backoff delay.
    pub maximum_interval: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_coefficient: f64,
    /// Hard cap on attempts, independent of timeouts.
    pub max_attempts: u32,
    /// Upper bound on a single attempt before it is considered stuck.
    pub per_attempt_timeout: Duration,
    /// Upper bound across all attempts before giving up.
    pub total_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(200),
            maximum_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            max_attempts: 3,
            per_attempt_timeout: Duration::from_secs(1),
            total_timeout: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Sets the attempt cap.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_per_attempt_timeout(mut self, per_attempt_timeout: Duration) -> Self {
        self.per_attempt_timeout = per_attempt_timeout;
        self
    }

    /// Sets the total timeout.
    pub fn with_total_timeout(mut self, total_timeout: Duration) -> Self {
        self.total_timeout = total_timeout;
        self
    }

    /// Returns the backoff delay after the given (1-based) failed attempt.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_coefficient.powi(attempt.saturating_sub(1) as i32);
        let delay = self.initial_interval.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.maximum_interval.as_secs_f64()))
    }
}

/// Runs one activity under a lane and a retry policy.
///
/// Each attempt waits for a lane permit, runs under the per-attempt
/// timeout, and releases the permit before backing off. A
/// [`ActivityError::Rejected`] outcome stops retrying immediately; the
/// attempt cap and the total timeout each independently terminate the
/// invocation.
pub async fn execute<T, F, Fut>(
    lane: &DispatchLane,
    policy: &RetryPolicy,
    activity: &str,
    mut attempt_fn: F,
) -> Result<T, ActivityFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ActivityError>>,
{
    let deadline = Instant::now() + policy.total_timeout;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let permit = lane.acquire().await;
        let outcome = timeout(policy.per_attempt_timeout, attempt_fn()).await;
        drop(permit);

        let last_error = match outcome {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    tracing::info!(activity, attempt, lane = lane.name(), "activity recovered");
                }
                return Ok(value);
            }
            Ok(Err(error)) if !error.is_retryable() => {
                tracing::warn!(activity, attempt, %error, "activity rejected");
                return Err(ActivityFailure::NonRetryable {
                    activity: activity.to_string(),
                    reason: error.to_string(),
                });
            }
            Ok(Err(error)) => error.to_string(),
            Err(_) => format!(
                "attempt exceeded per-attempt timeout of {:?}",
                policy.per_attempt_timeout
            ),
        };

        tracing::warn!(
            activity,
            attempt,
            lane = lane.name(),
            error = %last_error,
            "activity attempt failed"
        );

        if attempt >= policy.max_attempts {
            return Err(ActivityFailure::Exhausted {
                activity: activity.to_string(),
                attempts: attempt,
                last_error,
            });
        }

        let delay = policy.backoff_delay(attempt);
        if Instant::now() + delay >= deadline {
            return Err(ActivityFailure::DeadlineExceeded {
                activity: activity.to_string(),
                attempts: attempt,
                last_error,
            });
        }

        metrics::counter!("activity_retries_total").increment(1);
        sleep(delay).await;
    }
}
