//! # Contention Retry
//!
//! Bounded retry with exponential backoff for optimistic writes.
//!
//! ```text
//! attempt 1 ──► contended ──► sleep ~10ms
//! attempt 2 ──► contended ──► sleep ~20ms
//! attempt 3 ──► contended ──► sleep ~40ms
//! attempt 4 ──► contended ──► sleep ~80ms
//! attempt 5 ──► contended ──► ConcurrentModification { attempts: 5 }
//! ```
//!
//! Delays come from [`ExponentialBackoff`] with jitter, so writers that
//! collided once do not collide again on the same schedule.
//!
//! Only contention is retried: a lost compare-and-swap or SQLITE_BUSY.
//! Every other error returns on the first attempt.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tracing::{info, warn};

use super::error::{InventoryError, InventoryResult};
use mercato_core::CoreError;

/// Retry budget for contended stock writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first. At least 1.
    pub max_attempts: u32,
    /// Delay after the first contended attempt.
    pub initial_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Jitter as a fraction of each delay (0.0 = none).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
            multiplier: 2.0,
            jitter: 0.5,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
            multiplier: 2.0,
            jitter: 0.5,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Fresh backoff schedule for one operation. Never expires on its own:
    /// `max_attempts` bounds the loop.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_delay,
            initial_interval: self.initial_delay,
            max_interval: self.max_delay,
            multiplier: self.multiplier,
            randomization_factor: self.jitter,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

/// Outcome of one optimistic attempt.
pub(crate) enum Attempt<T> {
    Done(T),
    /// Another writer changed the row between our read and our write.
    Contended,
}

/// Runs `attempt` until it completes, fails with a non-contention error, or
/// the policy is exhausted.
pub(crate) async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    entity: &str,
    id: &str,
    mut attempt: F,
) -> InventoryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = InventoryResult<Attempt<T>>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = policy.backoff();

    for n in 0..max_attempts {
        let reason = match attempt().await {
            Ok(Attempt::Done(value)) => {
                if n > 0 {
                    info!(operation = %operation, attempt = n + 1, "Write succeeded after retry");
                }
                return Ok(value);
            }
            Ok(Attempt::Contended) => "version changed".to_string(),
            Err(InventoryError::Db(err)) if err.is_busy() => err.to_string(),
            Err(err) => return Err(err),
        };

        if n + 1 < max_attempts {
            let delay = backoff.next_backoff().unwrap_or(policy.max_delay);
            warn!(
                operation = %operation,
                entity = %entity,
                id = %id,
                attempt = n + 1,
                max_attempts,
                reason = %reason,
                delay_ms = delay.as_millis() as u64,
                "Write contended, retrying"
            );
            tokio::time::sleep(delay).await;
        } else {
            warn!(
                operation = %operation,
                entity = %entity,
                id = %id,
                attempts = max_attempts,
                reason = %reason,
                "Write contended, giving up"
            );
        }
    }

    Err(CoreError::ConcurrentModification {
        entity: entity.to_string(),
        id: id.to_string(),
        attempts: max_attempts,
    }
    .into())
}
