// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bounded retry with fixed backoff
//!
//! Used to (re)acquire bus connections on both sides of the event bridge.
//! The attempt count is bounded: once exhausted the caller gets the last
//! error and decides whether to log and drop (publisher) or back off and
//! start over (consumer).
//!
//! # Example
//!
//! ```rust
//! use course_enrollment::retry::{retry_with_backoff, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::new(5, Duration::from_millis(10));
//! let value = retry_with_backoff(&policy, "connect", || async { Ok::<_, String>(42) }).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Retry policy: `max_attempts` tries separated by a fixed `backoff`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1)
    pub max_attempts: usize,
    /// Pause between consecutive attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, no waiting
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Retry `operation` according to `policy`
///
/// Returns the first success, or the error of the final attempt.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = operation_name, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt >= max_attempts => {
                error!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Operation failed after {} attempt(s)",
                    max_attempts
                );
                return Err(err);
            }
            Err(err) => {
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    backoff_ms = policy.backoff.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying"
                );
                sleep(policy.backoff).await;
                attempt += 1;
            }
        }
    }
}
