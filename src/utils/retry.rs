//! Bounded retries with a fixed delay for calls to the remote endpoint
//!
//! The delay is slept before *every* attempt, the first included, so a burst
//! of firings never hits the endpoint back to back. A non-empty result ends
//! the loop early; an empty one simply uses up the attempt.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::errors::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::config::defaults::DEFAULT_RETRY_MAX_ATTEMPTS,
            delay: crate::config::defaults::DEFAULT_RETRY_DELAY,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.delay,
        }
    }
}

/// Errors that may go away if the same call is made again
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for QueryError {
    fn is_transient(&self) -> bool {
        QueryError::is_transient(self)
    }
}

/// Results that count as "nothing found yet"
pub trait Outcome: Default {
    fn is_empty_outcome(&self) -> bool;
}

impl<T> Outcome for Vec<T> {
    fn is_empty_outcome(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Outcome for Option<T> {
    fn is_empty_outcome(&self) -> bool {
        self.is_none()
    }
}

/// Run `operation` under `policy`.
///
/// Transient errors are remembered and retried; any other error is returned
/// immediately. Once the attempts are exhausted a remembered transient error
/// wins over an empty result.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
    operation_name: &str,
) -> Result<T, E>
where
    T: Outcome,
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error: Option<E> = None;
    let mut last_result: Option<T> = None;

    for attempt in 1..=policy.max_attempts {
        sleep(policy.delay).await;

        match operation().await {
            Ok(result) if !result.is_empty_outcome() => {
                if attempt > 1 {
                    debug!(
                        "'{}' produced a result on attempt {}/{}",
                        operation_name, attempt, policy.max_attempts
                    );
                }
                return Ok(result);
            }
            Ok(result) => {
                debug!(
                    "'{}' came back empty on attempt {}/{}",
                    operation_name, attempt, policy.max_attempts
                );
                last_result = Some(result);
            }
            Err(err) if err.is_transient() => {
                warn!(
                    "'{}' failed on attempt {}/{}: {}",
                    operation_name, attempt, policy.max_attempts, err
                );
                last_error = Some(err);
            }
            Err(err) => {
                debug!(
                    "'{}' failed with non-retryable error: {}",
                    operation_name, err
                );
                return Err(err);
            }
        }
    }

    match last_error {
        Some(err) => {
            warn!(
                "'{}' gave up after {} attempts: {}",
                operation_name, policy.max_attempts, err
            );
            Err(err)
        }
        None => Ok(last_result.unwrap_or_default()),
    }
}
