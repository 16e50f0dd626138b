//! Database retry utilities for handling transient failures.
//!
//! Exponential backoff with jitter over `StoreError`-returning operations,
//! used by the `repositories::retry_wrapper` decorator around the
//! `sea-orm`-backed `GazetteerStore`/`InputStore` adapters.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::{StoreError, StoreResult};

/// Configuration for database retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn for_reads() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 1.5,
            jitter: true,
        }
    }

    pub fn for_writes() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(3),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    pub fn for_critical() -> Self {
        Self {
            max_attempts: 7,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

/// Execute a store operation with retry logic. `SentinelConflict` is treated
/// as a non-retryable success path by callers (the store already returns the
/// existing row), so it never reaches this function as an error in practice.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, mut operation: F, operation_name: &str) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = StoreResult<T>>,
{
    let mut last_error = None;

    for attempt in 1..=config.max_attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("store operation '{}' succeeded on attempt {}/{}", operation_name, attempt, config.max_attempts);
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_retryable_error(&err) {
                    debug!("store operation '{}' failed with non-retryable error: {}", operation_name, err);
                    return Err(err);
                }

                last_error = Some(err);

                if attempt < config.max_attempts {
                    let delay = calculate_delay(config, attempt);
                    warn!(
                        "store operation '{}' failed on attempt {}/{}, retrying in {:?}: {}",
                        operation_name,
                        attempt,
                        config.max_attempts,
                        delay,
                        last_error.as_ref().unwrap()
                    );
                    sleep(delay).await;
                } else {
                    warn!(
                        "store operation '{}' failed after {} attempts: {}",
                        operation_name,
                        config.max_attempts,
                        last_error.as_ref().unwrap()
                    );
                }
            }
        }
    }

    Err(last_error.unwrap())
}

fn is_retryable_error(error: &StoreError) -> bool {
    match error {
        StoreError::ConnectionFailed(_) => true,
        StoreError::QueryFailed(message) => {
            let msg = message.to_lowercase();
            msg.contains("locked") || msg.contains("busy") || msg.contains("timeout") || msg.contains("connection reset")
        }
        StoreError::NotFound(_) | StoreError::SentinelConflict(_) => false,
    }
}

fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponential_delay = config.initial_delay.as_millis() as f64 * config.backoff_multiplier.powi((attempt - 1) as i32);
    let delay_ms = exponential_delay.min(config.max_delay.as_millis() as f64) as u64;

    let final_delay = if config.jitter {
        let jitter_range = (delay_ms / 4).max(10);
        let jitter = fastrand::u64(0..=jitter_range);
        delay_ms + jitter
    } else {
        delay_ms
    };

    Duration::from_millis(final_delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_on_first_try() {
        let config = RetryConfig::default();
        let result = with_retry(&config, || async { Ok::<_, StoreError>(42) }, "test-op").await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn retries_transient_failures_then_succeeds() {
        let config = RetryConfig { max_attempts: 3, initial_delay: Duration::from_millis(1), max_delay: Duration::from_millis(5), backoff_multiplier: 1.0, jitter: false };
        let attempts = AtomicU32::new(0);
        let result = with_retry(
            &config,
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(StoreError::QueryFailed("database is locked".to_string()))
                    } else {
                        Ok(7)
                    }
                }
            },
            "test-op",
        )
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let config = RetryConfig::default();
        let attempts = AtomicU32::new(0);
        let result = with_retry(
            &config,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<i32, _>(StoreError::NotFound("K1".to_string())) }
            },
            "test-op",
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
