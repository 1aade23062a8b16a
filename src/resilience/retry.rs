// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Retry logic with linear backoff.
//!
//! Every error returned by the wrapped operation is treated as retryable
//! until the attempt cap is reached. The last error is returned unchanged.
//!
//! # Example
//!
//! ```
//! use bulk_engine::RetryConfig;
//! use std::time::Duration;
//!
//! let config = RetryConfig::standard();
//! assert_eq!(config.max_attempts, 3);
//!
//! // Attempt 2 waits 1x base, attempt 3 waits 2x base
//! assert_eq!(config.delay_after(1), Duration::from_secs(1));
//! assert_eq!(config.delay_after(2), Duration::from_secs(2));
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for per-record retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: usize,
    /// Delay unit; the wait after failed attempt `n` is `n * base_delay`
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl RetryConfig {
    /// 3 attempts, waiting 1s then 2s.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }

    /// Fast retry for tests (minimal delays)
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    /// Wait inserted after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: usize) -> Duration {
        self.base_delay.saturating_mul(attempt as u32)
    }
}

/// Run `operation` until it succeeds or `config.max_attempts` is exhausted.
///
/// `operation_name` only feeds logs.
pub async fn retry<F, Fut, T, E>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(val) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "Operation succeeded after retry");
                }
                return Ok(val);
            }
            Err(err) => {
                if attempt >= max_attempts {
                    warn!(
                        operation = operation_name,
                        attempts = attempt,
                        error = %err,
                        "Operation failed, attempts exhausted"
                    );
                    return Err(err);
                }

                let delay = config.delay_after(attempt);
                warn!(
                    "Attempt {}/{} failed for '{}': {}. Retrying in {:?}...",
                    attempt, max_attempts, operation_name, err, delay
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
