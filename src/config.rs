// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the bulk engine.
//!
//! # Example
//!
//! ```
//! use bulk_engine::BulkEngineConfig;
//!
//! // Minimal config (uses defaults)
//! let config = BulkEngineConfig::default();
//! assert_eq!(config.concurrency, 5);
//! assert_eq!(config.max_attempts, 3);
//!
//! // Tuned config
//! let config = BulkEngineConfig {
//!     concurrency: 10,
//!     window_pause_ms: 500,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::resilience::retry::RetryConfig;

/// Rejected configuration. Raised before any batch starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("attachment_concurrency must be at least 1")]
    ZeroAttachmentConcurrency,
}

/// Configuration for the bulk engine.
///
/// All fields have defaults matching the rate limits of a hosted CMS write API.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkEngineConfig {
    /// Records processed concurrently per window (default: 5)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Attempts per record before it is recorded as failed (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Base delay for linear backoff; attempt `n+1` waits `n * base` (default: 1000 ms)
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Pause between windows (default: 200 ms)
    #[serde(default = "default_window_pause_ms")]
    pub window_pause_ms: u64,

    /// Attachment uploads in flight per record (default: 2)
    #[serde(default = "default_attachment_concurrency")]
    pub attachment_concurrency: usize,

    /// Validation limits
    #[serde(default = "default_max_eco_tags")]
    pub max_eco_tags: usize,
    #[serde(default = "default_max_attachments")]
    pub max_attachments: usize,
}

fn default_concurrency() -> usize { 5 }
fn default_max_attempts() -> usize { 3 }
fn default_retry_base_delay_ms() -> u64 { 1000 }
fn default_window_pause_ms() -> u64 { 200 }
fn default_attachment_concurrency() -> usize { 2 }
fn default_max_eco_tags() -> usize { 10 }
fn default_max_attachments() -> usize { 20 }

impl Default for BulkEngineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            window_pause_ms: default_window_pause_ms(),
            attachment_concurrency: default_attachment_concurrency(),
            max_eco_tags: default_max_eco_tags(),
            max_attachments: default_max_attachments(),
        }
    }
}

impl BulkEngineConfig {
    /// Check the config for values that would make a batch meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.attachment_concurrency == 0 {
            return Err(ConfigError::ZeroAttachmentConcurrency);
        }
        Ok(())
    }

    #[must_use]
    pub fn window_pause(&self) -> Duration {
        Duration::from_millis(self.window_pause_ms)
    }

    /// Retry policy for a single record's remote call.
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}
