// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for bulk-engine.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `bulk_engine_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: create, update, delete
//! - `status`: success, failure, invalid, cancelled

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record a batch start and its size
pub fn record_batch_started(operation: &str, total: usize) {
    counter!(
        "bulk_engine_batches_total",
        "operation" => operation.to_string()
    )
    .increment(1);
    histogram!(
        "bulk_engine_batch_records",
        "operation" => operation.to_string()
    )
    .record(total as f64);
}

/// Record a finished batch duration
pub fn record_batch_duration(operation: &str, duration: Duration) {
    histogram!(
        "bulk_engine_batch_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a record's terminal outcome
pub fn record_outcome(operation: &str, status: &str) {
    counter!(
        "bulk_engine_records_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record one remote attempt (first try or retry)
pub fn record_attempt(operation: &str) {
    counter!(
        "bulk_engine_attempts_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record per-record latency, retries included
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "bulk_engine_record_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record the size of a launched window
pub fn record_window(operation: &str, size: usize) {
    histogram!(
        "bulk_engine_window_size",
        "operation" => operation.to_string()
    )
    .record(size as f64);
}

/// Set records currently in flight
pub fn set_in_flight(operation: &str, count: usize) {
    gauge!(
        "bulk_engine_in_flight",
        "operation" => operation.to_string()
    )
    .set(count as f64);
}

/// Record a progress observer that panicked
pub fn record_observer_panic() {
    counter!("bulk_engine_observer_panics_total").increment(1);
}

/// Record attachment upload results
pub fn record_attachments(succeeded: usize, failed: usize) {
    counter!("bulk_engine_attachments_total", "status" => "success").increment(succeeded as u64);
    counter!("bulk_engine_attachments_total", "status" => "failure").increment(failed as u64);
}

/// RAII timer that records per-record latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}
