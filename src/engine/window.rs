// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Windowed executor.
//!
//! Records run in windows of `concurrency`. Every record in a window is
//! launched together and the window is drained completely before the next
//! one starts, so at most `concurrency` remote calls are ever in flight.
//!
//! ```text
//!   window 0: [r0 r1 r2] ──barrier── pause ── window 1: [r3 r4 r5] ──barrier── ...
//! ```
//!
//! A record failure (or panic) is captured as that record's outcome and
//! never touches its siblings.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::aggregator::ResultAggregator;
use super::progress::{notify, ProgressCallback};
use super::types::{BatchFailure, BatchKind, OperationOutcome};
use crate::metrics::{self, LatencyTimer};
use crate::store::StoreError;

pub(crate) const CANCELLED_ERROR: &str = "Batch cancelled before record started";
pub(crate) const PANICKED_ERROR: &str = "Operation panicked";

/// A validated record waiting for execution.
pub(crate) struct PendingRecord<T> {
    /// Position in the caller's input
    pub index: usize,
    pub input: T,
    /// Input as reported in a failure entry
    pub snapshot: Value,
}

pub(crate) struct WindowRunner<'a> {
    pub kind: BatchKind,
    pub concurrency: usize,
    pub pause: Duration,
    /// Input length, as reported to the observer
    pub total: usize,
    pub on_progress: Option<&'a ProgressCallback>,
    pub cancel: Option<&'a watch::Receiver<bool>>,
}

fn failed<R>(data: Value, error: String, index: usize) -> OperationOutcome<R> {
    OperationOutcome::Failed(BatchFailure { data, error, index })
}

impl WindowRunner<'_> {
    fn is_cancelled(&self) -> bool {
        self.cancel.map_or(false, |rx| *rx.borrow())
    }

    /// Drive `task` over every record, appending outcomes to `aggregator`.
    ///
    /// `task` resolves to the stored id and result data of a record.
    pub async fn run<T, R, F, Fut>(
        &self,
        records: Vec<PendingRecord<T>>,
        aggregator: &ResultAggregator<R>,
        task: F,
    ) where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<(String, R), StoreError>>,
    {
        let operation = self.kind.as_str();
        let window_count = records.len().div_ceil(self.concurrency.max(1));
        let mut remaining = records.into_iter().peekable();
        let mut started = 0;
        let mut window_no = 0;

        while remaining.peek().is_some() {
            if self.is_cancelled() {
                let skipped: Vec<_> = remaining.by_ref().collect();
                info!(
                    operation,
                    skipped = skipped.len(),
                    window = window_no,
                    "Batch cancelled, skipping remaining windows"
                );
                for record in skipped {
                    metrics::record_outcome(operation, "cancelled");
                    aggregator.record(failed(record.snapshot, CANCELLED_ERROR.to_string(), record.index));
                }
                break;
            }

            let window: Vec<_> = remaining.by_ref().take(self.concurrency.max(1)).collect();
            debug!(operation, window = window_no, of = window_count, size = window.len(), "Launching window");
            metrics::record_window(operation, window.len());
            metrics::set_in_flight(operation, window.len());

            let launched: Vec<_> = window
                .into_iter()
                .map(|record| {
                    notify(self.on_progress, started, self.total, self.kind.stage());
                    started += 1;

                    let PendingRecord { index, input, snapshot } = record;
                    let call = task(input);
                    async move {
                        let _timer = LatencyTimer::new(operation);
                        let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                            Ok(Ok((id, data))) => OperationOutcome::Succeeded { id, data },
                            Ok(Err(e)) => failed(snapshot, e.to_string(), index),
                            Err(_) => failed(snapshot, PANICKED_ERROR.to_string(), index),
                        };
                        if let OperationOutcome::Failed(ref failure) = outcome {
                            error!(operation, index, error = %failure.error, "Record failed");
                        }
                        metrics::record_outcome(operation, if outcome.is_success() { "success" } else { "failure" });
                        aggregator.record(outcome);
                    }
                })
                .collect();

            // Barrier: the whole window drains before the next starts
            join_all(launched).await;
            metrics::set_in_flight(operation, 0);
            window_no += 1;

            // No pause once cancelled; the skip happens on the next pass
            if remaining.peek().is_some() && !self.pause.is_zero() && !self.is_cancelled() {
                sleep(self.pause).await;
            }
        }
    }
}
