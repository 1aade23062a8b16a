// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Concurrent-safe outcome collector.
//!
//! Outcomes are appended from the record tasks of a window as they land.
//! [`ResultAggregator::finish`] consumes the collector, so a returned
//! [`BatchResult`] can never be mutated by the engine again.

use std::time::Instant;

use parking_lot::Mutex;

use super::types::{BatchFailure, BatchKind, BatchResult, BatchSuccess, OperationOutcome};

struct Collected<T> {
    successes: Vec<BatchSuccess<T>>,
    failures: Vec<BatchFailure>,
}

pub struct ResultAggregator<T> {
    total: usize,
    started: Instant,
    collected: Mutex<Collected<T>>,
}

impl<T> ResultAggregator<T> {
    /// Start the clock for a batch of `total` input records.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            started: Instant::now(),
            collected: Mutex::new(Collected {
                successes: Vec::new(),
                failures: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Records with a terminal outcome so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        let collected = self.collected.lock();
        collected.successes.len() + collected.failures.len()
    }

    pub fn record(&self, outcome: OperationOutcome<T>) {
        match outcome {
            OperationOutcome::Succeeded { id, data } => self.record_success(id, data),
            OperationOutcome::Failed(failure) => self.record_failure(failure),
        }
    }

    pub fn record_success(&self, id: String, data: T) {
        self.collected.lock().successes.push(BatchSuccess { id, data });
    }

    pub fn record_failure(&self, failure: BatchFailure) {
        self.collected.lock().failures.push(failure);
    }

    /// Freeze into the final report for an executed batch.
    #[must_use]
    pub fn finish(self, kind: BatchKind) -> BatchResult<T> {
        let verb = kind.summary_verb();
        self.finish_with(|total, secs, ok, failed| {
            format!("{verb} {total} listings in {secs:.2}s: {ok} successful, {failed} failed")
        })
    }

    /// Freeze into the report for a validate-only run.
    #[must_use]
    pub fn finish_validation(self) -> BatchResult<T> {
        self.finish_with(|_, _, valid, invalid| {
            format!("Validation complete: {valid} valid, {invalid} invalid")
        })
    }

    fn finish_with(self, summary: impl FnOnce(usize, f64, usize, usize) -> String) -> BatchResult<T> {
        let duration = self.started.elapsed();
        let Collected { successes, failures } = self.collected.into_inner();
        let success_count = successes.len();
        let failure_count = failures.len();
        debug_assert_eq!(
            success_count + failure_count,
            self.total,
            "every input record needs exactly one outcome"
        );

        BatchResult {
            summary: summary(self.total, duration.as_secs_f64(), success_count, failure_count),
            successes,
            failures,
            total: self.total,
            success_count,
            failure_count,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn failure(index: usize) -> BatchFailure {
        BatchFailure { data: json!(index), error: format!("failed {index}"), index }
    }

    #[test]
    fn test_counts_and_summary() {
        let agg = ResultAggregator::new(3);
        agg.record_success("a".into(), 1);
        agg.record(OperationOutcome::Failed(failure(1)));
        agg.record(OperationOutcome::Succeeded { id: "c".into(), data: 3 });
        assert_eq!(agg.completed(), 3);

        let result = agg.finish(BatchKind::Create);
        assert_eq!(result.total, 3);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 1);
        assert_eq!(result.successes.len(), 2);
        assert_eq!(result.failures[0].index, 1);
        assert!(result.summary.starts_with("Processed 3 listings in "));
        assert!(result.summary.ends_with("s: 2 successful, 1 failed"));
    }

    #[test]
    fn test_empty_batch() {
        let agg: ResultAggregator<String> = ResultAggregator::new(0);
        let result = agg.finish(BatchKind::Delete);
        assert_eq!(result.total, 0);
        assert_eq!(result.success_count, 0);
        assert_eq!(result.failure_count, 0);
        assert_eq!(result.summary, "Deleted 0 listings in 0.00s: 0 successful, 0 failed");
    }

    #[test]
    fn test_validation_summary() {
        let agg = ResultAggregator::new(2);
        agg.record_success("temp-0".into(), ());
        agg.record_failure(failure(1));
        let result = agg.finish_validation();
        assert_eq!(result.summary, "Validation complete: 1 valid, 1 invalid");
    }

    #[test]
    fn test_concurrent_append() {
        let agg = Arc::new(ResultAggregator::new(200));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let agg = agg.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let index = t * 25 + i;
                        if index % 2 == 0 {
                            agg.record_success(index.to_string(), index);
                        } else {
                            agg.record_failure(failure(index));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let agg = Arc::try_unwrap(agg).ok().unwrap();
        let result = agg.finish(BatchKind::Update);
        assert_eq!(result.success_count, 100);
        assert_eq!(result.failure_count, 100);
        assert_eq!(result.success_count + result.failure_count, result.total);
    }
}
