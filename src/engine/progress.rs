// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Progress observer contract.
//!
//! Observers are caller code. A panicking observer is caught and logged;
//! it never changes a batch outcome.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use crate::metrics;

/// Checkpoint reported to a [`ProgressCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Validating,
    Processing,
    Updating,
    Deleting,
}

impl std::fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validating => write!(f, "Validating"),
            Self::Processing => write!(f, "Processing"),
            Self::Updating => write!(f, "Updating"),
            Self::Deleting => write!(f, "Deleting"),
        }
    }
}

/// Observer called as `(completed, total, stage)`.
pub type ProgressCallback = Arc<dyn Fn(usize, usize, ProgressStage) + Send + Sync>;

/// Call the observer, swallowing any panic.
pub(crate) fn notify(callback: Option<&ProgressCallback>, completed: usize, total: usize, stage: ProgressStage) {
    let Some(callback) = callback else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(|| callback(completed, total, stage))).is_err() {
        warn!(completed, total, %stage, "Progress observer panicked; ignoring");
        metrics::record_observer_panic();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_stage_display() {
        assert_eq!(ProgressStage::Validating.to_string(), "Validating");
        assert_eq!(ProgressStage::Processing.to_string(), "Processing");
        assert_eq!(ProgressStage::Updating.to_string(), "Updating");
        assert_eq!(ProgressStage::Deleting.to_string(), "Deleting");
    }

    #[test]
    fn test_notify_calls_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let callback: ProgressCallback = Arc::new(move |completed, total, stage| {
            seen_clone.lock().push((completed, total, stage));
        });

        notify(Some(&callback), 0, 3, ProgressStage::Validating);
        notify(Some(&callback), 1, 3, ProgressStage::Processing);

        assert_eq!(
            *seen.lock(),
            vec![(0, 3, ProgressStage::Validating), (1, 3, ProgressStage::Processing)]
        );
    }

    #[test]
    fn test_notify_without_observer_is_noop() {
        notify(None, 0, 0, ProgressStage::Validating);
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let callback: ProgressCallback = Arc::new(|_, _, _| panic!("observer bug"));
        notify(Some(&callback), 0, 1, ProgressStage::Deleting);
        // Reaching here means the panic did not escape
    }
}
