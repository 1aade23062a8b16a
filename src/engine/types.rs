// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public result types for batch runs.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::progress::ProgressStage;

/// Which remote operation a batch performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Create,
    Update,
    Delete,
}

impl BatchKind {
    /// Metric and log label
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Stage reported as each record starts
    #[must_use]
    pub fn stage(&self) -> ProgressStage {
        match self {
            Self::Create => ProgressStage::Processing,
            Self::Update => ProgressStage::Updating,
            Self::Delete => ProgressStage::Deleting,
        }
    }

    pub(crate) fn summary_verb(&self) -> &'static str {
        match self {
            Self::Create => "Processed",
            Self::Update => "Updated",
            Self::Delete => "Deleted",
        }
    }
}

impl std::fmt::Display for BatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that reached the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSuccess<T> {
    pub id: String,
    pub data: T,
}

/// A record that did not. `index` is its position in the caller's input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub data: Value,
    pub error: String,
    pub index: usize,
}

/// Terminal state of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome<T> {
    Succeeded { id: String, data: T },
    Failed(BatchFailure),
}

impl<T> OperationOutcome<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Report of a finished batch.
///
/// Successes and failures are in completion order, not input order.
/// `success_count + failure_count == total` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult<T> {
    pub successes: Vec<BatchSuccess<T>>,
    pub failures: Vec<BatchFailure>,
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub duration: Duration,
    pub summary: String,
}

impl<T> BatchResult<T> {
    /// Check if every record succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }

    /// Failures sorted by their input index.
    #[must_use]
    pub fn failures_by_index(&self) -> Vec<&BatchFailure> {
        let mut sorted: Vec<&BatchFailure> = self.failures.iter().collect();
        sorted.sort_by_key(|f| f.index);
        sorted
    }

    #[must_use]
    pub fn failure_at(&self, index: usize) -> Option<&BatchFailure> {
        self.failures.iter().find(|f| f.index == index)
    }
}
