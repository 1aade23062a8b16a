// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bulk engine: validation, windowed execution, retry and reporting.
//!
//! A batch call never fails because of record-level problems. Invalid input,
//! store errors and exhausted retries all end up as entries in
//! [`BatchResult::failures`]. The only `Err` a batch call returns is a
//! [`BulkError::Config`] detected before any work starts.
//!
//! # Record lifecycle
//!
//! ```text
//! Pending ──► Validated ──invalid──────────────────────────► FailedFinal(reason)
//!                 │
//!               valid
//!                 ▼
//!           Attempting(1) ──ok──► Succeeded
//!                 │ err
//!                 ▼
//!           Attempting(n+1) ... ──err at max_attempts──► FailedFinal(last error)
//! ```

pub mod aggregator;
pub mod progress;
pub mod types;
mod window;

use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{BulkEngineConfig, ConfigError};
use crate::listing::{now_rfc3339, DocumentUpdate, ListingInput};
use crate::metrics;
use crate::resilience::retry::retry;
use crate::store::{AssetUploader, Document, DocumentStore, StoreError, Transaction};
use crate::validation::{
    validate_delete_ids, validate_listings, validate_updates, ValidationError, ValidationLimits,
    ValidationOutcome,
};

pub use aggregator::ResultAggregator;
pub use progress::{ProgressCallback, ProgressStage};
pub use types::{BatchFailure, BatchKind, BatchResult, BatchSuccess, OperationOutcome};

use progress::notify;
use window::{PendingRecord, WindowRunner};

#[derive(Error, Debug)]
pub enum BulkError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Record {index} failed validation: {source}")]
    Validation {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Options for [`BulkEngine::run_create_batch`].
#[derive(Clone, Default)]
pub struct CreateBatchOptions {
    /// Window width; falls back to the engine config
    pub concurrency: Option<usize>,
    pub on_progress: Option<ProgressCallback>,
    /// Stop after validation, no remote calls
    pub validate_only: bool,
    /// Create documents without uploading their attachments
    pub skip_attachments: bool,
    /// Flip to `true` to skip windows that have not started yet
    pub cancel: Option<watch::Receiver<bool>>,
}

/// Options for [`BulkEngine::run_update_batch`].
#[derive(Clone, Default)]
pub struct UpdateBatchOptions {
    pub concurrency: Option<usize>,
    pub on_progress: Option<ProgressCallback>,
    /// Stamped on every patch as `_lastUpdateReason`
    pub reason: Option<String>,
    /// User id stamped as `_lastUpdatedBy`
    pub operator: Option<String>,
    pub cancel: Option<watch::Receiver<bool>>,
}

/// Options for [`BulkEngine::run_delete_batch`].
#[derive(Clone, Default)]
pub struct DeleteBatchOptions {
    pub concurrency: Option<usize>,
    pub on_progress: Option<ProgressCallback>,
    /// Mark documents deleted instead of removing them
    pub soft_delete: bool,
    /// Stamped as `deletionReason` on soft deletes
    pub reason: Option<String>,
    /// User id stamped as `deletedBy` on soft deletes
    pub operator: Option<String>,
    pub cancel: Option<watch::Receiver<bool>>,
}

macro_rules! impl_common_options {
    ($($options:ty),*) => {$(
        impl $options {
            #[must_use]
            pub fn with_concurrency(mut self, concurrency: usize) -> Self {
                self.concurrency = Some(concurrency);
                self
            }

            #[must_use]
            pub fn with_progress<F>(mut self, on_progress: F) -> Self
            where
                F: Fn(usize, usize, ProgressStage) + Send + Sync + 'static,
            {
                self.on_progress = Some(Arc::new(on_progress));
                self
            }

            #[must_use]
            pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
                self.cancel = Some(cancel);
                self
            }
        }
    )*};
}

impl_common_options!(CreateBatchOptions, UpdateBatchOptions, DeleteBatchOptions);

/// Bulk operations against one document store.
///
/// Instances are independent; several batches may run at once against the
/// same or different stores.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use bulk_engine::{BulkEngine, BulkEngineConfig, CreateBatchOptions, ListingInput};
/// use bulk_engine::store::InMemoryDocumentStore;
///
/// # async fn example() -> Result<(), bulk_engine::BulkError> {
/// let engine = BulkEngine::new(Arc::new(InMemoryDocumentStore::new()), BulkEngineConfig::default())?;
/// let listings = vec![ListingInput::new("Hub", "coworking", "Berlin", "Germany")];
///
/// let result = engine
///     .run_create_batch(&listings, CreateBatchOptions::default().with_concurrency(2))
///     .await?;
/// println!("{}", result.summary);
/// # Ok(())
/// # }
/// ```
pub struct BulkEngine {
    store: Arc<dyn DocumentStore>,
    uploader: Option<Arc<dyn AssetUploader>>,
    config: BulkEngineConfig,
}

impl BulkEngine {
    /// Create an engine. Fails if `config` is unusable.
    pub fn new(store: Arc<dyn DocumentStore>, config: BulkEngineConfig) -> Result<Self, BulkError> {
        config.validate()?;
        Ok(Self {
            store,
            uploader: None,
            config,
        })
    }

    /// Attach an uploader for listing attachments.
    #[must_use]
    pub fn with_uploader(mut self, uploader: Arc<dyn AssetUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    #[must_use]
    pub fn config(&self) -> &BulkEngineConfig {
        &self.config
    }

    fn resolve_concurrency(&self, requested: Option<usize>) -> Result<usize, BulkError> {
        match requested.unwrap_or(self.config.concurrency) {
            0 => Err(ConfigError::ZeroConcurrency.into()),
            n => Ok(n),
        }
    }

    fn runner<'a>(
        &self,
        kind: BatchKind,
        concurrency: usize,
        total: usize,
        on_progress: Option<&'a ProgressCallback>,
        cancel: Option<&'a watch::Receiver<bool>>,
    ) -> WindowRunner<'a> {
        WindowRunner {
            kind,
            concurrency,
            pause: self.config.window_pause(),
            total,
            on_progress,
            cancel,
        }
    }

    /// Split outcomes into pending records, recording invalid ones as failures.
    fn partition<'r, R, T>(
        kind: BatchKind,
        outcomes: Vec<ValidationOutcome<'r, R>>,
        aggregator: &ResultAggregator<T>,
        snapshot: impl Fn(&R) -> Value,
    ) -> Vec<PendingRecord<&'r R>> {
        let mut pending = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                ValidationOutcome::Valid(record) => pending.push(PendingRecord {
                    index,
                    input: record,
                    snapshot: snapshot(record),
                }),
                ValidationOutcome::Invalid(record, reason) => {
                    debug!(operation = kind.as_str(), index, %reason, "Record failed validation");
                    metrics::record_outcome(kind.as_str(), "invalid");
                    aggregator.record_failure(BatchFailure {
                        data: snapshot(record),
                        error: reason.to_string(),
                        index,
                    });
                }
            }
        }

        let invalid = aggregator.completed();
        if invalid > 0 {
            warn!(operation = kind.as_str(), invalid, "Validation failed for some records");
        }
        pending
    }

    fn finish<T>(kind: BatchKind, aggregator: ResultAggregator<T>) -> BatchResult<T> {
        let result = aggregator.finish(kind);
        metrics::record_batch_duration(kind.as_str(), result.duration);
        info!(
            operation = kind.as_str(),
            succeeded = result.success_count,
            failed = result.failure_count,
            "Batch complete: {}",
            result.summary
        );
        result
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // API: Batch operations
    // ═══════════════════════════════════════════════════════════════════════════

    /// Validate and create listings.
    ///
    /// With `validate_only`, successes hold the documents that would have been
    /// created, under placeholder ids `temp-{index}`.
    pub async fn run_create_batch(
        &self,
        listings: &[ListingInput],
        options: CreateBatchOptions,
    ) -> Result<BatchResult<Document>, BulkError> {
        let kind = BatchKind::Create;
        let concurrency = self.resolve_concurrency(options.concurrency)?;
        let total = listings.len();
        info!(total, concurrency, validate_only = options.validate_only, "Starting batch create");
        metrics::record_batch_started(kind.as_str(), total);

        let aggregator = ResultAggregator::new(total);
        notify(options.on_progress.as_ref(), 0, total, ProgressStage::Validating);
        let outcomes = validate_listings(listings, &ValidationLimits::from(&self.config));
        let pending = Self::partition(kind, outcomes, &aggregator, ListingInput::to_value);

        if options.validate_only {
            for record in pending {
                let id = format!("temp-{}", record.index);
                let document = Document::new(id.clone(), record.input.to_document());
                aggregator.record_success(id, document);
            }
            let result = aggregator.finish_validation();
            info!("{}", result.summary);
            return Ok(result);
        }

        let skip_attachments = options.skip_attachments;
        self.runner(kind, concurrency, total, options.on_progress.as_ref(), options.cancel.as_ref())
            .run(pending, &aggregator, |listing| async move {
                let document = self.create_with_retry(listing, skip_attachments).await?;
                Ok((document.id.clone(), document))
            })
            .await;

        Ok(Self::finish(kind, aggregator))
    }

    /// Patch existing documents. Each patch is stamped with `updatedAt`.
    pub async fn run_update_batch(
        &self,
        updates: &[DocumentUpdate],
        options: UpdateBatchOptions,
    ) -> Result<BatchResult<Document>, BulkError> {
        let kind = BatchKind::Update;
        let concurrency = self.resolve_concurrency(options.concurrency)?;
        let total = updates.len();
        info!(total, concurrency, "Starting batch update");
        metrics::record_batch_started(kind.as_str(), total);

        let aggregator = ResultAggregator::new(total);
        notify(options.on_progress.as_ref(), 0, total, ProgressStage::Validating);
        let pending = Self::partition(kind, validate_updates(updates), &aggregator, DocumentUpdate::to_value);

        let reason = options.reason.as_deref().unwrap_or(DEFAULT_UPDATE_REASON);
        let operator = options.operator.as_deref();
        self.runner(kind, concurrency, total, options.on_progress.as_ref(), options.cancel.as_ref())
            .run(pending, &aggregator, |update| async move {
                let patch = stamp_update(&update.patch, reason, operator);
                let document = self
                    .with_retry(kind, &format!("update {}", update.id), || {
                        self.store.update(&update.id, patch.clone())
                    })
                    .await?;
                Ok((update.id.clone(), document))
            })
            .await;

        Ok(Self::finish(kind, aggregator))
    }

    /// Delete documents by id. Success data is the deleted id.
    pub async fn run_delete_batch(
        &self,
        ids: &[String],
        options: DeleteBatchOptions,
    ) -> Result<BatchResult<String>, BulkError> {
        let kind = BatchKind::Delete;
        let concurrency = self.resolve_concurrency(options.concurrency)?;
        let total = ids.len();
        info!(total, concurrency, soft_delete = options.soft_delete, "Starting batch delete");
        metrics::record_batch_started(kind.as_str(), total);

        let aggregator = ResultAggregator::new(total);
        notify(options.on_progress.as_ref(), 0, total, ProgressStage::Validating);
        let pending = Self::partition(kind, validate_delete_ids(ids), &aggregator, |id: &String| {
            Value::String(id.clone())
        });

        let soft_delete = options.soft_delete;
        let reason = options.reason.as_deref().unwrap_or(DEFAULT_DELETE_REASON);
        let operator = options.operator.as_deref();
        self.runner(kind, concurrency, total, options.on_progress.as_ref(), options.cancel.as_ref())
            .run(pending, &aggregator, |id| async move {
                let operation = format!("delete {id}");
                if soft_delete {
                    let mut patch = json!({
                        "deleted": true,
                        "deletedAt": now_rfc3339(),
                        "deletionReason": reason,
                    });
                    if let Some(operator) = operator {
                        patch["deletedBy"] = user_ref(operator);
                    }
                    self.with_retry(kind, &operation, || self.store.update(id, patch.clone()))
                        .await?;
                } else {
                    self.with_retry(kind, &operation, || self.store.delete(id)).await?;
                }
                Ok((id.clone(), id.clone()))
            })
            .await;

        Ok(Self::finish(kind, aggregator))
    }

    /// Create all listings in one transaction, or none.
    ///
    /// Unlike the batch calls this path propagates errors: the first invalid
    /// record or a failed commit is returned as `Err`. Attachments are not
    /// uploaded here.
    pub async fn create_listings_atomic(&self, listings: &[ListingInput]) -> Result<Vec<Document>, BulkError> {
        let limits = ValidationLimits::from(&self.config);
        for (index, outcome) in validate_listings(listings, &limits).into_iter().enumerate() {
            if let ValidationOutcome::Invalid(_, source) = outcome {
                return Err(BulkError::Validation { index, source });
            }
        }

        let mut tx = Transaction::new(self.store.as_ref());
        for listing in listings {
            if listing.has_attachments() {
                debug!(name = %listing.name, "Attachments ignored on atomic create");
            }
            tx.create(listing.to_document());
        }

        let created = tx.commit().await?;
        info!(created = created.len(), "Atomic create committed");
        Ok(created)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Internal: per-record work
    // ═══════════════════════════════════════════════════════════════════════════

    async fn with_retry<T, F, Fut>(&self, kind: BatchKind, operation: &str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        retry(operation, &self.config.retry_config(), || {
            metrics::record_attempt(kind.as_str());
            call()
        })
        .await
    }

    /// Upload attachments (unless skipped) and create the document.
    ///
    /// The whole sequence is retried, so a retry re-uploads attachments.
    async fn create_with_retry(&self, listing: &ListingInput, skip_attachments: bool) -> Result<Document, StoreError> {
        let operation = format!("create listing \"{}\"", listing.name.trim());
        self.with_retry(BatchKind::Create, &operation, || self.create_listing(listing, skip_attachments))
            .await
    }

    /// Assets uploaded before a failed create are not removed; a retry uploads them again.
    async fn create_listing(&self, listing: &ListingInput, skip_attachments: bool) -> Result<Document, StoreError> {
        let mut document = listing.to_document();

        if !skip_attachments && listing.has_attachments() {
            match self.uploader {
                Some(ref uploader) => {
                    if let Some(images) = self.upload_attachments(uploader.as_ref(), listing).await {
                        if let Value::Object(ref mut fields) = document {
                            fields.insert("images".into(), images);
                        }
                    }
                }
                None => debug!(name = %listing.name, "No asset uploader configured, attachments skipped"),
            }
        }

        let created = self.store.create(document).await?;
        debug!(id = %created.id, name = %listing.name, "Created listing");
        Ok(created)
    }

    /// Image references for the uploaded attachments, if any succeeded.
    async fn upload_attachments(&self, uploader: &dyn AssetUploader, listing: &ListingInput) -> Option<Value> {
        let name = listing.name.trim();
        debug!(name, count = listing.attachments.len(), "Uploading attachments");

        let log_progress = |completed: usize, total: usize| {
            debug!(name, completed, total, "Attachment progress");
        };
        let report = uploader
            .upload_many(&listing.attachments, self.config.attachment_concurrency, Some(&log_progress))
            .await;
        metrics::record_attachments(report.successful.len(), report.failed.len());

        if !report.failed.is_empty() {
            warn!(name, failed = report.failed.len(), "Some attachments failed to upload");
        }
        if report.successful.is_empty() {
            return None;
        }

        let images = report
            .successful
            .iter()
            .map(|asset| {
                json!({
                    "_type": "image",
                    "asset": { "_type": "reference", "_ref": asset.asset_id },
                    "alt": format!("{name} image"),
                })
            })
            .collect();
        Some(Value::Array(images))
    }
}

const DEFAULT_UPDATE_REASON: &str = "Bulk update operation";
const DEFAULT_DELETE_REASON: &str = "Bulk delete operation";

/// Reference to the user who ran the operation.
fn user_ref(id: &str) -> Value {
    json!({ "_type": "reference", "_ref": id })
}

/// Patch plus update metadata.
fn stamp_update(patch: &Value, reason: &str, operator: Option<&str>) -> Value {
    let mut stamped = patch.clone();
    if let Value::Object(ref mut fields) = stamped {
        fields.insert("updatedAt".into(), json!(now_rfc3339()));
        fields.insert("_lastUpdateReason".into(), json!(reason));
        if let Some(operator) = operator {
            fields.insert("_lastUpdatedBy".into(), user_ref(operator));
        }
    }
    stamped
}
