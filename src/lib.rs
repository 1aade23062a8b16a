// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Bulk Engine
//!
//! Bulk create, update and delete of directory listings against a
//! headless-CMS document store, with bounded concurrency, per-record retry
//! and a structured partial-failure report.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Validator                            │
//! │  • Pure, first-failure-wins rule checks                    │
//! │  • Invalid records become failures, never reach the store  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Window Executor                         │
//! │  • Windows of `concurrency` records, barrier between them  │
//! │  • Fixed pause between windows for store rate limits       │
//! │  • Per record: Retry Controller → Asset Uploader → Store   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Result Aggregator                        │
//! │  • Successes, failures with input index, counts, summary   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bulk_engine::{BulkEngine, BulkEngineConfig, CreateBatchOptions, ListingInput};
//! use bulk_engine::store::InMemoryDocumentStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(InMemoryDocumentStore::new());
//!     let engine = BulkEngine::new(store, BulkEngineConfig::default()).expect("valid config");
//!
//!     let listings = vec![
//!         ListingInput::new("Blue Door", "cafe", "Lisbon", "Portugal"),
//!         ListingInput::new("", "cafe", "Porto", "Portugal"),
//!     ];
//!
//!     let options = CreateBatchOptions::default()
//!         .with_progress(|done, total, stage| println!("{stage}: {done}/{total}"));
//!     let result = engine.run_create_batch(&listings, options).await.expect("valid options");
//!
//!     println!("{}", result.summary);
//!     for failure in result.failures_by_index() {
//!         println!("#{}: {}", failure.index, failure.error);
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`engine`]: The [`BulkEngine`] and batch result types
//! - [`validation`]: Record rules
//! - [`store`]: Document store and asset uploader traits, in-memory doubles
//! - [`resilience`]: Retry with linear backoff
//! - [`listing`]: Input records and document preparation

pub mod config;
pub mod listing;
pub mod validation;
pub mod store;
pub mod resilience;
pub mod engine;
pub mod metrics;

pub use config::{BulkEngineConfig, ConfigError};
pub use listing::{Attachment, Coordinates, DocumentUpdate, ListingInput};
pub use validation::{ValidationError, ValidationLimits, ValidationOutcome};
pub use store::{AssetUploader, Document, DocumentStore, StoreError, Transaction};
pub use engine::{
    BatchFailure, BatchKind, BatchResult, BatchSuccess, BulkEngine, BulkError, CreateBatchOptions,
    DeleteBatchOptions, OperationOutcome, ProgressCallback, ProgressStage, UpdateBatchOptions,
};
pub use resilience::retry::RetryConfig;
pub use metrics::LatencyTimer;
