// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Remote collaborators: the document store and the asset uploader.
//!
//! The engine only talks to these traits. [`memory`] holds in-process
//! implementations used by tests and the demo.

pub mod traits;
pub mod assets;
pub mod memory;

pub use traits::{Document, DocumentStore, StoreError, Transaction};
pub use assets::{AssetUploader, FailedUpload, UploadReport, UploadedAsset, check_attachment};
pub use memory::{InMemoryAssetStore, InMemoryDocumentStore};
