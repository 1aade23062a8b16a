// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Attachment upload pipeline.
//!
//! Uploads run in windows of `concurrency` files. A failed file never fails
//! its siblings; the caller gets both lists back in an [`UploadReport`].

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::traits::StoreError;
use crate::listing::Attachment;

/// Content types accepted for listing images.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Largest accepted attachment (50 MB).
pub const MAX_ATTACHMENT_BYTES: usize = 50 * 1024 * 1024;

const MAX_FILENAME_LEN: usize = 255;

/// Upload progress observer: `(completed, total)`.
pub type UploadProgress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// A stored asset reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub asset_id: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub successful: Vec<UploadedAsset>,
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len()
    }
}

/// Reject files the asset pipeline will never accept.
pub fn check_attachment(attachment: &Attachment) -> Result<(), StoreError> {
    if !ALLOWED_CONTENT_TYPES.contains(&attachment.content_type.as_str()) {
        return Err(StoreError::Asset(format!(
            "Unsupported file type: {}",
            attachment.content_type
        )));
    }
    if attachment.size_bytes() > MAX_ATTACHMENT_BYTES {
        return Err(StoreError::Asset(format!(
            "File too large: {:.2}MB (max: 50MB)",
            attachment.size_bytes() as f64 / 1024.0 / 1024.0
        )));
    }
    if attachment.filename.is_empty() || attachment.filename.len() > MAX_FILENAME_LEN {
        return Err(StoreError::Asset("Invalid filename".into()));
    }
    Ok(())
}

/// Remote asset storage.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(&self, attachment: &Attachment) -> Result<UploadedAsset, StoreError>;

    /// Upload many files, `concurrency` at a time.
    ///
    /// Progress is reported after each file finishes.
    async fn upload_many(
        &self,
        files: &[Attachment],
        concurrency: usize,
        on_progress: Option<UploadProgress<'_>>,
    ) -> UploadReport {
        let mut report = UploadReport::default();
        let total = files.len();

        for window in files.chunks(concurrency.max(1)) {
            let results = join_all(window.iter().map(|file| async move {
                match check_attachment(file) {
                    Ok(()) => self.upload(file).await,
                    Err(e) => Err(e),
                }
            }))
            .await;

            for (file, result) in window.iter().zip(results) {
                match result {
                    Ok(asset) => {
                        debug!(filename = %file.filename, asset_id = %asset.asset_id, "Attachment uploaded");
                        report.successful.push(asset);
                    }
                    Err(e) => {
                        warn!(filename = %file.filename, error = %e, "Attachment upload failed");
                        report.failed.push(FailedUpload {
                            filename: file.filename.clone(),
                            error: e.to_string(),
                        });
                    }
                }
                if let Some(progress) = on_progress {
                    progress(report.total(), total);
                }
            }
        }

        report
    }
}
