// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failure surfaced by a remote store or uploader.
///
/// The engine retries every variant identically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Backend(String),
    #[error("Missing write credentials: {0}")]
    Unauthorized(String),
    #[error("Rejected by store ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Asset upload failed: {0}")]
    Asset(String),
}

/// A document as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, content: Value) -> Self {
        Self { id: id.into(), content }
    }
}

/// Remote document store (a headless CMS dataset).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, document: Value) -> Result<Document, StoreError>;
    async fn update(&self, id: &str, patch: Value) -> Result<Document, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Create all documents in one atomic commit.
    /// Default implementation falls back to sequential creates and is not atomic.
    async fn commit(&self, creates: Vec<Value>) -> Result<Vec<Document>, StoreError> {
        let mut created = Vec::with_capacity(creates.len());
        for document in creates {
            created.push(self.create(document).await?);
        }
        Ok(created)
    }
}

/// Queue of creates committed together.
///
/// # Example
///
/// ```
/// use bulk_engine::store::{InMemoryDocumentStore, Transaction};
/// use serde_json::json;
///
/// # tokio_test_block_on(async {
/// let store = InMemoryDocumentStore::new();
/// let mut tx = Transaction::new(&store);
/// tx.create(json!({"_type": "listing", "name": "a"}))
///   .create(json!({"_type": "listing", "name": "b"}));
/// let created = tx.commit().await.unwrap();
/// assert_eq!(created.len(), 2);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct Transaction<'a> {
    store: &'a dyn DocumentStore,
    creates: Vec<Value>,
}

impl<'a> Transaction<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            creates: Vec::new(),
        }
    }

    pub fn create(&mut self, document: Value) -> &mut Self {
        self.creates.push(document);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.creates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty()
    }

    pub async fn commit(self) -> Result<Vec<Document>, StoreError> {
        self.store.commit(self.creates).await
    }
}
