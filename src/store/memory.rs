// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use super::assets::{AssetUploader, UploadedAsset};
use super::traits::{Document, DocumentStore, StoreError};
use crate::listing::Attachment;

/// DashMap-backed document store.
///
/// Documents get an `_id` field; a document submitted with its own `_id`
/// keeps it.
pub struct InMemoryDocumentStore {
    data: DashMap<String, Value>,
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Get current document count
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Value> {
        self.data.get(id).map(|r| r.value().clone())
    }

    fn assign_id(document: Value) -> Result<(String, Value), StoreError> {
        let Value::Object(mut fields) = document else {
            return Err(StoreError::Rejected {
                status: 400,
                message: "document must be a JSON object".into(),
            });
        };
        let id = match fields.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        fields.insert("_id".into(), Value::String(id.clone()));
        Ok((id, Value::Object(fields)))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, document: Value) -> Result<Document, StoreError> {
        let (id, content) = Self::assign_id(document)?;
        self.data.insert(id.clone(), content.clone());
        Ok(Document::new(id, content))
    }

    async fn update(&self, id: &str, patch: Value) -> Result<Document, StoreError> {
        let Value::Object(patch) = patch else {
            return Err(StoreError::Rejected {
                status: 400,
                message: "patch must be a JSON object".into(),
            });
        };
        let mut entry = self
            .data
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Value::Object(fields) = entry.value_mut() {
            for (key, value) in patch {
                fields.insert(key, value);
            }
        }
        Ok(Document::new(id, entry.value().clone()))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.data.remove(id);
        Ok(())
    }

    /// All documents are checked before any is inserted.
    async fn commit(&self, creates: Vec<Value>) -> Result<Vec<Document>, StoreError> {
        let prepared = creates
            .into_iter()
            .map(Self::assign_id)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(prepared
            .into_iter()
            .map(|(id, content)| {
                self.data.insert(id.clone(), content.clone());
                Document::new(id, content)
            })
            .collect())
    }
}

/// DashMap-backed asset store.
pub struct InMemoryAssetStore {
    assets: DashMap<String, Attachment>,
}

impl InMemoryAssetStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            assets: DashMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl Default for InMemoryAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetUploader for InMemoryAssetStore {
    async fn upload(&self, attachment: &Attachment) -> Result<UploadedAsset, StoreError> {
        let asset_id = format!("image-{}", Uuid::new_v4().simple());
        self.assets.insert(asset_id.clone(), attachment.clone());
        Ok(UploadedAsset {
            asset_id,
            filename: attachment.filename.clone(),
        })
    }
}
