//! In-process blob store for tests and local runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{BlobRef, BlobStore, content_hash};
use crate::errors::{BlobError, BlobResult};

#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under a caller-chosen id
    pub async fn insert(&self, id: impl Into<String>, bytes: Vec<u8>) {
        self.blobs.write().await.insert(id.into(), bytes);
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        _name: &str,
        _parent_folder_id: Option<String>,
    ) -> BlobResult<BlobRef> {
        let id = content_hash(&bytes);
        self.blobs.write().await.insert(id.clone(), bytes);
        Ok(BlobRef {
            url: format!("memory://{id}"),
            id,
        })
    }

    async fn download(&self, id: &str) -> BlobResult<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| BlobError::NotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inserted_blob_downloadable() {
        let store = InMemoryBlobStore::new();
        store.insert("face-1", vec![1, 2, 3]).await;

        assert_eq!(store.download("face-1").await.unwrap(), vec![1, 2, 3]);
        assert!(store.download("face-2").await.is_err());
    }
}
