//! Opaque byte blob storage
//!
//! Treatment photos are uploaded here and face reference images are
//! downloaded from here. Blobs are addressed by an id the store hands out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::BlobResult;

pub mod drive;
pub mod filesystem;
pub mod memory;

pub use drive::DriveBlobStore;
pub use filesystem::FilesystemBlobStore;
pub use memory::InMemoryBlobStore;

/// Handle to a stored blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub id: String,
    /// Link a person can open to view the blob
    pub url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under a display `name`, optionally inside a parent folder
    async fn upload(
        &self,
        bytes: Vec<u8>,
        name: &str,
        parent_folder_id: Option<String>,
    ) -> BlobResult<BlobRef>;

    async fn download(&self, id: &str) -> BlobResult<Vec<u8>>;
}

/// Lowercase hex SHA-256 of `data`
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
