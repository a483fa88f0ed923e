//! Filesystem blob store
//!
//! Content-addressed layout under a root directory:
//! ```text
//! {root}/
//!   {hash[0:2]}/
//!     {hash}.bin
//! ```
//! The blob id is the hex hash, so uploading the same bytes twice yields the
//! same id and one file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{BlobRef, BlobStore, content_hash};
use crate::errors::{BlobError, BlobResult};

pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn new(root: impl AsRef<Path>) -> BlobResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, id: &str) -> BlobResult<PathBuf> {
        if id.len() < 3 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BlobError::NotFound { id: id.to_string() });
        }
        Ok(self.root.join(&id[0..2]).join(format!("{id}.bin")))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        name: &str,
        _parent_folder_id: Option<String>,
    ) -> BlobResult<BlobRef> {
        let id = content_hash(&bytes);
        let path = self.path_for(&id)?;

        if fs::try_exists(&path).await? {
            debug!("Blob {} already stored", id);
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            let temp_path = path.with_extension("tmp");
            fs::write(&temp_path, &bytes).await?;
            fs::rename(&temp_path, &path).await?;
            debug!("Stored blob {} ({} bytes) for '{}'", id, bytes.len(), name);
        }

        Ok(BlobRef {
            url: format!("file://{}", path.display()),
            id,
        })
    }

    async fn download(&self, id: &str) -> BlobResult<Vec<u8>> {
        let path = self.path_for(id)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound { id: id.to_string() })
            }
            Err(e) => Err(e.into()),
        }
    }
}
