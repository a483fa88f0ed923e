//! Google Drive v3 blob store
//!
//! Uploads use a single multipart/related `files.create` request; downloads
//! use `files.get?alt=media`. Downloads are retried on transient failures,
//! uploads are not (a repeated create makes a second file).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{BlobRef, BlobStore};
use crate::errors::{BlobError, BlobResult};
use crate::utils::{GoogleApiClient, RetryConfig, with_retry};

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Viewer link for a Drive file id
pub fn share_url(id: &str) -> String {
    format!("https://drive.google.com/file/d/{id}/view?usp=sharing")
}

fn mime_type_for(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

/// multipart/related body: JSON metadata part, then the media part
fn multipart_body(boundary: &str, metadata: &serde_json::Value, mime_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

pub struct DriveBlobStore {
    client: GoogleApiClient,
    base_url: String,
    retry_config: RetryConfig,
}

impl DriveBlobStore {
    pub fn new(client: GoogleApiClient, base_url: &str, retry_config: RetryConfig) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config,
        }
    }

    async fn download_once(&self, id: &str) -> BlobResult<Vec<u8>> {
        let url = format!("{}/drive/v3/files/{}", self.base_url, urlencoding::encode(id));
        let request = self.client.get(&url).query(&[("alt", "media")]);
        self.client.send_bytes(request).await.map_err(|e| {
            if e.is_not_found() {
                BlobError::NotFound { id: id.to_string() }
            } else {
                e.into_blob_error("download")
            }
        })
    }
}

#[async_trait]
impl BlobStore for DriveBlobStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        name: &str,
        parent_folder_id: Option<String>,
    ) -> BlobResult<BlobRef> {
        let mut metadata = json!({ "name": name });
        if let Some(folder) = parent_folder_id {
            metadata["parents"] = json!([folder]);
        }

        let boundary = format!("salon-karte-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_body(&boundary, &metadata, mime_type_for(&bytes), &bytes);
        let url = format!("{}/upload/drive/v3/files", self.base_url);
        let request = self
            .client
            .post(&url)
            .query(&[("uploadType", "multipart"), ("fields", "id,webViewLink")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body);

        let created: CreatedFile = self
            .client
            .send_json(request)
            .await
            .map_err(|e| e.into_blob_error("upload"))?;

        info!("Uploaded '{}' to Drive as {}", name, created.id);
        Ok(BlobRef {
            url: share_url(&created.id),
            id: created.id,
        })
    }

    async fn download(&self, id: &str) -> BlobResult<Vec<u8>> {
        let bytes = with_retry(&self.retry_config, || self.download_once(id), "download").await?;
        debug!("Downloaded {} bytes for blob {}", bytes.len(), id);
        Ok(bytes)
    }
}
