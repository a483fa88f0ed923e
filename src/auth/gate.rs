//! Password and face login against the credential table

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::password::verify_password;
use crate::blob_store::BlobStore;
use crate::errors::{AppError, AppResult, ImageMatchError};
use crate::image_matching::{FeatureSet, ImageMatcher};
use crate::models::CredentialRecord;
use crate::repositories::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(Identity),
    Failed,
}

impl AuthOutcome {
    fn authenticated(email: &str) -> Self {
        Self::Authenticated(Identity {
            email: email.to_string(),
        })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Failed => None,
        }
    }
}

pub struct AuthGate {
    credentials: Arc<RecordStore<CredentialRecord>>,
    blobs: Arc<dyn BlobStore>,
    matcher: ImageMatcher,
    face_acceptance_threshold: usize,
}

impl AuthGate {
    pub fn new(
        credentials: Arc<RecordStore<CredentialRecord>>,
        blobs: Arc<dyn BlobStore>,
        matcher: ImageMatcher,
        face_acceptance_threshold: usize,
    ) -> Self {
        Self {
            credentials,
            blobs,
            matcher,
            face_acceptance_threshold,
        }
    }

    /// First credential row whose email and password digest both match
    pub async fn password_login(&self, email: &str, password: &str) -> AppResult<AuthOutcome> {
        let email = email.trim();
        let found = self
            .credentials
            .list()
            .await?
            .into_iter()
            .find(|c| c.email.trim() == email && verify_password(password, &c.password_hash));

        Ok(match found {
            Some(credential) => {
                info!("Password login succeeded for {}", credential.email);
                AuthOutcome::authenticated(&credential.email)
            }
            None => {
                debug!("Password login failed for {}", email);
                AuthOutcome::Failed
            }
        })
    }

    /// Accept the first credential whose reference image scores strictly
    /// above the acceptance threshold. Candidates whose reference cannot be
    /// fetched or decoded are skipped.
    pub async fn face_login(&self, query: Vec<u8>) -> AppResult<AuthOutcome> {
        let matcher = self.matcher.clone();
        let query = Arc::new(
            tokio::task::spawn_blocking(move || matcher.extract(&query, "query"))
                .await
                .map_err(|e| AppError::internal(format!("Feature extraction task failed: {e}")))??,
        );

        for credential in self.credentials.list().await? {
            let Some(reference_id) = credential.face_reference_id.as_deref().map(str::trim) else {
                continue;
            };

            let reference = match self.blobs.download(reference_id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        "Skipping face reference {} for {}: {}",
                        reference_id, credential.email, e
                    );
                    continue;
                }
            };

            let score = match self.score_reference(query.clone(), reference).await? {
                Ok(score) => score,
                Err(e) => {
                    warn!(
                        "Skipping face reference {} for {}: {}",
                        reference_id, credential.email, e
                    );
                    continue;
                }
            };

            debug!(
                "Face score {} for {} (threshold {})",
                score, credential.email, self.face_acceptance_threshold
            );
            if score > self.face_acceptance_threshold {
                info!("Face login succeeded for {}", credential.email);
                return Ok(AuthOutcome::authenticated(&credential.email));
            }
        }

        debug!("Face login found no candidate above threshold");
        Ok(AuthOutcome::Failed)
    }

    /// Registered face reference id for `email`, if any
    pub async fn face_reference_for(&self, email: &str) -> AppResult<Option<String>> {
        Ok(self
            .credentials
            .find_by_key(email)
            .await?
            .and_then(|c| c.face_reference_id)
            .map(|id| id.trim().to_string()))
    }

    /// Email of the first credential registered with face reference `id`
    pub async fn email_for_face_reference(&self, id: &str) -> AppResult<Option<String>> {
        let id = id.trim();
        Ok(self
            .credentials
            .list()
            .await?
            .into_iter()
            .find(|c| c.face_reference_id.as_deref().map(str::trim) == Some(id))
            .map(|c| c.email))
    }

    /// Outer error: the blocking task itself failed. Inner: the reference was unreadable.
    async fn score_reference(
        &self,
        query: Arc<FeatureSet>,
        reference: Vec<u8>,
    ) -> AppResult<Result<usize, ImageMatchError>> {
        let matcher = self.matcher.clone();
        tokio::task::spawn_blocking(move || {
            matcher
                .extract(&reference, "reference")
                .map(|features| matcher.score(&query, &features))
        })
        .await
        .map_err(|e| AppError::internal(format!("Feature matching task failed: {e}")))
    }
}
