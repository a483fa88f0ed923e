//! Treatment history service
//!
//! Treatments joined with customer furigana, keyword search, and recording
//! a visit with an optional photo.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::blob_store::BlobStore;
use crate::errors::{AppError, AppResult};
use crate::models::{CustomerRecord, TreatmentRecord};
use crate::repositories::{BatchOutcome, ColumnUpdates, RecordStore};

/// A treatment with its customer's furigana; empty when the customer is gone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreatmentEntry {
    #[serde(flatten)]
    pub treatment: TreatmentRecord,
    pub furigana: String,
}

impl TreatmentEntry {
    fn matches_all(&self, keywords: &[String]) -> bool {
        let fields = [
            self.treatment.customer_name.to_lowercase(),
            self.furigana.to_lowercase(),
            self.treatment.treatment_text.to_lowercase(),
            self.treatment.memo.to_lowercase(),
            self.treatment.date_string(),
        ];
        keywords
            .iter()
            .all(|keyword| fields.iter().any(|field| field.contains(keyword.as_str())))
    }
}

#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct TreatmentLog {
    customers: Arc<RecordStore<CustomerRecord>>,
    treatments: Arc<RecordStore<TreatmentRecord>>,
    blobs: Arc<dyn BlobStore>,
    photo_folder_id: Option<String>,
}

impl TreatmentLog {
    pub fn new(
        customers: Arc<RecordStore<CustomerRecord>>,
        treatments: Arc<RecordStore<TreatmentRecord>>,
        blobs: Arc<dyn BlobStore>,
        photo_folder_id: Option<String>,
    ) -> Self {
        Self {
            customers,
            treatments,
            blobs,
            photo_folder_id,
        }
    }

    pub async fn list_with_furigana(&self) -> AppResult<Vec<TreatmentEntry>> {
        let mut furigana: HashMap<String, String> = HashMap::new();
        for customer in self.customers.list().await? {
            furigana
                .entry(customer.name.trim().to_string())
                .or_insert(customer.furigana);
        }

        Ok(self
            .treatments
            .list()
            .await?
            .into_iter()
            .map(|treatment| TreatmentEntry {
                furigana: furigana
                    .get(treatment.customer_name.trim())
                    .cloned()
                    .unwrap_or_default(),
                treatment,
            })
            .collect())
    }

    /// Entries containing every whitespace-separated keyword in some field
    pub async fn search(&self, query: &str) -> AppResult<Vec<TreatmentEntry>> {
        let keywords: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let entries = self.list_with_furigana().await?;
        if keywords.is_empty() {
            return Ok(entries);
        }
        Ok(entries
            .into_iter()
            .filter(|entry| entry.matches_all(&keywords))
            .collect())
    }

    /// Append a treatment, uploading `photo` first when given. A failed upload
    /// is logged and the treatment is saved without a photo.
    pub async fn record(
        &self,
        mut treatment: TreatmentRecord,
        photo: Option<PhotoUpload>,
    ) -> AppResult<TreatmentRecord> {
        if treatment.customer_name.trim().is_empty() {
            return Err(AppError::validation("Treatment needs a customer name"));
        }

        if let Some(photo) = photo {
            match self
                .blobs
                .upload(photo.bytes, &photo.file_name, self.photo_folder_id.clone())
                .await
            {
                Ok(blob) => treatment = treatment.with_photo_url(blob.url),
                Err(e) => warn!(
                    "Photo upload for {} failed, saving treatment without photo: {}",
                    treatment.customer_name, e
                ),
            }
        }

        self.treatments.append(&treatment).await?;
        info!(
            "Recorded treatment '{}' for {}",
            treatment.treatment_text, treatment.customer_name
        );
        Ok(treatment)
    }

    /// Update the first treatment recorded for `customer_name`
    pub async fn update(
        &self,
        customer_name: &str,
        updates: &ColumnUpdates,
    ) -> AppResult<BatchOutcome> {
        Ok(self.treatments.update_by_key(customer_name, updates).await?)
    }

    /// Remove the first treatment recorded for `customer_name`
    pub async fn remove(&self, customer_name: &str) -> AppResult<()> {
        Ok(self.treatments.delete_by_key(customer_name).await?)
    }
}
