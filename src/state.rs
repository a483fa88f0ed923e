//! Composition root
//!
//! One [`RecordStore`] per configured table, all sharing a single transport
//! and snapshot cache, plus the services built on top of them.

use std::sync::Arc;
use tracing::info;

use crate::auth::AuthGate;
use crate::blob_store::{BlobStore, DriveBlobStore, FilesystemBlobStore};
use crate::config::{BlobBackend, Config};
use crate::errors::AppResult;
use crate::image_matching::ImageMatcher;
use crate::models::{CredentialRecord, CustomerRecord, TreatmentRecord};
use crate::repositories::{RecordStore, TableCache};
use crate::services::{CustomerDirectory, TreatmentLog};
use crate::transport::{GoogleSheetsTransport, SheetTransport, SheetTransportRetryExt};
use crate::utils::{GoogleApiClient, RetryConfig};

pub struct AppState {
    pub cache: Arc<TableCache>,
    pub credentials: Arc<RecordStore<CredentialRecord>>,
    pub customers: Arc<RecordStore<CustomerRecord>>,
    pub treatments: Arc<RecordStore<TreatmentRecord>>,
    pub blobs: Arc<dyn BlobStore>,
    pub auth: AuthGate,
    pub directory: CustomerDirectory,
    pub treatment_log: TreatmentLog,
}

impl AppState {
    /// Wire the Google-backed transport and the configured blob backend
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let client = GoogleApiClient::new(
            config.access_token()?,
            config.sheets.request_timeout,
            config.sheets.connect_timeout,
        )?;
        let retry = RetryConfig::from(&config.retry);

        let transport: Arc<dyn SheetTransport> = Arc::new(
            GoogleSheetsTransport::new(client.clone(), &config.sheets).with_retries(retry.clone()),
        );

        let blobs: Arc<dyn BlobStore> = match config.blob_store.backend {
            BlobBackend::Drive => Arc::new(DriveBlobStore::new(
                client,
                &config.sheets.drive_api_base_url,
                retry,
            )),
            BlobBackend::Filesystem => {
                Arc::new(FilesystemBlobStore::new(&config.blob_store.filesystem_root).await?)
            }
        };
        info!(
            "Using {:?} blob backend and {} cached table(s) at most",
            config.blob_store.backend, config.cache.max_tables
        );

        Ok(Self::with_backends(config, transport, blobs))
    }

    /// Wire explicit backends, e.g. in-memory ones
    pub fn with_backends(
        config: &Config,
        transport: Arc<dyn SheetTransport>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let cache = Arc::new(TableCache::new(config.cache.max_tables));
        let ttl = config.cache.ttl;
        let tables = &config.tables;

        let credentials = Arc::new(RecordStore::new(
            transport.clone(),
            tables.credentials.table_id(),
            cache.clone(),
            ttl,
        ));
        let customers = Arc::new(RecordStore::new(
            transport.clone(),
            tables.customers.table_id(),
            cache.clone(),
            ttl,
        ));
        let treatments = Arc::new(RecordStore::new(
            transport,
            tables.treatments.table_id(),
            cache.clone(),
            ttl,
        ));

        let auth = AuthGate::new(
            credentials.clone(),
            blobs.clone(),
            ImageMatcher::new(config.image_matching.clone()),
            config.auth.face_acceptance_threshold,
        );
        let directory = CustomerDirectory::new(customers.clone(), treatments.clone());
        let treatment_log = TreatmentLog::new(
            customers.clone(),
            treatments.clone(),
            blobs.clone(),
            config.blob_store.folder_id.clone(),
        );

        Self {
            cache,
            credentials,
            customers,
            treatments,
            blobs,
            auth,
            directory,
            treatment_log,
        }
    }
}
