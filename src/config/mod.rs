use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::{duration, parse_default};

use crate::errors::{AppError, AppResult};
use crate::models::TableId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub blob_store: BlobStoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub image_matching: ImageMatchingConfig,
}

/// Remote spreadsheet API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default = "default_sheets_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_drive_api_base_url")]
    pub drive_api_base_url: String,
    /// OAuth bearer token; `SALON_KARTE_ACCESS_TOKEN` takes precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_connect_timeout", with = "duration")]
    pub connect_timeout: Duration,
    /// Database name -> spreadsheet id. Names not listed are looked up through Drive.
    #[serde(default)]
    pub spreadsheet_ids: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub database: String,
    pub worksheet: String,
}

impl TableConfig {
    pub fn table_id(&self) -> TableId {
        TableId::new(&self.database, &self.worksheet)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    #[serde(default = "default_credentials_table")]
    pub credentials: TableConfig,
    #[serde(default = "default_customers_table")]
    pub customers: TableConfig,
    #[serde(default = "default_treatments_table")]
    pub treatments: TableConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a fetched table snapshot is served before refetching
    #[serde(default = "default_cache_ttl", with = "duration")]
    pub ttl: Duration,
    /// Upper bound on cached table snapshots (LRU eviction)
    #[serde(default = "default_cache_max_tables")]
    pub max_tables: usize,
}

/// Bounded retry policy for idempotent remote calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_initial_delay", with = "duration")]
    pub initial_delay: Duration,
    #[serde(default = "default_retry_max_delay", with = "duration")]
    pub max_delay: Duration,
    #[serde(default = "default_retry_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    Drive,
    Filesystem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    #[serde(default = "default_blob_backend")]
    pub backend: BlobBackend,
    /// Parent folder for uploaded treatment photos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default = "default_blob_filesystem_root")]
    pub filesystem_root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// A face candidate is accepted when its mutual-match count is strictly
    /// greater than this value. The default of 1 is uncalibrated and admits
    /// false accepts; change it only after a calibration study.
    #[serde(default = "default_face_acceptance_threshold")]
    pub face_acceptance_threshold: usize,
}

/// Feature detector / descriptor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMatchingConfig {
    #[serde(default = "default_max_keypoints")]
    pub max_keypoints: usize,
    #[serde(default = "default_pyramid_levels")]
    pub pyramid_levels: usize,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
    #[serde(default = "default_fast_threshold")]
    pub fast_threshold: u8,
    /// Pixels ignored at every image border; must fit the descriptor patch
    #[serde(default = "default_edge_threshold")]
    pub edge_threshold: u32,
}

fn default_sheets_api_base_url() -> String {
    DEFAULT_SHEETS_API_BASE_URL.to_string()
}

fn default_drive_api_base_url() -> String {
    DEFAULT_DRIVE_API_BASE_URL.to_string()
}

fn default_request_timeout() -> Duration {
    parse_default(DEFAULT_REQUEST_TIMEOUT)
}

fn default_connect_timeout() -> Duration {
    parse_default(DEFAULT_CONNECT_TIMEOUT)
}

fn default_credentials_table() -> TableConfig {
    TableConfig {
        database: DEFAULT_CREDENTIALS_DATABASE.to_string(),
        worksheet: DEFAULT_CREDENTIALS_WORKSHEET.to_string(),
    }
}

fn default_customers_table() -> TableConfig {
    TableConfig {
        database: DEFAULT_RECORDS_DATABASE.to_string(),
        worksheet: DEFAULT_CUSTOMERS_WORKSHEET.to_string(),
    }
}

fn default_treatments_table() -> TableConfig {
    TableConfig {
        database: DEFAULT_RECORDS_DATABASE.to_string(),
        worksheet: DEFAULT_TREATMENTS_WORKSHEET.to_string(),
    }
}

fn default_cache_ttl() -> Duration {
    parse_default(DEFAULT_CACHE_TTL)
}

fn default_cache_max_tables() -> usize {
    DEFAULT_CACHE_MAX_TABLES
}

fn default_retry_max_attempts() -> u32 {
    DEFAULT_RETRY_MAX_ATTEMPTS
}

fn default_retry_initial_delay() -> Duration {
    parse_default(DEFAULT_RETRY_INITIAL_DELAY)
}

fn default_retry_max_delay() -> Duration {
    parse_default(DEFAULT_RETRY_MAX_DELAY)
}

fn default_retry_backoff_multiplier() -> f64 {
    DEFAULT_RETRY_BACKOFF_MULTIPLIER
}

fn default_blob_backend() -> BlobBackend {
    BlobBackend::Drive
}

fn default_blob_filesystem_root() -> PathBuf {
    PathBuf::from(DEFAULT_BLOB_FILESYSTEM_ROOT)
}

fn default_face_acceptance_threshold() -> usize {
    DEFAULT_FACE_ACCEPTANCE_THRESHOLD
}

fn default_max_keypoints() -> usize {
    DEFAULT_MAX_KEYPOINTS
}

fn default_pyramid_levels() -> usize {
    DEFAULT_PYRAMID_LEVELS
}

fn default_scale_factor() -> f32 {
    DEFAULT_SCALE_FACTOR
}

fn default_fast_threshold() -> u8 {
    DEFAULT_FAST_THRESHOLD
}

fn default_edge_threshold() -> u32 {
    DEFAULT_EDGE_THRESHOLD
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_sheets_api_base_url(),
            drive_api_base_url: default_drive_api_base_url(),
            access_token: None,
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            spreadsheet_ids: BTreeMap::new(),
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            credentials: default_credentials_table(),
            customers: default_customers_table(),
            treatments: default_treatments_table(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_cache_ttl(),
            max_tables: default_cache_max_tables(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            initial_delay: default_retry_initial_delay(),
            max_delay: default_retry_max_delay(),
            backoff_multiplier: default_retry_backoff_multiplier(),
        }
    }
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_blob_backend(),
            folder_id: None,
            filesystem_root: default_blob_filesystem_root(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            face_acceptance_threshold: default_face_acceptance_threshold(),
        }
    }
}

impl Default for ImageMatchingConfig {
    fn default() -> Self {
        Self {
            max_keypoints: default_max_keypoints(),
            pyramid_levels: default_pyramid_levels(),
            scale_factor: default_scale_factor(),
            fast_threshold: default_fast_threshold(),
            edge_threshold: default_edge_threshold(),
        }
    }
}

impl Config {
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let mut config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };

        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                config.sheets.access_token = Some(token);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make an operation meaningless
    pub fn validate(&self) -> AppResult<()> {
        if self.cache.max_tables == 0 {
            return Err(AppError::configuration("cache.max_tables must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::configuration("retry.max_attempts must be at least 1"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(AppError::configuration(
                "retry.backoff_multiplier must be >= 1.0",
            ));
        }
        let matching = &self.image_matching;
        if matching.pyramid_levels == 0 || matching.max_keypoints == 0 {
            return Err(AppError::configuration(
                "image_matching.pyramid_levels and max_keypoints must be at least 1",
            ));
        }
        if matching.scale_factor <= 1.0 {
            return Err(AppError::configuration(
                "image_matching.scale_factor must be greater than 1.0",
            ));
        }
        if matching.edge_threshold < crate::image_matching::MIN_EDGE_THRESHOLD {
            return Err(AppError::configuration(format!(
                "image_matching.edge_threshold must be at least {}",
                crate::image_matching::MIN_EDGE_THRESHOLD
            )));
        }
        Ok(())
    }

    pub fn access_token(&self) -> AppResult<&str> {
        self.sheets
            .access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AppError::configuration(format!(
                    "No access token configured (set sheets.access_token or {ACCESS_TOKEN_ENV})"
                ))
            })
    }
}
