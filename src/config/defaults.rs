/// Configuration default values
///
/// Central place for every default so a change lands in one location.
// Remote sheet defaults
pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DRIVE_API_BASE_URL: &str = "https://www.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "30s";
pub const DEFAULT_CONNECT_TIMEOUT: &str = "10s";
pub const ACCESS_TOKEN_ENV: &str = "SALON_KARTE_ACCESS_TOKEN";

// Table identities
pub const DEFAULT_CREDENTIALS_DATABASE: &str = "SalonUsers";
pub const DEFAULT_CREDENTIALS_WORKSHEET: &str = "sheet1";
pub const DEFAULT_RECORDS_DATABASE: &str = "SalonDatabase";
pub const DEFAULT_CUSTOMERS_WORKSHEET: &str = "Customers";
pub const DEFAULT_TREATMENTS_WORKSHEET: &str = "Treatments";

// Cache defaults
pub const DEFAULT_CACHE_TTL: &str = "60s";
pub const DEFAULT_CACHE_MAX_TABLES: usize = 16;

// Retry defaults
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_INITIAL_DELAY: &str = "200ms";
pub const DEFAULT_RETRY_MAX_DELAY: &str = "3s";
pub const DEFAULT_RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;

// Blob store defaults
pub const DEFAULT_BLOB_FILESYSTEM_ROOT: &str = "./data/blobs";

// Authentication defaults
/// Raw mutual-match count a face candidate must exceed. Not normalized by
/// descriptor count or image size; known to be too permissive.
pub const DEFAULT_FACE_ACCEPTANCE_THRESHOLD: usize = 1;

// Image matching defaults
pub const DEFAULT_MAX_KEYPOINTS: usize = 500;
pub const DEFAULT_PYRAMID_LEVELS: usize = 8;
pub const DEFAULT_SCALE_FACTOR: f32 = 1.2;
pub const DEFAULT_FAST_THRESHOLD: u8 = 20;
pub const DEFAULT_EDGE_THRESHOLD: u32 = 31;
