//! Centralized error handling for salon-karte
//!
//! Every layer reports failures as explicit result values so callers can tell
//! a transient outage from a terminal one, and a missing record from success.
//!
//! # Error Categories
//!
//! - **Store Errors**: remote table transport failures, missing keys, header mismatches
//! - **Blob Errors**: upload/download failures against the blob store
//! - **Image Match Errors**: undecodable image input
//! - **Validation / Configuration Errors**: bad input or settings
//!
//! # Usage
//!
//! ```rust
//! use salon_karte::errors::{AppError, AppResult};
//!
//! async fn example_function() -> AppResult<String> {
//!     // Function can return any error type that converts to AppError
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for remote table operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience type alias for blob store operations
pub type BlobResult<T> = Result<T, BlobError>;
