//! Error type definitions for salon-karte
//!
//! The store taxonomy mirrors what a caller can do about a failure:
//! retry it (`RemoteUnavailable` with `retryable`), report it (`NotFound`),
//! or accept a partial result (`SchemaMismatch`).

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Remote table errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Blob store errors
    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),

    /// Image decoding / matching errors
    #[error("Image matching error: {0}")]
    ImageMatch(#[from] ImageMatchError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Remote tabular store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transport or authorization failure talking to the remote store
    #[error("Remote store unavailable during {operation}: {message}")]
    RemoteUnavailable {
        operation: String,
        message: String,
        retryable: bool,
    },

    /// No row carries the requested key
    #[error("Record not found: {table} with key = {key}")]
    NotFound { table: String, key: String },

    /// The header row lacks columns the operation depends on
    #[error("Schema mismatch in {table}: missing column(s) {}", missing.join(", "))]
    SchemaMismatch { table: String, missing: Vec<String> },

    /// The remote answered with something we could not interpret
    #[error("Malformed response during {operation}: {message}")]
    MalformedResponse { operation: String, message: String },
}

/// Blob store errors
#[derive(Error, Debug)]
pub enum BlobError {
    /// Transport or authorization failure talking to the blob store
    #[error("Blob store unavailable during {operation}: {message}")]
    Unavailable {
        operation: String,
        message: String,
        retryable: bool,
    },

    /// Blob id unknown to the store
    #[error("Blob not found: {id}")]
    NotFound { id: String },

    /// Local filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image matching errors
#[derive(Error, Debug)]
pub enum ImageMatchError {
    /// Input bytes are not a decodable image
    #[error("Failed to decode {role} image: {source}")]
    DecodeFailure {
        role: &'static str,
        #[source]
        source: image::ImageError,
    },
}

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Blob(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl StoreError {
    pub fn unavailable<O: Into<String>, M: Into<String>>(
        operation: O,
        message: M,
        retryable: bool,
    ) -> Self {
        Self::RemoteUnavailable {
            operation: operation.into(),
            message: message.into(),
            retryable,
        }
    }

    pub fn not_found<T: Into<String>, K: Into<String>>(table: T, key: K) -> Self {
        Self::NotFound {
            table: table.into(),
            key: key.into(),
        }
    }

    pub fn malformed<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        Self::MalformedResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable {
                retryable: true,
                ..
            }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl BlobError {
    pub fn unavailable<O: Into<String>, M: Into<String>>(
        operation: O,
        message: M,
        retryable: bool,
    ) -> Self {
        Self::Unavailable {
            operation: operation.into(),
            message: message.into(),
            retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable {
                retryable: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(StoreError::unavailable("list_rows", "503", true).is_retryable());
        assert!(!StoreError::unavailable("list_rows", "401", false).is_retryable());
        assert!(!StoreError::not_found("Customers", "B").is_retryable());

        let app: AppError = StoreError::unavailable("append_row", "reset", true).into();
        assert!(app.is_retryable());
        assert!(!AppError::validation("empty name").is_retryable());
    }

    #[test]
    fn test_schema_mismatch_lists_columns() {
        let err = StoreError::SchemaMismatch {
            table: "SalonDatabase/Customers".to_string(),
            missing: vec!["Name".to_string(), "Phone".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Schema mismatch in SalonDatabase/Customers: missing column(s) Name, Phone"
        );
    }
}
