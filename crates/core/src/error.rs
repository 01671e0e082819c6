//! Error types for SieveDB
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every variant belongs to one [`ErrorCategory`]. Nothing at this layer is
//! transient, so no category is ever retried internally.

use std::io;
use thiserror::Error;

/// Result type alias for SieveDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SieveDB
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input structure rejected by the loader
    #[error("Parse error: {0}")]
    ParseOrLoad(String),

    /// Unrecognized fingerprint kind or similarity sub-mode
    #[error("Unknown fingerprint mode: {0}")]
    UnknownMode(String),

    /// Unrecognized similarity metric name
    #[error("Unknown similarity metric: {0}")]
    UnknownMetric(String),

    /// Metric applied to operands of the wrong representation or shape
    #[error("Incompatible operands: {0}")]
    IncompatibleOperands(String),

    /// Object category not supported by the requested operation
    #[error("Unsupported object: {0}")]
    UnsupportedObject(String),

    /// Operation on a database that has been closed
    #[error("Database is closed")]
    DatabaseClosed,

    /// Operation on a cursor that has been ended or is not positioned
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Database directory holds a different schema than requested
    #[error("Schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch {
        /// Schema requested by the caller
        expected: String,
        /// Schema recorded on disk
        found: String,
    },

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Invalid operation, argument or configuration
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Handle does not name a live object of the expected type
    #[error("Invalid handle: {0}")]
    InvalidHandle(i32),
}

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input structure
    ParseOrLoad,
    /// Unknown kind, sub-mode or metric name
    UnknownName,
    /// Wrong operand representation or mismatched fingerprints
    IncompatibleOperands,
    /// Reaction vs molecule, query vs concrete
    UnsupportedObject,
    /// Use after close, end or free
    UseAfterRelease,
    /// Persistence failure
    StorageIo,
    /// Bad argument or configuration
    InvalidArgument,
}

impl Error {
    /// Category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ParseOrLoad(_) => ErrorCategory::ParseOrLoad,
            Error::UnknownMode(_) | Error::UnknownMetric(_) => ErrorCategory::UnknownName,
            Error::IncompatibleOperands(_) => ErrorCategory::IncompatibleOperands,
            Error::UnsupportedObject(_) => ErrorCategory::UnsupportedObject,
            Error::DatabaseClosed | Error::InvalidCursor(_) | Error::InvalidHandle(_) => {
                ErrorCategory::UseAfterRelease
            }
            Error::SchemaMismatch { .. }
            | Error::IoError(_)
            | Error::StorageError(_)
            | Error::SerializationError(_)
            | Error::Corruption(_) => ErrorCategory::StorageIo,
            Error::InvalidOperation(_) => ErrorCategory::InvalidArgument,
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = Error::IoError(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
    }

    #[test]
    fn test_error_display_unknown_mode() {
        let err = Error::UnknownMode("fcfp4".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Unknown fingerprint mode"));
        assert!(msg.contains("fcfp4"));
    }

    #[test]
    fn test_error_display_schema_mismatch() {
        let err = Error::SchemaMismatch {
            expected: "molecule".to_string(),
            found: "reaction".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("molecule"));
        assert!(msg.contains("reaction"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
        assert_eq!(err.category(), ErrorCategory::StorageIo);
    }

    #[test]
    fn test_error_from_bincode() {
        let invalid_data = vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];

        let result: Result<String> = bincode::deserialize(&invalid_data).map_err(|e| e.into());

        assert!(matches!(result, Err(Error::SerializationError(_))));
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::UnknownMetric("x".into()).category(),
            ErrorCategory::UnknownName
        );
        assert_eq!(Error::DatabaseClosed.category(), ErrorCategory::UseAfterRelease);
        assert_eq!(
            Error::InvalidCursor("ended".into()).category(),
            ErrorCategory::UseAfterRelease
        );
        assert_eq!(
            Error::IncompatibleOperands("x".into()).category(),
            ErrorCategory::IncompatibleOperands
        );
    }
}
