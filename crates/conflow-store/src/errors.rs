//! Error handling for conflow-store
//!
//! Wraps conflow-core ExError with store-specific helpers

use conflow_core::errors::{ExError, ExErrorKind};
use conflow_core::snapshot::Fingerprint;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a CAS mismatch error
pub fn base_hash_mismatch(expected: Option<&Fingerprint>, actual: Option<&Fingerprint>) -> ExError {
    let describe = |hash: Option<&Fingerprint>| match hash {
        Some(hash) => hash.short().to_string(),
        None => "<absent>".to_string(),
    };
    ExError::new(ExErrorKind::BaseHashMismatch)
        .with_op("write_document")
        .with_message(format!(
            "config changed since last load (expected {}, found {})",
            describe(expected),
            describe(actual)
        ))
}

/// Create a serialization error
pub fn serialize_error(err: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("write_document")
        .with_message(err.to_string())
}
