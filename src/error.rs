//! Error types.
//!
//! Array hashing is infallible for every supported encoding, so the errors
//! here come from two places: building sparse matrices from raw parts
//! ([`MatrixError`]) and the inverse-beta lookup table ([`Error`]).

use std::io;
use std::path::PathBuf;

/// Result alias for lookup-table operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the inverse incomplete-beta lookup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `dims` was not an integer >= 1.
    #[error("`dims` must be an integer >= 1, got {value}")]
    InvalidDims { value: String },

    /// Table configuration failed validation.
    #[error("invalid table configuration: {message}")]
    InvalidConfig { message: String },

    /// The reference inverse returned a non-finite value while building.
    #[error("reference inverse returned {value} at dims={dims}, x={x}")]
    Reference { dims: f64, x: f64, value: f64 },

    /// A table could not be encoded into the persisted format.
    #[error("table serialization failed: {message}")]
    Serialization { message: String },

    /// A persisted table could not be read back.
    #[error("persisted table format error: {0}")]
    Format(#[from] FormatError),

    /// Writing a table to disk failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Problems with a persisted lookup-table file.
///
/// Any of these means the file is missing, corrupted, or was written by
/// something else. Callers holding a cache should treat them as a miss.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file too short: need at least {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("invalid magic bytes: expected 'BIT2'")]
    BadMagic,

    #[error("unsupported format version: {found} (supported: {supported})")]
    UnsupportedVersion { found: u8, supported: u8 },

    #[error("checksum mismatch (stored={stored:#x}, computed={computed:#x}): file may be corrupted")]
    ChecksumMismatch { stored: u64, computed: u64 },

    #[error("body decode failed: {0}")]
    Decode(String),

    #[error("value grid has {actual} entries, expected {n_dims} x {n_interp}")]
    ShapeMismatch {
        n_dims: usize,
        n_interp: usize,
        actual: usize,
    },

    #[error("invalid {axis} axis: {message}")]
    InvalidAxis { axis: &'static str, message: String },

    #[error("invalid table values: {0}")]
    InvalidValues(String),
}

/// Errors building a sparse matrix from raw parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    #[error("length mismatch: {what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("index ({row}, {col}) out of bounds for shape ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("index pointer is not non-decreasing or does not end at {expected}")]
    InvalidIndptr { expected: usize },

    #[error("shape ({rows}, {cols}) is not divisible by block shape ({block_rows}, {block_cols})")]
    BlockShape {
        rows: usize,
        cols: usize,
        block_rows: usize,
        block_cols: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dims_message_names_value() {
        let err = Error::InvalidDims {
            value: "2.2".to_string(),
        };
        assert_eq!(err.to_string(), "`dims` must be an integer >= 1, got 2.2");
    }

    #[test]
    fn test_format_error_converts() {
        let err: Error = FormatError::BadMagic.into();
        assert!(matches!(err, Error::Format(FormatError::BadMagic)));
        assert!(err.to_string().contains("BIT2"));
    }

    #[test]
    fn test_serialization_error_is_not_io() {
        let err = Error::Serialization {
            message: "sequence too long".to_string(),
        };
        assert!(!matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "table serialization failed: sequence too long");
    }

    #[test]
    fn test_matrix_error_display() {
        let err = MatrixError::IndexOutOfBounds {
            row: 5,
            col: 1,
            rows: 5,
            cols: 5,
        };
        assert_eq!(err.to_string(), "index (5, 1) out of bounds for shape (5, 5)");
    }
}
