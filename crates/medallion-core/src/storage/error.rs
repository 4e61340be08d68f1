//! Error types for zone storage.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use snafu::{Backtrace, prelude::*};

/// Failures while moving zone datasets between memory and disk.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// No file exists at the requested path.
    #[snafu(display("No such file: {path}"))]
    NotFound {
        /// Absolute path that was looked up.
        path: String,
        /// The `io::ErrorKind::NotFound` error from the filesystem.
        source: io::Error,
        /// Captured where the lookup failed.
        backtrace: Backtrace,
    },

    /// Any other filesystem failure.
    #[snafu(display("Filesystem error on {path}: {source}"))]
    Io {
        /// Path being read, written, created or renamed.
        path: String,
        /// Error reported by the operating system.
        source: io::Error,
        /// Captured where the operation failed.
        backtrace: Backtrace,
    },

    /// A storage location string could not be interpreted.
    #[snafu(display("Invalid storage location {spec:?}: {reason}"))]
    InvalidLocation {
        /// The location as given.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Encoding a batch as Parquet failed.
    #[snafu(display("Failed to encode Parquet for {path}: {source}"))]
    ParquetEncode {
        /// Destination the bytes were meant for.
        path: String,
        /// Underlying Parquet writer error.
        source: ParquetError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Decoding Parquet bytes failed.
    #[snafu(display("Failed to decode Parquet from {path}: {source}"))]
    ParquetDecode {
        /// Where the bytes came from.
        path: String,
        /// Underlying Parquet reader error.
        source: ParquetError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Reading or assembling decoded record batches failed.
    #[snafu(display("Failed to read record batches from {path}: {source}"))]
    ArrowRead {
        /// Where the bytes came from.
        path: String,
        /// Underlying Arrow error.
        source: ArrowError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

impl StorageError {
    /// True when the error means the target path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
