//! Top-level error type and SNAFU context selectors for pipeline operations.
//!
//! Each concern keeps its own error enum next to the code that raises it
//! (`SchemaError` in [`crate::schema`], `DataQualityError` in
//! [`crate::quality`], `StorageError` in [`crate::storage`], `ConfigError` in
//! [`crate::config`]). `PipelineError` is the umbrella returned by the stage
//! transforms and the runner so callers can match on the category.

use arrow::error::ArrowError;
use snafu::prelude::*;

use crate::{
    config::ConfigError, quality::DataQualityError, schema::SchemaError, storage::StorageError,
};

/// Convenience alias for results of pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors from the bronze/silver/gold transforms and the pipeline runner.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PipelineError {
    /// The input batch does not satisfy the column contract.
    #[snafu(display("Schema error: {source}"))]
    Schema {
        /// Underlying schema contract violation.
        source: SchemaError,
    },

    /// An invariant over the data itself was violated and reported.
    #[snafu(display("Data quality error: {source}"))]
    DataQuality {
        /// Underlying data quality violation.
        source: DataQualityError,
    },

    /// Arrow compute or batch construction failed.
    #[snafu(display("Arrow error: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// Reading or writing a zone dataset failed.
    #[snafu(display("Storage error: {source}"))]
    Storage {
        /// Underlying storage error.
        #[snafu(source(from(StorageError, Box::new)))]
        source: Box<StorageError>,
    },

    /// Loading pipeline configuration failed.
    #[snafu(display("Configuration error: {source}"))]
    Config {
        /// Underlying configuration error.
        source: ConfigError,
    },
}

impl From<SchemaError> for PipelineError {
    fn from(source: SchemaError) -> Self {
        PipelineError::Schema { source }
    }
}

impl From<DataQualityError> for PipelineError {
    fn from(source: DataQualityError) -> Self {
        PipelineError::DataQuality { source }
    }
}

impl From<StorageError> for PipelineError {
    fn from(source: StorageError) -> Self {
        PipelineError::Storage {
            source: Box::new(source),
        }
    }
}

impl PipelineError {
    /// Return the data quality violation, if this error carries one.
    pub fn as_data_quality(&self) -> Option<&DataQualityError> {
        match self {
            PipelineError::DataQuality { source } => Some(source),
            _ => None,
        }
    }

    /// Return the schema violation, if this error carries one.
    pub fn as_schema(&self) -> Option<&SchemaError> {
        match self {
            PipelineError::Schema { source } => Some(source),
            _ => None,
        }
    }
}
