//! Bronze ingestion: stamp raw rows with provenance metadata.
//!
//! Bronze does not interpret values. Every raw column is carried over as the very
//! same Arrow array (no copy, no cast, no validation), and three metadata
//! columns are appended:
//!
//! - `_ingestion_timestamp`: `Timestamp(Microsecond, "UTC")`
//! - `_source_system`: `Utf8`
//! - `_file_name`: `Utf8`
//!
//! Malformed business values pass through untouched; cleaning is the silver
//! stage's job. The only thing rejected here is a batch that already carries
//! one of the metadata column names, since stamping it again would produce
//! duplicate fields.

use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use chrono::{DateTime, Utc};
use log::debug;
use snafu::prelude::*;

use crate::error::{ArrowSnafu, PipelineResult};
use crate::schema::{self, FILE_NAME, INGESTION_TIMESTAMP, SOURCE_SYSTEM};

/// Timezone recorded on the ingestion timestamp column.
pub const INGESTION_TIMEZONE: &str = "UTC";

/// Provenance stamped onto every bronze row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestMetadata {
    /// Wall-clock time of ingestion.
    pub ingested_at: DateTime<Utc>,
    /// Tag of the producing system (for example `transaction_system`).
    pub source_system: String,
    /// Name of the raw file the batch was read from.
    pub file_name: String,
}

impl IngestMetadata {
    /// Build metadata with an explicit ingestion time.
    pub fn new(
        ingested_at: DateTime<Utc>,
        source_system: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            ingested_at,
            source_system: source_system.into(),
            file_name: file_name.into(),
        }
    }

    /// Build metadata stamped with the current time.
    pub fn now(source_system: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self::new(Utc::now(), source_system, file_name)
    }
}

fn metadata_fields() -> [Field; 3] {
    [
        Field::new(
            INGESTION_TIMESTAMP,
            DataType::Timestamp(TimeUnit::Microsecond, Some(INGESTION_TIMEZONE.into())),
            false,
        ),
        Field::new(SOURCE_SYSTEM, DataType::Utf8, false),
        Field::new(FILE_NAME, DataType::Utf8, false),
    ]
}

/// Append provenance columns to an unmodified copy of `raw`.
///
/// Row count and order are preserved. Raw schema-level metadata is kept.
pub fn ingest(raw: &RecordBatch, meta: &IngestMetadata) -> PipelineResult<RecordBatch> {
    schema::ensure_no_reserved_columns(&raw.schema())?;

    let rows = raw.num_rows();
    let ts = meta.ingested_at.timestamp_micros();

    let ingested_at: ArrayRef = Arc::new(
        TimestampMicrosecondArray::from(vec![ts; rows]).with_timezone(INGESTION_TIMEZONE),
    );
    let source_system: ArrayRef = Arc::new(StringArray::from(vec![
        meta.source_system.as_str();
        rows
    ]));
    let file_name: ArrayRef = Arc::new(StringArray::from(vec![meta.file_name.as_str(); rows]));

    let raw_schema = raw.schema();
    let fields: Vec<Field> = raw_schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .chain(metadata_fields())
        .collect();
    let schema = Schema::new_with_metadata(fields, raw_schema.metadata().clone());

    let mut columns = raw.columns().to_vec();
    columns.extend([ingested_at, source_system, file_name]);

    let bronze = RecordBatch::try_new(Arc::new(schema), columns).context(ArrowSnafu)?;

    debug!(
        "bronze: stamped {rows} rows from {} (source_system={})",
        meta.file_name, meta.source_system
    );
    Ok(bronze)
}
