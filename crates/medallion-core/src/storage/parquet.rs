//! Parquet encoding of zone datasets.
//!
//! Each dataset is a single Parquet file holding one logical batch. The Arrow
//! schema is embedded by the writer, so types such as `Decimal128(38, 4)` and
//! `Timestamp(Microsecond, "UTC")` survive a round trip exactly. On read, all
//! row groups are concatenated back into one batch; a file with no rows yields
//! an empty batch carrying the file schema.

use std::path::Path;

use ::parquet::arrow::ArrowWriter;
use ::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use ::parquet::basic::Compression;
use ::parquet::file::properties::WriterProperties;
use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use bytes::Bytes;
use log::debug;
use snafu::prelude::*;

use crate::storage::error::{ArrowReadSnafu, ParquetDecodeSnafu, ParquetEncodeSnafu};
use crate::storage::{StorageLocation, StorageResult, join_local, read_file, write_atomic};

const IN_MEMORY: &str = "<memory>";

fn encode(batch: &RecordBatch, path: &str) -> StorageResult<Vec<u8>> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))
        .context(ParquetEncodeSnafu { path })?;
    writer.write(batch).context(ParquetEncodeSnafu { path })?;
    writer.close().context(ParquetEncodeSnafu { path })?;
    Ok(buf)
}

fn decode(bytes: Bytes, path: &str) -> StorageResult<RecordBatch> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(bytes).context(ParquetDecodeSnafu { path })?;
    let schema = builder.schema().clone();
    let reader = builder.build().context(ParquetDecodeSnafu { path })?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .context(ArrowReadSnafu { path })?;
    concat_batches(&schema, &batches).context(ArrowReadSnafu { path })
}

/// Encode `batch` as an in-memory Parquet file (Snappy-compressed).
pub fn encode_parquet(batch: &RecordBatch) -> StorageResult<Vec<u8>> {
    encode(batch, IN_MEMORY)
}

/// Decode an in-memory Parquet file into a single batch.
pub fn decode_parquet(bytes: impl Into<Bytes>) -> StorageResult<RecordBatch> {
    decode(bytes.into(), IN_MEMORY)
}

/// Encode `batch` and write it atomically to `rel_path` under `location`.
pub async fn write_batch(
    location: &StorageLocation,
    rel_path: &Path,
    batch: &RecordBatch,
) -> StorageResult<()> {
    let abs = join_local(location, rel_path);
    let bytes = encode(batch, &abs.display().to_string())?;
    write_atomic(location, rel_path, &bytes).await?;
    debug!(
        "storage: wrote {} rows ({} bytes) to {}",
        batch.num_rows(),
        bytes.len(),
        abs.display()
    );
    Ok(())
}

/// Read the dataset at `rel_path` under `location`.
///
/// A missing file is [`super::StorageError::NotFound`].
pub async fn read_batch(location: &StorageLocation, rel_path: &Path) -> StorageResult<RecordBatch> {
    read_parquet_file(&join_local(location, rel_path)).await
}

/// Read a Parquet file from an arbitrary local path.
pub async fn read_parquet_file(path: &Path) -> StorageResult<RecordBatch> {
    let bytes = read_file(path).await?;
    let batch = decode(Bytes::from(bytes), &path.display().to_string())?;
    debug!("storage: read {} rows from {}", batch.num_rows(), path.display());
    Ok(batch)
}
