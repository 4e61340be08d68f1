//! Core engine for a bronze/silver/gold transaction pipeline.
//!
//! Raw transaction batches move through three zones, each persisted as a
//! Parquet file under a lakehouse root:
//!
//! - `bronze`: raw rows unchanged, stamped with ingestion metadata.
//! - `silver`: standardized fields plus derived gross/discount/net amounts.
//! - `gold`: per-day/region, per-customer and per-product aggregates over
//!   completed transactions.
//!
//! The stage transforms are synchronous functions over Arrow
//! `RecordBatch`es (`bronze`, `silver`, `gold` modules). `quality` holds
//! standalone invariant checks, `storage` the zone layout and Parquet I/O,
//! and `pipeline` a runner that chains everything for one input file.
//!
//! The `medallion` CLI crate is a thin layer over this one.
#![deny(missing_docs)]
pub mod bronze;
pub mod config;
pub mod error;
pub mod gold;
pub mod pipeline;
pub mod quality;
pub mod schema;
pub mod silver;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_util;

pub use error::{PipelineError, PipelineResult};
