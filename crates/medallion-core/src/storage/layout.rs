//! On-disk layout of a lakehouse root.
//!
//! ```text
//! <root>/
//!   bronze/transactions/transactions.parquet
//!   silver/transactions/transactions.parquet
//!   gold/daily_summary/daily_summary.parquet
//!   gold/customer_metrics/customer_metrics.parquet
//!   gold/product_metrics/product_metrics.parquet
//! ```
//!
//! The free functions return *relative* paths. [`LakehouseLayout`] pairs them
//! with a [`StorageLocation`] for callers that need absolute paths.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::gold::{CUSTOMER_METRICS, DAILY_SUMMARY, PRODUCT_METRICS};
use crate::storage::StorageLocation;

/// Extension of every dataset file.
pub const PARQUET_EXT: &str = "parquet";

/// Dataset name of the bronze and silver transaction tables.
pub const TRANSACTIONS_DATASET: &str = "transactions";

/// A top-level directory holding one stage's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Raw rows plus ingestion metadata.
    Bronze,
    /// Cleaned and enriched rows.
    Silver,
    /// Business aggregates.
    Gold,
}

impl Zone {
    /// Directory name of the zone under the lakehouse root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Zone::Bronze => "bronze",
            Zone::Silver => "silver",
            Zone::Gold => "gold",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Relative directory: `<zone>/<dataset>/`
pub fn dataset_rel_dir(zone: Zone, dataset: &str) -> PathBuf {
    Path::new(zone.dir_name()).join(dataset)
}

/// Relative path: `<zone>/<dataset>/<dataset>.parquet`
pub fn dataset_rel_path(zone: Zone, dataset: &str) -> PathBuf {
    dataset_rel_dir(zone, dataset).join(format!("{dataset}.{PARQUET_EXT}"))
}

/// Relative path: `bronze/transactions/transactions.parquet`
pub fn bronze_rel_path() -> PathBuf {
    dataset_rel_path(Zone::Bronze, TRANSACTIONS_DATASET)
}

/// Relative path: `silver/transactions/transactions.parquet`
pub fn silver_rel_path() -> PathBuf {
    dataset_rel_path(Zone::Silver, TRANSACTIONS_DATASET)
}

/// Relative path: `gold/<view>/<view>.parquet`
pub fn gold_rel_path(view: &str) -> PathBuf {
    dataset_rel_path(Zone::Gold, view)
}

/// Names of the gold views, in write order.
pub const GOLD_VIEWS: [&str; 3] = [DAILY_SUMMARY, CUSTOMER_METRICS, PRODUCT_METRICS];

/// A lakehouse root together with its path conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LakehouseLayout {
    location: StorageLocation,
}

impl LakehouseLayout {
    /// Layout rooted at `location`.
    pub fn new(location: StorageLocation) -> Self {
        Self { location }
    }

    /// Layout rooted at a local directory.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(StorageLocation::local(root))
    }

    /// The root location.
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Absolute directory of `zone`.
    pub fn zone_dir(&self, zone: Zone) -> PathBuf {
        self.location.resolve(Path::new(zone.dir_name()))
    }

    /// Absolute path of the bronze transactions file.
    pub fn bronze_path(&self) -> PathBuf {
        self.location.resolve(&bronze_rel_path())
    }

    /// Absolute path of the silver transactions file.
    pub fn silver_path(&self) -> PathBuf {
        self.location.resolve(&silver_rel_path())
    }

    /// Absolute path of a gold view file.
    pub fn gold_path(&self, view: &str) -> PathBuf {
        self.location.resolve(&gold_rel_path(view))
    }
}
