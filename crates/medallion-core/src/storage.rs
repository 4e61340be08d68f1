//! Filesystem access for the lakehouse zones.
//!
//! This module owns every byte that goes to or comes from disk:
//!
//! - [`StorageLocation`] names the lakehouse root (local filesystem only).
//! - [`write_atomic`] writes a payload next to its target and renames it into
//!   place, so readers never observe a half-written dataset.
//! - [`read_all_bytes`] reads a whole file, mapping a missing file to
//!   [`StorageError::NotFound`].
//! - [`layout`] maps zones and dataset names to relative paths.
//! - [`parquet`] encodes and decodes record batches.
//!
//! Higher layers work with relative paths under a location and never join
//! strings by hand.

pub mod error;
pub mod layout;
pub mod parquet;

use std::{
    io,
    path::{Path, PathBuf},
};

use snafu::prelude::*;
use tokio::{fs, io::AsyncWriteExt};

pub use error::StorageError;
pub(crate) use error::{InvalidLocationSnafu, IoSnafu, NotFoundSnafu};
pub use layout::{LakehouseLayout, Zone};
pub use self::parquet::{
    decode_parquet, encode_parquet, read_batch, read_parquet_file, write_batch,
};

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Root of a lakehouse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageLocation {
    /// A lakehouse stored on the local filesystem at the given path.
    Local(PathBuf),
}

impl StorageLocation {
    /// Creates a new `StorageLocation` for a local filesystem path.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        StorageLocation::Local(root.into())
    }

    /// Parse a user-facing location string.
    ///
    /// Plain paths and `file://` URLs are accepted. Blank strings and other
    /// URL schemes are rejected.
    pub fn parse(spec: &str) -> StorageResult<Self> {
        let trimmed = spec.trim();
        ensure!(
            !trimmed.is_empty(),
            InvalidLocationSnafu {
                spec,
                reason: "location is empty",
            }
        );

        if let Some(path) = trimmed.strip_prefix("file://") {
            return Ok(StorageLocation::local(path));
        }
        if let Some((scheme, _)) = trimmed.split_once("://") {
            return InvalidLocationSnafu {
                spec,
                reason: format!("unsupported scheme {scheme:?}"),
            }
            .fail();
        }
        Ok(StorageLocation::local(trimmed))
    }

    /// Absolute local path for `rel` under this location.
    pub fn resolve(&self, rel: &Path) -> PathBuf {
        join_local(self, rel)
    }
}

pub(crate) fn join_local(location: &StorageLocation, rel: &Path) -> PathBuf {
    match location {
        StorageLocation::Local(root) => root.join(rel),
    }
}

pub(crate) async fn ensure_parent_dirs(abs: &Path) -> StorageResult<()> {
    let Some(parent) = abs.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent).await.context(IoSnafu {
        path: parent.display().to_string(),
    })
}

/// A staged file that is deleted when dropped, unless it was committed.
struct StagedFile {
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    fn at(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    async fn fill(&self, contents: &[u8]) -> StorageResult<()> {
        let io_context = || IoSnafu {
            path: self.path.display().to_string(),
        };
        let mut file = fs::File::create(&self.path).await.context(io_context())?;
        file.write_all(contents).await.context(io_context())?;
        file.sync_all().await.context(io_context())
    }

    /// Move the staged file onto `target`.
    async fn commit(mut self, target: &Path) -> StorageResult<()> {
        fs::rename(&self.path, target).await.context(IoSnafu {
            path: target.display().to_string(),
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Write `contents` to `rel_path` inside `location`, replacing any existing
/// file atomically.
///
/// Bytes are staged in `<target>.tmp`, synced, then renamed over the target.
/// Missing parent directories are created. If any step fails the staged file
/// is deleted and an existing target keeps its old contents.
pub async fn write_atomic(
    location: &StorageLocation,
    rel_path: &Path,
    contents: &[u8],
) -> StorageResult<()> {
    let target = join_local(location, rel_path);
    ensure_parent_dirs(&target).await?;

    let staged = StagedFile::at(target.with_extension("tmp"));
    staged.fill(contents).await?;
    staged.commit(&target).await
}

pub(crate) async fn read_file(abs: &Path) -> StorageResult<Vec<u8>> {
    let path = abs.display().to_string();
    match fs::read(abs).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(e).context(NotFoundSnafu { path }),
        other => other.context(IoSnafu { path }),
    }
}

/// Read the full contents of `rel_path` within `location`.
///
/// A missing file is [`StorageError::NotFound`]; any other failure is
/// [`StorageError::Io`].
pub async fn read_all_bytes(location: &StorageLocation, rel_path: &Path) -> StorageResult<Vec<u8>> {
    read_file(&join_local(location, rel_path)).await
}
