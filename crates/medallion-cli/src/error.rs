use std::path::PathBuf;

use arrow::error::ArrowError;
use medallion_core::{PipelineError, config::ConfigError, storage::StorageError};
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Failed to load config {}: {source}", path.display()))]
    LoadConfig { path: PathBuf, source: ConfigError },

    #[snafu(display("Failed to read {}: {source}", path.display()))]
    ReadInput {
        path: PathBuf,
        #[snafu(source(from(StorageError, Box::new)))]
        source: Box<StorageError>,
    },

    #[snafu(display("Pipeline run on {} failed: {source}", input.display()))]
    RunPipeline {
        input: PathBuf,
        #[snafu(source(from(PipelineError, Box::new)))]
        source: Box<PipelineError>,
    },

    #[snafu(display(
        "Cannot check {}: {source}. \
         Ensure the file has the raw transaction columns.",
        input.display()
    ))]
    CheckInput {
        input: PathBuf,
        #[snafu(source(from(PipelineError, Box::new)))]
        source: Box<PipelineError>,
    },

    #[snafu(display("{count} data quality checks failed for {}", input.display()))]
    ValidationFailed { input: PathBuf, count: usize },

    #[snafu(display("Failed to render batch: {source}"))]
    Render { source: ArrowError },
}
