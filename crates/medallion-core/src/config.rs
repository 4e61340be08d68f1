//! Pipeline configuration.
//!
//! Configuration is a small TOML document. Every key is optional:
//!
//! ```toml
//! lakehouse_root = "./lakehouse"
//! source_system = "transaction_system"
//! valid_statuses = ["completed", "pending", "cancelled"]
//! quality_gate = true
//!
//! [silver]
//! discount_policy = "report"      # or "pass-through", "clamp"
//! date_policy = "pass-through"    # or "normalize"
//! ```
//!
//! Unknown keys are rejected so typos do not silently fall back to defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use snafu::prelude::*;

use crate::quality::DEFAULT_VALID_STATUSES;
use crate::silver::SilverOptions;

/// Default tag written to `_source_system`.
pub const DEFAULT_SOURCE_SYSTEM: &str = "transaction_system";

/// Default lakehouse root when none is configured.
pub const DEFAULT_LAKEHOUSE_ROOT: &str = "lakehouse";

/// Errors raised while loading configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[snafu(display("Failed to read config file {}: {source}", path.display()))]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for this schema.
    #[snafu(display("Invalid configuration: {source}"))]
    Parse {
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding the bronze, silver and gold zones.
    pub lakehouse_root: PathBuf,
    /// Tag stamped into `_source_system` on ingestion.
    pub source_system: String,
    /// Statuses accepted by the raw quality gate (case-insensitive).
    pub valid_statuses: Vec<String>,
    /// Run the raw quality checks before ingesting.
    pub quality_gate: bool,
    /// Silver stage policies.
    pub silver: SilverOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lakehouse_root: PathBuf::from(DEFAULT_LAKEHOUSE_ROOT),
            source_system: DEFAULT_SOURCE_SYSTEM.to_string(),
            valid_statuses: DEFAULT_VALID_STATUSES.map(String::from).to_vec(),
            quality_gate: true,
            silver: SilverOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).context(ParseSnafu)
    }

    /// Read and parse a TOML configuration file.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .context(ReadSnafu { path })?;
        Self::from_toml_str(&text)
    }

    /// Same settings with a different lakehouse root.
    pub fn with_lakehouse_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.lakehouse_root = root.into();
        self
    }
}
