//! End-to-end runner: raw file in, three zones out.
//!
//! A run is a straight sequence with no shared state:
//!
//! 1. read the raw Parquet file,
//! 2. run the raw quality gate (unless disabled),
//! 3. bronze: stamp provenance, write `bronze/transactions`,
//! 4. silver: clean and derive, check regressions, write `silver/transactions`,
//! 5. gold: aggregate completed rows, write the three views.
//!
//! The transforms themselves are available without I/O through
//! [`Pipeline::run_batch`].

pub mod report;

use std::path::Path;
use std::time::Instant;

use arrow::array::RecordBatch;
use log::{debug, info};
use snafu::ResultExt;

use crate::bronze::{self, IngestMetadata};
use crate::config::PipelineConfig;
use crate::error::{ConfigSnafu, PipelineResult};
use crate::gold::{self, GoldTables};
use crate::quality::QualityReport;
use crate::silver;
use crate::storage::layout::{self, LakehouseLayout, Zone};
use crate::storage::{StorageLocation, read_parquet_file, write_batch};

pub use report::{RunReport, StageReport};
use report::RunReportBuilder;

/// Batches produced by each stage of one run.
#[derive(Debug, Clone)]
pub struct StageOutputs {
    /// Raw rows with ingestion metadata.
    pub bronze: RecordBatch,
    /// Cleaned rows with derived amounts.
    pub silver: RecordBatch,
    /// Aggregated views over completed rows.
    pub gold: GoldTables,
}

/// Runs the bronze, silver and gold stages under one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    layout: LakehouseLayout,
}

impl Pipeline {
    /// Pipeline writing under `config.lakehouse_root`.
    pub fn new(config: PipelineConfig) -> Self {
        let layout = LakehouseLayout::new(StorageLocation::local(&config.lakehouse_root));
        Self { config, layout }
    }

    /// Pipeline configured from a TOML file.
    pub async fn from_config_file(path: &Path) -> PipelineResult<Self> {
        let config = PipelineConfig::load(path).await.context(ConfigSnafu)?;
        Ok(Self::new(config))
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Where the zones are written.
    pub fn layout(&self) -> &LakehouseLayout {
        &self.layout
    }

    /// Run the raw quality gate against `raw` and return every violation.
    pub fn check_raw(&self, raw: &RecordBatch) -> PipelineResult<QualityReport> {
        QualityReport::raw_gate(raw, &self.config.valid_statuses)
    }

    fn gate_raw(&self, raw: &RecordBatch) -> PipelineResult<()> {
        if !self.config.quality_gate {
            debug!("pipeline: raw quality gate disabled");
            return Ok(());
        }
        self.check_raw(raw)?.into_result()?;
        Ok(())
    }

    fn bronze(&self, raw: &RecordBatch, file_name: &str) -> PipelineResult<RecordBatch> {
        let meta = IngestMetadata::now(self.config.source_system.as_str(), file_name);
        bronze::ingest(raw, &meta)
    }

    fn silver(&self, bronze: &RecordBatch) -> PipelineResult<RecordBatch> {
        let silver = silver::clean(bronze, &self.config.silver)?;
        if self.config.quality_gate {
            QualityReport::silver_regression(&silver)?.into_result()?;
        }
        Ok(silver)
    }

    /// Run every stage on an in-memory raw batch without touching disk.
    ///
    /// `file_name` is recorded in the bronze `_file_name` column.
    pub fn run_batch(&self, raw: &RecordBatch, file_name: &str) -> PipelineResult<StageOutputs> {
        self.gate_raw(raw)?;
        let bronze = self.bronze(raw, file_name)?;
        let silver = self.silver(&bronze)?;
        let gold = gold::aggregate(&silver)?;
        Ok(StageOutputs {
            bronze,
            silver,
            gold,
        })
    }

    /// Read `input`, run every stage and write each zone.
    ///
    /// Zone files are replaced atomically. A failure in a later stage leaves
    /// the earlier zones of this run in place.
    pub async fn run(&self, input: &Path) -> PipelineResult<RunReport> {
        let mut report = RunReportBuilder::new(input);
        let location = self.layout.location();

        let raw = read_parquet_file(input).await?;
        report.set_raw_rows(raw.num_rows());
        info!(
            "pipeline: read {} raw rows from {}",
            raw.num_rows(),
            input.display()
        );
        self.gate_raw(&raw)?;

        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());

        let started = Instant::now();
        let bronze = self.bronze(&raw, &file_name)?;
        write_batch(location, &layout::bronze_rel_path(), &bronze).await?;
        report.push_stage(
            Zone::Bronze.dir_name(),
            bronze.num_rows(),
            self.layout.bronze_path(),
            started.elapsed(),
        );
        info!("pipeline: bronze wrote {} rows", bronze.num_rows());

        let started = Instant::now();
        let silver = self.silver(&bronze)?;
        write_batch(location, &layout::silver_rel_path(), &silver).await?;
        report.push_stage(
            Zone::Silver.dir_name(),
            silver.num_rows(),
            self.layout.silver_path(),
            started.elapsed(),
        );
        info!("pipeline: silver wrote {} rows", silver.num_rows());

        let started = Instant::now();
        let completed = gold::completed_only(&silver)?;
        report.set_completed_rows(completed.num_rows());
        let tables = GoldTables {
            daily_summary: gold::daily_summary(&completed)?,
            customer_metrics: gold::customer_metrics(&completed)?,
            product_metrics: gold::product_metrics(&completed)?,
        };
        for (view, batch) in tables.views() {
            write_batch(location, &layout::gold_rel_path(view), batch).await?;
            report.push_stage(
                &format!("{}/{view}", Zone::Gold),
                batch.num_rows(),
                self.layout.gold_path(view),
                started.elapsed(),
            );
            info!("pipeline: gold {view} wrote {} rows", batch.num_rows());
        }

        let report = report.finish();
        info!("pipeline: finished in {} ms", report.total_ms);
        Ok(report)
    }
}
