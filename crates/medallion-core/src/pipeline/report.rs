//! Run summary produced by [`super::Pipeline::run`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// One dataset written during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// Dataset name, for example `bronze` or `gold/daily_summary`.
    pub name: String,
    /// Rows written.
    pub rows: usize,
    /// Absolute path of the written file.
    pub path: PathBuf,
    /// Elapsed wall time in milliseconds, transform and write together.
    pub elapsed_ms: u128,
}

/// Summary of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Raw file the run read from.
    pub input: PathBuf,
    /// Rows in the raw file.
    pub raw_rows: usize,
    /// Rows that passed the `completed` filter for gold.
    pub completed_rows: usize,
    /// Datasets in write order.
    pub stages: Vec<StageReport>,
    /// Total elapsed wall time in milliseconds.
    pub total_ms: u128,
}

impl RunReport {
    /// Rows written for the dataset called `name`, if it was written.
    pub fn rows_for(&self, name: &str) -> Option<usize> {
        self.stages.iter().find(|s| s.name == name).map(|s| s.rows)
    }

    /// Paths of every written file, in write order.
    pub fn written_paths(&self) -> impl Iterator<Item = &Path> {
        self.stages.iter().map(|s| s.path.as_path())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processed {} raw rows from {} in {} ms ({} completed)",
            self.raw_rows,
            self.input.display(),
            self.total_ms,
            self.completed_rows
        )?;
        let width = self.stages.iter().map(|s| s.name.len()).max().unwrap_or(0);
        for stage in &self.stages {
            writeln!(
                f,
                "  {:<width$}  {:>8} rows  {}",
                stage.name,
                stage.rows,
                stage.path.display()
            )?;
        }
        Ok(())
    }
}

/// Collects stage entries while a run is in progress.
#[derive(Debug)]
pub(crate) struct RunReportBuilder {
    start: Instant,
    input: PathBuf,
    raw_rows: usize,
    completed_rows: usize,
    stages: Vec<StageReport>,
}

impl RunReportBuilder {
    /// Start the total timer.
    pub(crate) fn new(input: &Path) -> Self {
        Self {
            start: Instant::now(),
            input: input.to_path_buf(),
            raw_rows: 0,
            completed_rows: 0,
            stages: Vec::new(),
        }
    }

    pub(crate) fn set_raw_rows(&mut self, rows: usize) {
        self.raw_rows = rows;
    }

    pub(crate) fn set_completed_rows(&mut self, rows: usize) {
        self.completed_rows = rows;
    }

    pub(crate) fn push_stage(&mut self, name: &str, rows: usize, path: PathBuf, elapsed: Duration) {
        self.stages.push(StageReport {
            name: name.to_string(),
            rows,
            path,
            elapsed_ms: elapsed.as_millis(),
        });
    }

    pub(crate) fn finish(self) -> RunReport {
        RunReport {
            input: self.input,
            raw_rows: self.raw_rows,
            completed_rows: self.completed_rows,
            stages: self.stages,
            total_ms: self.start.elapsed().as_millis(),
        }
    }
}
