//! Data quality checks over raw and cleaned batches.
//!
//! These are standalone predicates, not part of the transforms. Each check
//! inspects one invariant and returns `Ok(())` or a [`DataQualityError`]
//! describing how many rows violate it and which ones (the first
//! [`MAX_SAMPLE_ROWS`]). Nothing here modifies data.
//!
//! Raw gates (run before ingestion):
//! - transaction ids are unique,
//! - quantities and unit prices are strictly positive,
//! - statuses belong to the valid set, case-insensitively,
//! - discounts are within `[0, 100]` where present.
//!
//! Silver regression checks (run on cleaned output):
//! - no null discounts,
//! - `net_amount <= gross_amount` for rows with an in-range discount,
//! - customer ids are already normalized.
//!
//! [`QualityReport`] runs a group of checks and keeps every violation rather
//! than stopping at the first.

use std::collections::HashSet;
use std::fmt;

use arrow::array::{Array, AsArray, Float64Array, RecordBatch};
use arrow::datatypes::Decimal128Type;
use log::debug;
use snafu::prelude::*;

use crate::error::{PipelineError, PipelineResult};
use crate::schema::{
    self, CUSTOMER_ID, DISCOUNT_PCT, GROSS_AMOUNT, NET_AMOUNT, QUANTITY, STATUS, TRANSACTION_ID,
    UNIT_PRICE,
};
use crate::silver::{money_type, normalize_customer_id};

/// Maximum number of row indices or values carried in an error.
pub const MAX_SAMPLE_ROWS: usize = 5;

/// Statuses accepted by default.
pub const DEFAULT_VALID_STATUSES: [&str; 3] = ["completed", "pending", "cancelled"];

/// Invariant violations found in a batch.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DataQualityError {
    /// Some transaction ids occur more than once (or are null).
    #[snafu(display("{count} duplicate or null transaction ids (e.g. {examples:?})"))]
    DuplicateTransactionIds {
        /// Number of rows whose id was already seen or is null.
        count: usize,
        /// Sample of offending ids.
        examples: Vec<String>,
    },

    /// Some quantities are zero, negative or null.
    #[snafu(display("{count} rows with non-positive quantity (rows {rows:?})"))]
    NonPositiveQuantity {
        /// Number of offending rows.
        count: usize,
        /// Sample of offending row indices.
        rows: Vec<usize>,
    },

    /// Some unit prices are zero, negative or null.
    #[snafu(display("{count} rows with non-positive unit price (rows {rows:?})"))]
    NonPositivePrice {
        /// Number of offending rows.
        count: usize,
        /// Sample of offending row indices.
        rows: Vec<usize>,
    },

    /// Some statuses are outside the valid set.
    #[snafu(display("{count} rows with invalid status (e.g. {values:?}); valid: {valid:?}"))]
    InvalidStatus {
        /// Number of offending rows.
        count: usize,
        /// Sample of offending values.
        values: Vec<String>,
        /// The accepted statuses.
        valid: Vec<String>,
    },

    /// Some discounts fall outside `[0, 100]`.
    #[snafu(display("{count} rows with discount outside [0, 100] (rows {rows:?})"))]
    DiscountOutOfRange {
        /// Number of offending rows.
        count: usize,
        /// Sample of offending row indices.
        rows: Vec<usize>,
    },

    /// Cleaned output still has null discounts.
    #[snafu(display("{count} rows with null discount_pct after cleaning"))]
    NullDiscount {
        /// Number of null discounts.
        count: usize,
    },

    /// Net amount exceeds gross amount for an in-range discount.
    #[snafu(display("{count} rows with net_amount above gross_amount (rows {rows:?})"))]
    NetAboveGross {
        /// Number of offending rows.
        count: usize,
        /// Sample of offending row indices.
        rows: Vec<usize>,
    },

    /// Cleaned customer ids are not in normalized form.
    #[snafu(display("{count} customer ids are not normalized (e.g. {values:?})"))]
    CustomerIdNotNormalized {
        /// Number of offending rows.
        count: usize,
        /// Sample of offending values.
        values: Vec<String>,
    },

    /// A date string matched none of the accepted layouts.
    #[snafu(display("Unparseable transaction_date {value:?} at row {row}"))]
    UnparseableDate {
        /// Row index of the value.
        row: usize,
        /// The raw string.
        value: String,
    },

    /// A derived money value does not fit `Decimal128(38, 4)`.
    #[snafu(display("Overflow computing {column} at row {row}"))]
    AmountOverflow {
        /// Derived column being computed.
        column: String,
        /// Row index.
        row: usize,
    },

    /// Several checks failed.
    #[snafu(display("{} data quality checks failed: {}", violations.len(), Joined(violations)))]
    Multiple {
        /// Each failed check.
        violations: Vec<DataQualityError>,
    },
}

struct Joined<'a>(&'a [DataQualityError]);

impl fmt::Display for Joined<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

/// First [`MAX_SAMPLE_ROWS`] entries of `rows`.
pub(crate) fn sample_rows(rows: &[usize]) -> Vec<usize> {
    rows.iter().take(MAX_SAMPLE_ROWS).copied().collect()
}

/// Row indices of discounts outside `[0, 100]`. Null and NaN are missing
/// values, not violations.
pub(crate) fn discount_violations(discounts: &Float64Array) -> Vec<usize> {
    discounts
        .iter()
        .enumerate()
        .filter_map(|(row, v)| match v {
            Some(x) if !x.is_nan() && !(0.0..=100.0).contains(&x) => Some(row),
            _ => None,
        })
        .collect()
}

fn non_positive_rows<I, T>(values: I, zero: T) -> Vec<usize>
where
    I: IntoIterator<Item = Option<T>>,
    T: PartialOrd,
{
    values
        .into_iter()
        .enumerate()
        .filter_map(|(row, v)| match v {
            Some(x) if x > zero => None,
            _ => Some(row),
        })
        .collect()
}

/// Transaction ids must be unique and non-null.
pub fn check_unique_transaction_ids(batch: &RecordBatch) -> PipelineResult<()> {
    let ids = schema::string_column(batch, TRANSACTION_ID)?;
    let mut seen = HashSet::with_capacity(ids.len());
    let mut offenders = Vec::new();

    for id in ids.iter() {
        match id {
            Some(id) if seen.insert(id) => {}
            Some(id) => offenders.push(id.to_string()),
            None => offenders.push("<null>".to_string()),
        }
    }

    ensure!(
        offenders.is_empty(),
        DuplicateTransactionIdsSnafu {
            count: offenders.len(),
            examples: offenders.iter().take(MAX_SAMPLE_ROWS).cloned().collect::<Vec<_>>(),
        }
    );
    Ok(())
}

/// Quantities must be strictly positive (null counts as a violation).
pub fn check_positive_quantities(batch: &RecordBatch) -> PipelineResult<()> {
    let quantity = schema::int64_column(batch, QUANTITY)?;
    let rows = non_positive_rows(quantity.iter(), 0);
    ensure!(
        rows.is_empty(),
        NonPositiveQuantitySnafu {
            count: rows.len(),
            rows: sample_rows(&rows),
        }
    );
    Ok(())
}

/// Unit prices must be strictly positive (null counts as a violation).
pub fn check_positive_prices(batch: &RecordBatch) -> PipelineResult<()> {
    let price = schema::float64_column(batch, UNIT_PRICE)?;
    let rows = non_positive_rows(price.iter(), 0.0);
    ensure!(
        rows.is_empty(),
        NonPositivePriceSnafu {
            count: rows.len(),
            rows: sample_rows(&rows),
        }
    );
    Ok(())
}

/// Statuses must be in `valid`, compared case-insensitively. Null is invalid.
pub fn check_valid_statuses<S: AsRef<str>>(batch: &RecordBatch, valid: &[S]) -> PipelineResult<()> {
    let valid: Vec<String> = valid.iter().map(|s| s.as_ref().to_lowercase()).collect();
    let statuses = schema::string_column(batch, STATUS)?;

    let offenders: Vec<String> = statuses
        .iter()
        .filter_map(|status| match status {
            Some(s) if valid.contains(&s.to_lowercase()) => None,
            Some(s) => Some(s.to_string()),
            None => Some("<null>".to_string()),
        })
        .collect();

    ensure!(
        offenders.is_empty(),
        InvalidStatusSnafu {
            count: offenders.len(),
            values: offenders.iter().take(MAX_SAMPLE_ROWS).cloned().collect::<Vec<_>>(),
            valid,
        }
    );
    Ok(())
}

/// Discounts, where present, must lie in `[0, 100]`. NaN counts as absent.
pub fn check_discount_range(batch: &RecordBatch) -> PipelineResult<()> {
    let discounts = schema::float64_column(batch, DISCOUNT_PCT)?;
    let rows = discount_violations(&discounts);
    ensure!(
        rows.is_empty(),
        DiscountOutOfRangeSnafu {
            count: rows.len(),
            rows: sample_rows(&rows),
        }
    );
    Ok(())
}

/// Cleaned batches must have no null discounts.
pub fn check_no_null_discounts(batch: &RecordBatch) -> PipelineResult<()> {
    let nulls = schema::column(batch, DISCOUNT_PCT)?.null_count();
    ensure!(nulls == 0, NullDiscountSnafu { count: nulls });
    Ok(())
}

/// `net_amount <= gross_amount` for every row whose discount is in `[0, 100]`.
///
/// Rows with out-of-range discounts are skipped; they are the concern of
/// [`check_discount_range`].
pub fn check_net_not_above_gross(batch: &RecordBatch) -> PipelineResult<()> {
    let money = money_type();
    let gross = schema::cast_array(schema::column(batch, GROSS_AMOUNT)?, GROSS_AMOUNT, &money)?;
    let net = schema::cast_array(schema::column(batch, NET_AMOUNT)?, NET_AMOUNT, &money)?;
    let gross = gross.as_primitive::<Decimal128Type>();
    let net = net.as_primitive::<Decimal128Type>();
    let discounts = schema::float64_column(batch, DISCOUNT_PCT)?;

    let rows: Vec<usize> = (0..batch.num_rows())
        .filter(|&row| {
            let in_range =
                discounts.is_valid(row) && (0.0..=100.0).contains(&discounts.value(row));
            in_range && gross.is_valid(row) && net.is_valid(row) && net.value(row) > gross.value(row)
        })
        .collect();

    ensure!(
        rows.is_empty(),
        NetAboveGrossSnafu {
            count: rows.len(),
            rows: sample_rows(&rows),
        }
    );
    Ok(())
}

/// Cleaned customer ids must equal their own normalized form.
pub fn check_customer_ids_normalized(batch: &RecordBatch) -> PipelineResult<()> {
    let ids = schema::string_column(batch, CUSTOMER_ID)?;
    let offenders: Vec<String> = ids
        .iter()
        .flatten()
        .filter(|id| normalize_customer_id(id) != *id)
        .map(str::to_string)
        .collect();

    ensure!(
        offenders.is_empty(),
        CustomerIdNotNormalizedSnafu {
            count: offenders.len(),
            values: offenders.iter().take(MAX_SAMPLE_ROWS).cloned().collect::<Vec<_>>(),
        }
    );
    Ok(())
}

/// Outcome of running a group of checks.
#[derive(Debug, Default)]
pub struct QualityReport {
    violations: Vec<DataQualityError>,
}

impl QualityReport {
    /// Record the outcome of one check. Data quality failures are kept;
    /// any other error (missing column, cast failure) is returned.
    fn record(&mut self, outcome: PipelineResult<()>) -> PipelineResult<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(PipelineError::DataQuality { source }) => {
                debug!("quality: {source}");
                self.violations.push(source);
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    /// Run every raw gate against `batch`.
    pub fn raw_gate<S: AsRef<str>>(batch: &RecordBatch, valid_statuses: &[S]) -> PipelineResult<Self> {
        let mut report = Self::default();
        report.record(check_unique_transaction_ids(batch))?;
        report.record(check_positive_quantities(batch))?;
        report.record(check_positive_prices(batch))?;
        report.record(check_valid_statuses(batch, valid_statuses))?;
        report.record(check_discount_range(batch))?;
        Ok(report)
    }

    /// Run every silver regression check against `batch`.
    pub fn silver_regression(batch: &RecordBatch) -> PipelineResult<Self> {
        let mut report = Self::default();
        report.record(check_no_null_discounts(batch))?;
        report.record(check_net_not_above_gross(batch))?;
        report.record(check_customer_ids_normalized(batch))?;
        Ok(report)
    }

    /// True when no check failed.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// The recorded violations, in check order.
    pub fn violations(&self) -> &[DataQualityError] {
        &self.violations
    }

    /// `Ok` when clean; the single violation, or [`DataQualityError::Multiple`].
    pub fn into_result(mut self) -> Result<(), DataQualityError> {
        match self.violations.len() {
            0 => Ok(()),
            1 => Err(self.violations.remove(0)),
            _ => Err(DataQualityError::Multiple {
                violations: self.violations,
            }),
        }
    }
}
