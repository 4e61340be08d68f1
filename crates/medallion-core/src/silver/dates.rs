//! Opt-in normalization of heterogeneous transaction dates.
//!
//! Only used when [`super::DatePolicy::Normalize`] is selected; by default the
//! silver stage leaves dates exactly as they arrived.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Date32Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type};
use chrono::NaiveDate;
use snafu::prelude::*;

use crate::error::{ArrowSnafu, PipelineResult};
use crate::quality::DataQualityError;

/// Accepted string layouts, tried in order.
///
/// Month-first is tried before day-first for slash-separated dates, so
/// `01/02/2024` is read as January 2nd.
pub const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a date string in any of [`DATE_FORMATS`].
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Convert a date-like column into a canonical `Date32` column.
///
/// Strings are parsed with [`parse_date`]; date and timestamp columns are cast.
/// Nulls stay null. The first unparseable string is reported.
pub(crate) fn normalize_dates(column: &ArrayRef) -> PipelineResult<ArrayRef> {
    match column.data_type() {
        DataType::Date32 => Ok(column.clone()),
        DataType::Date64 | DataType::Timestamp(_, _) => {
            cast(column, &DataType::Date32).context(ArrowSnafu)
        }
        _ => {
            let strings = cast(column, &DataType::Utf8).context(ArrowSnafu)?;
            let strings = strings.as_string::<i32>();

            let mut days = Vec::with_capacity(strings.len());
            for (row, value) in strings.iter().enumerate() {
                let parsed = match value {
                    None => None,
                    Some(raw) => {
                        let date = parse_date(raw).ok_or_else(|| {
                            DataQualityError::UnparseableDate {
                                row,
                                value: raw.to_string(),
                            }
                        })?;
                        Some(Date32Type::from_naive_date(date))
                    }
                };
                days.push(parsed);
            }

            Ok(Arc::new(Date32Array::from(days)))
        }
    }
}
