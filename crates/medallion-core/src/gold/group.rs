//! Sorted count/sum group-by over Arrow columns.
//!
//! Key columns are encoded with the Arrow row format so that any combination
//! of key types compares as a single byte string. Groups are kept in a
//! `BTreeMap` keyed by the encoded row, which yields them in ascending key
//! order without a separate sort. Rows with a null in any key column belong
//! to no group. The output key columns are
//! gathered with `take` from the first row of each group, so they keep the
//! input's exact Arrow types.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use arrow::array::{Array, ArrayRef, Decimal128Array, Int64Array, UInt64Array};
use arrow::buffer::NullBuffer;
use arrow::compute::take;
use arrow::row::{RowConverter, SortField};
use snafu::prelude::*;

use crate::error::{ArrowSnafu, PipelineResult};
use crate::quality::AmountOverflowSnafu;
use crate::silver::{MONEY_PRECISION, MONEY_SCALE, money};

#[derive(Debug)]
struct Accumulator {
    first_row: u64,
    count: i64,
    sum: i128,
}

/// One output row per distinct key, in ascending key order.
#[derive(Debug)]
pub(crate) struct Grouped {
    pub(crate) keys: Vec<ArrayRef>,
    pub(crate) counts: Int64Array,
    pub(crate) sums: Decimal128Array,
}

/// Count rows and sum `values` per distinct combination of `keys`.
///
/// Rows with a null key are skipped. Every other row counts, including rows
/// whose value is null; null values are left out of the sum. `metric` names
/// the sum column in overflow errors.
pub(crate) fn count_and_sum(
    keys: &[ArrayRef],
    values: &Decimal128Array,
    metric: &str,
) -> PipelineResult<Grouped> {
    let converter = RowConverter::new(
        keys.iter()
            .map(|k| SortField::new(k.data_type().clone()))
            .collect(),
    )
    .context(ArrowSnafu)?;
    let rows = converter.convert_columns(keys).context(ArrowSnafu)?;
    let key_nulls: Vec<NullBuffer> = keys.iter().filter_map(|k| k.logical_nulls()).collect();

    let mut groups: BTreeMap<_, Accumulator> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        if key_nulls.iter().any(|nulls| nulls.is_null(idx)) {
            continue;
        }
        let value = values.is_valid(idx).then(|| values.value(idx));
        let acc = match groups.entry(row.owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Accumulator {
                first_row: idx as u64,
                count: 0,
                sum: 0,
            }),
        };

        acc.count += 1;
        if let Some(v) = value {
            acc.sum = money::checked_add(acc.sum, v).context(AmountOverflowSnafu {
                column: metric,
                row: idx,
            })?;
        }
    }

    let mut first_rows = Vec::with_capacity(groups.len());
    let mut counts = Vec::with_capacity(groups.len());
    let mut sums = Vec::with_capacity(groups.len());
    for acc in groups.into_values() {
        first_rows.push(acc.first_row);
        counts.push(acc.count);
        sums.push(acc.sum);
    }

    let indices = UInt64Array::from(first_rows);
    let keys = keys
        .iter()
        .map(|k| take(k.as_ref(), &indices, None))
        .collect::<Result<Vec<_>, _>>()
        .context(ArrowSnafu)?;
    let sums = Decimal128Array::from(sums)
        .with_precision_and_scale(MONEY_PRECISION, MONEY_SCALE)
        .context(ArrowSnafu)?;

    Ok(Grouped {
        keys,
        counts: Int64Array::from(counts),
        sums,
    })
}
