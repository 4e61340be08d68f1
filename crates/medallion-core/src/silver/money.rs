//! Fixed-point money arithmetic for the silver derived columns.
//!
//! Amounts are stored as `Decimal128(38, 4)`: an `i128` holding the value
//! multiplied by `10^4`. The derivation is
//!
//! ```text
//! gross    = quantity * unit_price                      (exact)
//! discount = round_half_away(gross * discount_pct / 100) (to scale 4)
//! net      = gross - discount                           (exact)
//! ```
//!
//! `discount_pct` enters as a scale-4 decimal too, so it is rounded to four
//! decimal places first: 12.34567 % is applied as 12.3457 %.
//!
//! Because `gross` is already an integer at scale 4 and rounding never moves
//! a value past the nearest representable neighbour, `0 <= discount <= gross`
//! holds exactly whenever `0 <= discount_pct <= 100` and `gross >= 0`, so
//! `net <= gross` is not subject to float error.

use arrow::array::{Array, Decimal128Array, Int64Array};
use arrow::datatypes::DataType;
use snafu::prelude::*;

use crate::error::{ArrowSnafu, PipelineResult};
use crate::quality::DataQualityError;
use crate::schema::{DISCOUNT_AMOUNT, GROSS_AMOUNT, NET_AMOUNT};

/// Total decimal digits of every money column.
pub const MONEY_PRECISION: u8 = 38;
/// Digits after the decimal point of every money column.
pub const MONEY_SCALE: i8 = 4;

const SCALE_FACTOR: i128 = 10_000;
// Largest magnitude representable with 38 digits.
const MAX_RAW: i128 = 99_999_999_999_999_999_999_999_999_999_999_999_999;

/// Arrow type used for unit prices and all derived money columns.
pub fn money_type() -> DataType {
    DataType::Decimal128(MONEY_PRECISION, MONEY_SCALE)
}

/// Convert a scaled raw money value to `f64` (for logging and tests).
pub fn raw_to_f64(raw: i128) -> f64 {
    raw as f64 / SCALE_FACTOR as f64
}

/// Divide rounding half away from zero.
fn div_round(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator.abs() {
        quotient + numerator.signum() * denominator.signum()
    } else {
        quotient
    }
}

fn in_range(value: i128) -> Option<i128> {
    (value.abs() <= MAX_RAW).then_some(value)
}

/// Add two raw money values, `None` if the result leaves 38 digits.
pub(crate) fn checked_add(a: i128, b: i128) -> Option<i128> {
    a.checked_add(b).and_then(in_range)
}

/// The three derived money columns for a batch.
#[derive(Debug)]
pub(crate) struct DerivedAmounts {
    pub(crate) gross: Decimal128Array,
    pub(crate) discount: Decimal128Array,
    pub(crate) net: Decimal128Array,
}

/// One row's `(gross, discount, net)` in raw scaled units.
///
/// Returns the name of the column whose computation overflowed on failure.
fn derive_row(
    quantity: i64,
    unit_price: i128,
    discount_pct: i128,
) -> Result<(i128, i128, i128), &'static str> {
    let gross = i128::from(quantity)
        .checked_mul(unit_price)
        .and_then(in_range)
        .ok_or(GROSS_AMOUNT)?;

    let discount = gross
        .checked_mul(discount_pct)
        .map(|scaled| div_round(scaled, 100 * SCALE_FACTOR))
        .and_then(in_range)
        .ok_or(DISCOUNT_AMOUNT)?;

    let net = gross
        .checked_sub(discount)
        .and_then(in_range)
        .ok_or(NET_AMOUNT)?;

    Ok((gross, discount, net))
}

/// Compute gross, discount and net amounts row by row.
///
/// `unit_price` and `discount_pct` must already be at [`MONEY_SCALE`]. A null
/// quantity or unit price yields nulls in all three outputs for that row; a
/// null discount is treated as zero.
pub(crate) fn derive_amounts(
    quantity: &Int64Array,
    unit_price: &Decimal128Array,
    discount_pct: &Decimal128Array,
) -> PipelineResult<DerivedAmounts> {
    let rows = quantity.len();
    let mut gross = Vec::with_capacity(rows);
    let mut discount = Vec::with_capacity(rows);
    let mut net = Vec::with_capacity(rows);

    for row in 0..rows {
        if quantity.is_null(row) || unit_price.is_null(row) {
            gross.push(None);
            discount.push(None);
            net.push(None);
            continue;
        }

        let pct = if discount_pct.is_null(row) {
            0
        } else {
            discount_pct.value(row)
        };

        let (g, d, n) = derive_row(quantity.value(row), unit_price.value(row), pct)
            .map_err(|column| DataQualityError::AmountOverflow {
                column: column.to_string(),
                row,
            })?;
        gross.push(Some(g));
        discount.push(Some(d));
        net.push(Some(n));
    }

    let finish = |values: Vec<Option<i128>>| -> PipelineResult<Decimal128Array> {
        Decimal128Array::from(values)
            .with_precision_and_scale(MONEY_PRECISION, MONEY_SCALE)
            .context(ArrowSnafu)
    };

    Ok(DerivedAmounts {
        gross: finish(gross)?,
        discount: finish(discount)?,
        net: finish(net)?,
    })
}
