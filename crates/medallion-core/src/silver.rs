//! Silver cleaning: standardize fields and derive money columns.
//!
//! Given a bronze batch (or any batch satisfying the raw column contract),
//! [`clean`] produces a new batch in which:
//!
//! - `customer_id` keeps only ASCII alphanumerics, uppercased;
//! - `product_name` and `region` are title-cased;
//! - `status` is lowercased;
//! - `quantity` is `Int64`, `unit_price` is `Decimal128(38, 4)`;
//! - `discount_pct` is `Float64` with nulls (and NaN) replaced by 0;
//! - `gross_amount`, `discount_amount`, `net_amount` are appended as
//!   `Decimal128(38, 4)` (see [`money`] for the arithmetic).
//!
//! Every other column, bronze metadata included, is carried over unchanged
//! and column order is preserved.
//!
//! Two behaviours are policy-driven rather than hard-coded:
//!
//! - [`DiscountPolicy`] decides what happens to discounts outside `[0, 100]`.
//!   The default reports them as a data quality error; `PassThrough` keeps the
//!   raw arithmetic (so `net_amount > gross_amount` is possible) and `Clamp`
//!   normalizes them.
//! - [`DatePolicy`] decides whether `transaction_date` is left as-is (default)
//!   or parsed into a canonical `Date32` column.

pub mod dates;
pub mod money;
pub mod text;

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, RecordBatch};
use arrow::datatypes::{Decimal128Type, Field, Schema};
use log::{debug, warn};
use serde::Deserialize;
use snafu::prelude::*;

use crate::error::{ArrowSnafu, PipelineResult};
use crate::quality::{self, DataQualityError};
use crate::schema::{
    self, CUSTOMER_ID, DISCOUNT_AMOUNT, DISCOUNT_PCT, GROSS_AMOUNT, NET_AMOUNT, PRODUCT_NAME,
    QUANTITY, REGION, STATUS, TRANSACTION_DATE, UNIT_PRICE,
};

pub use money::{MONEY_PRECISION, MONEY_SCALE, money_type};
pub use text::{normalize_customer_id, normalize_status, title_case};

/// What to do with discount percentages outside `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscountPolicy {
    /// Fail with [`DataQualityError::DiscountOutOfRange`].
    #[default]
    Report,
    /// Compute with the raw value; `net_amount` may exceed `gross_amount`.
    PassThrough,
    /// Clamp into `[0, 100]` before computing.
    Clamp,
}

/// What to do with `transaction_date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatePolicy {
    /// Keep the column exactly as it arrived.
    #[default]
    PassThrough,
    /// Parse into a `Date32` column; unparseable values are an error.
    Normalize,
}

/// Knobs for the silver stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SilverOptions {
    /// Handling of out-of-range discounts.
    pub discount_policy: DiscountPolicy,
    /// Handling of transaction dates.
    pub date_policy: DatePolicy,
}

/// Replace null and NaN discounts with 0 and apply the range policy.
fn prepare_discounts(raw: &Float64Array, policy: DiscountPolicy) -> PipelineResult<Float64Array> {
    let filled: Float64Array = raw
        .iter()
        .map(|v| Some(v.filter(|x| !x.is_nan()).unwrap_or(0.0)))
        .collect();

    let out_of_range = quality::discount_violations(&filled);
    if out_of_range.is_empty() {
        return Ok(filled);
    }

    match policy {
        DiscountPolicy::Report => Err(DataQualityError::DiscountOutOfRange {
            count: out_of_range.len(),
            rows: quality::sample_rows(&out_of_range),
        }
        .into()),
        DiscountPolicy::PassThrough => {
            warn!(
                "silver: {} discount values outside [0, 100] passed through (rows {:?}); \
                 net_amount may exceed gross_amount",
                out_of_range.len(),
                quality::sample_rows(&out_of_range)
            );
            Ok(filled)
        }
        DiscountPolicy::Clamp => {
            debug!(
                "silver: clamping {} discount values into [0, 100]",
                out_of_range.len()
            );
            Ok(filled
                .iter()
                .map(|v| v.map(|x| x.clamp(0.0, 100.0)))
                .collect())
        }
    }
}

/// Clean a bronze batch into a silver batch.
pub fn clean(bronze: &RecordBatch, opts: &SilverOptions) -> PipelineResult<RecordBatch> {
    schema::validate_raw(&bronze.schema())?;

    let customer_ids = text::map_strings(
        &schema::string_column(bronze, CUSTOMER_ID)?,
        normalize_customer_id,
    );
    let products = text::map_strings(&schema::string_column(bronze, PRODUCT_NAME)?, title_case);
    let regions = text::map_strings(&schema::string_column(bronze, REGION)?, title_case);
    let statuses = text::map_strings(&schema::string_column(bronze, STATUS)?, normalize_status);

    let quantity = schema::int64_column(bronze, QUANTITY)?;
    let unit_price = schema::decimal_column(bronze, UNIT_PRICE, MONEY_PRECISION, MONEY_SCALE)?;
    let discounts: ArrayRef = Arc::new(prepare_discounts(
        &schema::float64_column(bronze, DISCOUNT_PCT)?,
        opts.discount_policy,
    )?);

    // The arithmetic sees discounts rounded to scale 4, like prices; the
    // output column keeps the Float64 values.
    let discount_scaled = schema::cast_array(&discounts, DISCOUNT_PCT, &money_type())?
        .as_primitive::<Decimal128Type>()
        .clone();

    let amounts = money::derive_amounts(&quantity, &unit_price, &discount_scaled)?;

    let mut replaced: HashMap<&str, ArrayRef> = HashMap::from([
        (CUSTOMER_ID, Arc::new(customer_ids) as ArrayRef),
        (PRODUCT_NAME, Arc::new(products) as ArrayRef),
        (REGION, Arc::new(regions) as ArrayRef),
        (STATUS, Arc::new(statuses) as ArrayRef),
        (QUANTITY, Arc::new(quantity) as ArrayRef),
        (UNIT_PRICE, Arc::new(unit_price) as ArrayRef),
        (DISCOUNT_PCT, discounts),
    ]);
    match opts.date_policy {
        DatePolicy::PassThrough => {}
        DatePolicy::Normalize => {
            let dates = dates::normalize_dates(schema::column(bronze, TRANSACTION_DATE)?)?;
            replaced.insert(TRANSACTION_DATE, dates);
        }
    }

    let bronze_schema = bronze.schema();
    let mut fields = Vec::with_capacity(bronze.num_columns() + 3);
    let mut columns = Vec::with_capacity(bronze.num_columns() + 3);

    for (field, column) in bronze_schema.fields().iter().zip(bronze.columns()) {
        match replaced.remove(field.name().as_str()) {
            Some(cleaned) => {
                let nullable = field.is_nullable() && field.name() != DISCOUNT_PCT;
                fields.push(
                    field
                        .as_ref()
                        .clone()
                        .with_data_type(cleaned.data_type().clone())
                        .with_nullable(nullable),
                );
                columns.push(cleaned);
            }
            None => {
                fields.push(field.as_ref().clone());
                columns.push(column.clone());
            }
        }
    }

    for (name, array) in [
        (GROSS_AMOUNT, amounts.gross),
        (DISCOUNT_AMOUNT, amounts.discount),
        (NET_AMOUNT, amounts.net),
    ] {
        fields.push(Field::new(name, money_type(), true));
        columns.push(Arc::new(array) as ArrayRef);
    }

    let schema = Schema::new_with_metadata(fields, bronze_schema.metadata().clone());
    let silver = RecordBatch::try_new(Arc::new(schema), columns).context(ArrowSnafu)?;

    debug!(
        "silver: cleaned {} rows (discount_policy={:?}, date_policy={:?})",
        silver.num_rows(),
        opts.discount_policy,
        opts.date_policy
    );
    Ok(silver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bronze::{IngestMetadata, ingest};
    use crate::error::PipelineError;
    use crate::schema::{FILE_NAME, NOTES, TRANSACTION_ID};
    use crate::test_util::{RawRow, TestResult, raw_batch, sample_raw_batch};
    use arrow::datatypes::{DataType, Date32Type};

    fn clean_default(batch: &RecordBatch) -> PipelineResult<RecordBatch> {
        clean(batch, &SilverOptions::default())
    }

    fn strings(batch: &RecordBatch, name: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        Ok(schema::string_column(batch, name)?
            .iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect())
    }

    fn money_values(
        batch: &RecordBatch,
        name: &str,
    ) -> Result<Vec<Option<f64>>, Box<dyn std::error::Error>> {
        Ok(schema::column(batch, name)?
            .as_primitive::<Decimal128Type>()
            .iter()
            .map(|v| v.map(money::raw_to_f64))
            .collect())
    }

    #[test]
    fn customer_ids_are_standardized() -> TestResult {
        let silver = clean_default(&sample_raw_batch()?)?;
        let ids = strings(&silver, CUSTOMER_ID)?;
        assert_eq!(ids, ["CUST001", "CUST002", "CUST003", "CUST004", "CUST005"]);
        for id in &ids {
            assert_eq!(id, &id.to_uppercase());
            assert!(!id.contains('-') && !id.contains('_'));
        }
        Ok(())
    }

    #[test]
    fn product_names_and_regions_are_title_cased() -> TestResult {
        let silver = clean_default(&sample_raw_batch()?)?;
        assert_eq!(
            strings(&silver, PRODUCT_NAME)?,
            ["Widget A", "Widget A", "Widget A", "Gadget X", "Tool Z"]
        );
        assert_eq!(
            strings(&silver, REGION)?,
            ["Northeast", "Northeast", "Northeast", "Southwest", "West"]
        );
        Ok(())
    }

    #[test]
    fn statuses_are_lowercased() -> TestResult {
        let silver = clean_default(&sample_raw_batch()?)?;
        assert_eq!(
            strings(&silver, STATUS)?,
            ["completed", "completed", "completed", "pending", "cancelled"]
        );
        Ok(())
    }

    #[test]
    fn missing_discounts_become_zero() -> TestResult {
        let silver = clean_default(&sample_raw_batch()?)?;
        let discounts = schema::float64_column(&silver, DISCOUNT_PCT)?;
        assert_eq!(discounts.null_count(), 0);
        assert_eq!(discounts.value(2), 0.0);
        assert!(!silver.schema().field_with_name(DISCOUNT_PCT)?.is_nullable());
        Ok(())
    }

    #[test]
    fn nan_discount_is_treated_as_missing() -> TestResult {
        let mut row = RawRow::new("TXN1");
        row.discount_pct = Some(f64::NAN);
        let silver = clean_default(&raw_batch(&[row])?)?;
        assert_eq!(schema::float64_column(&silver, DISCOUNT_PCT)?.value(0), 0.0);
        Ok(())
    }

    #[test]
    fn discount_is_rounded_to_four_places_before_use() -> TestResult {
        let mut row = RawRow::new("TXN1");
        row.quantity = 10;
        row.unit_price = 100.0;
        row.discount_pct = Some(12.34567);
        let silver = clean_default(&raw_batch(&[row])?)?;

        // 1000 * 12.3457 / 100, not 1000 * 12.34567 / 100 = 123.4567
        assert_eq!(money_values(&silver, DISCOUNT_AMOUNT)?, [Some(123.457)]);
        assert_eq!(money_values(&silver, NET_AMOUNT)?, [Some(876.543)]);
        assert_eq!(schema::float64_column(&silver, DISCOUNT_PCT)?.value(0), 12.34567);
        Ok(())
    }

    #[test]
    fn derived_amounts_follow_the_formulas() -> TestResult {
        let silver = clean_default(&sample_raw_batch()?)?;
        let gross = money_values(&silver, GROSS_AMOUNT)?;
        let discount = money_values(&silver, DISCOUNT_AMOUNT)?;
        let net = money_values(&silver, NET_AMOUNT)?;

        assert_eq!(
            gross,
            [Some(250.0), Some(152.5), Some(500.0), Some(689.85), Some(800.0)]
        );
        assert_eq!(
            discount,
            [Some(0.0), Some(15.25), Some(0.0), Some(34.4925), Some(160.0)]
        );
        assert_eq!(
            net,
            [Some(250.0), Some(137.25), Some(500.0), Some(655.3575), Some(640.0)]
        );
        for (g, n) in gross.iter().zip(&net) {
            assert!(n <= g);
        }
        Ok(())
    }

    #[test]
    fn columns_are_retyped_in_place_and_amounts_appended() -> TestResult {
        let raw = sample_raw_batch()?;
        let silver = clean_default(&raw)?;
        let schema = silver.schema();

        assert_eq!(silver.num_columns(), raw.num_columns() + 3);
        assert_eq!(schema.index_of(TRANSACTION_ID)?, 0);
        assert_eq!(schema.field_with_name(UNIT_PRICE)?.data_type(), &money_type());
        assert_eq!(schema.field_with_name(QUANTITY)?.data_type(), &DataType::Int64);
        assert_eq!(
            schema.field_with_name(TRANSACTION_DATE)?.data_type(),
            &DataType::Utf8
        );

        let names: Vec<&str> = schema.fields()[raw.num_columns()..]
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(names, [GROSS_AMOUNT, DISCOUNT_AMOUNT, NET_AMOUNT]);
        Ok(())
    }

    #[test]
    fn untouched_columns_are_identical() -> TestResult {
        let raw = sample_raw_batch()?;
        let bronze = ingest(&raw, &IngestMetadata::now("transaction_system", "raw.parquet"))?;
        let silver = clean_default(&bronze)?;

        for name in [TRANSACTION_ID, NOTES, FILE_NAME, TRANSACTION_DATE] {
            assert_eq!(
                schema::column(&silver, name)?.as_ref(),
                schema::column(&bronze, name)?.as_ref(),
                "{name} changed"
            );
        }
        Ok(())
    }

    #[test]
    fn input_batch_is_not_mutated() -> TestResult {
        let raw = sample_raw_batch()?;
        let before = raw.clone();
        let _ = clean_default(&raw)?;
        assert_eq!(raw, before);
        Ok(())
    }

    #[test]
    fn dates_pass_through_by_default() -> TestResult {
        let silver = clean_default(&sample_raw_batch()?)?;
        assert_eq!(
            strings(&silver, TRANSACTION_DATE)?,
            ["2024-01-15", "01/20/2024", "15-02-2024", "2024/03/10", "2024-04-01"]
        );
        Ok(())
    }

    #[test]
    fn dates_can_be_normalized_on_request() -> TestResult {
        let opts = SilverOptions {
            date_policy: DatePolicy::Normalize,
            ..Default::default()
        };
        let silver = clean(&sample_raw_batch()?, &opts)?;
        let column = schema::column(&silver, TRANSACTION_DATE)?;
        assert_eq!(column.data_type(), &DataType::Date32);

        let column = column.as_primitive::<Date32Type>();
        let dates: Vec<String> = (0..column.len())
            .map(|i| {
                column
                    .value_as_date(i)
                    .map(|d| d.to_string())
                    .unwrap_or_default()
            })
            .collect();
        assert_eq!(
            dates,
            ["2024-01-15", "2024-01-20", "2024-02-15", "2024-03-10", "2024-04-01"]
        );
        Ok(())
    }

    fn rows_with_discounts(discounts: &[f64]) -> Vec<RawRow> {
        discounts
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let mut row = RawRow::new(format!("TXN{i}"));
                row.quantity = 2;
                row.unit_price = 10.0;
                row.discount_pct = Some(*d);
                row
            })
            .collect()
    }

    #[test]
    fn out_of_range_discounts_are_reported_by_default() -> TestResult {
        let raw = raw_batch(&rows_with_discounts(&[10.0, -5.0, 100.0, 120.0]))?;
        let err = clean_default(&raw).expect_err("discounts -5 and 120 are invalid");
        match err {
            PipelineError::DataQuality {
                source: DataQualityError::DiscountOutOfRange { count, rows },
            } => {
                assert_eq!(count, 2);
                assert_eq!(rows, [1, 3]);
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn pass_through_discounts_can_push_net_above_gross() -> TestResult {
        let raw = raw_batch(&rows_with_discounts(&[-10.0, 150.0]))?;
        let opts = SilverOptions {
            discount_policy: DiscountPolicy::PassThrough,
            ..Default::default()
        };
        let silver = clean(&raw, &opts)?;
        let gross = money_values(&silver, GROSS_AMOUNT)?;
        let net = money_values(&silver, NET_AMOUNT)?;

        assert_eq!(gross, [Some(20.0), Some(20.0)]);
        assert_eq!(net, [Some(22.0), Some(-10.0)]);
        assert!(net[0] > gross[0]);
        Ok(())
    }

    #[test]
    fn clamped_discounts_restore_the_invariant() -> TestResult {
        let raw = raw_batch(&rows_with_discounts(&[-10.0, 150.0, 25.0]))?;
        let opts = SilverOptions {
            discount_policy: DiscountPolicy::Clamp,
            ..Default::default()
        };
        let silver = clean(&raw, &opts)?;

        let discounts = schema::float64_column(&silver, DISCOUNT_PCT)?;
        assert_eq!(discounts.values().to_vec(), vec![0.0, 100.0, 25.0]);
        assert_eq!(
            money_values(&silver, NET_AMOUNT)?,
            [Some(20.0), Some(0.0), Some(15.0)]
        );
        Ok(())
    }

    #[test]
    fn missing_required_column_is_a_schema_error() -> TestResult {
        let mut raw = sample_raw_batch()?;
        let idx = raw.schema().index_of(UNIT_PRICE)?;
        raw.remove_column(idx);

        let err = clean_default(&raw).expect_err("unit_price is required");
        assert!(matches!(
            err.as_schema(),
            Some(schema::SchemaError::MissingColumn { column }) if column == UNIT_PRICE
        ));
        Ok(())
    }

    #[test]
    fn integer_discounts_are_accepted() -> TestResult {
        let raw = sample_raw_batch()?;
        let idx = raw.schema().index_of(DISCOUNT_PCT)?;
        let ints: ArrayRef = Arc::new(arrow::array::Int32Array::from(vec![
            Some(0),
            Some(10),
            None,
            Some(5),
            Some(20),
        ]));
        let mut columns = raw.columns().to_vec();
        columns[idx] = ints;
        let mut fields: Vec<Field> = raw
            .schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        fields[idx] = Field::new(DISCOUNT_PCT, DataType::Int32, true);
        let raw = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;

        let silver = clean_default(&raw)?;
        let discounts = schema::float64_column(&silver, DISCOUNT_PCT)?;
        assert_eq!(discounts.values().to_vec(), vec![0.0, 10.0, 0.0, 5.0, 20.0]);
        Ok(())
    }
}
