//! Gold aggregation: business-level views over completed transactions.
//!
//! Three views are derived from a silver batch, each restricted to rows whose
//! `status` is exactly `completed`:
//!
//! | view               | keys                          | metrics                               |
//! |--------------------|-------------------------------|---------------------------------------|
//! | `daily_summary`    | `transaction_date`, `region`  | `total_transactions`, `net_revenue`   |
//! | `customer_metrics` | `customer_id`                 | `total_orders`, `total_spend`         |
//! | `product_metrics`  | `product_name`                | `total_orders`, `total_revenue`       |
//!
//! Counts are `Int64` row counts per group; sums are `Decimal128(38, 4)` over
//! `net_amount` with nulls skipped. Rows come out in ascending key order, and
//! a row with a null in any key column is left out of that view.

mod group;

use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch, Scalar, StringArray};
use arrow::compute::filter_record_batch;
use arrow::compute::kernels::cmp;
use arrow::datatypes::{DataType, Field, Schema};
use log::debug;
use snafu::prelude::*;

use crate::error::{ArrowSnafu, PipelineResult};
use crate::schema::{
    self, CUSTOMER_ID, NET_AMOUNT, NET_REVENUE, PRODUCT_NAME, REGION, STATUS, TOTAL_ORDERS,
    TOTAL_REVENUE, TOTAL_SPEND, TOTAL_TRANSACTIONS, TRANSACTION_DATE,
};
use crate::silver::{MONEY_PRECISION, MONEY_SCALE, money_type};

/// Status value that qualifies a row for the gold views.
pub const COMPLETED_STATUS: &str = "completed";

/// Name of the daily summary view.
pub const DAILY_SUMMARY: &str = "daily_summary";
/// Name of the customer metrics view.
pub const CUSTOMER_METRICS: &str = "customer_metrics";
/// Name of the product metrics view.
pub const PRODUCT_METRICS: &str = "product_metrics";

/// The three gold views computed from one silver batch.
#[derive(Debug, Clone)]
pub struct GoldTables {
    /// Completed transactions and net revenue per day and region.
    pub daily_summary: RecordBatch,
    /// Completed orders and spend per customer.
    pub customer_metrics: RecordBatch,
    /// Completed orders and revenue per product.
    pub product_metrics: RecordBatch,
}

impl GoldTables {
    /// `(view name, batch)` pairs in a stable order.
    pub fn views(&self) -> [(&'static str, &RecordBatch); 3] {
        [
            (DAILY_SUMMARY, &self.daily_summary),
            (CUSTOMER_METRICS, &self.customer_metrics),
            (PRODUCT_METRICS, &self.product_metrics),
        ]
    }
}

/// Keep only rows whose `status` equals [`COMPLETED_STATUS`].
///
/// The comparison is exact; silver has already lowercased statuses. Null
/// statuses are dropped.
pub fn completed_only(silver: &RecordBatch) -> PipelineResult<RecordBatch> {
    let status = schema::string_column(silver, STATUS)?;
    let completed = Scalar::new(StringArray::from(vec![COMPLETED_STATUS]));
    let mask = cmp::eq(&status, &completed).context(ArrowSnafu)?;
    filter_record_batch(silver, &mask).context(ArrowSnafu)
}

/// Group `completed` by `keys`, counting rows into `count_name` and summing
/// `net_amount` into `sum_name`.
fn summarize(
    completed: &RecordBatch,
    keys: &[&str],
    count_name: &str,
    sum_name: &str,
) -> PipelineResult<RecordBatch> {
    let input_schema = completed.schema();
    let mut key_fields = Vec::with_capacity(keys.len());
    let mut key_columns: Vec<ArrayRef> = Vec::with_capacity(keys.len());
    for name in keys {
        let column = schema::column(completed, name)?;
        let field = input_schema
            .field_with_name(name)
            .context(ArrowSnafu)?
            .clone();
        key_fields.push(field);
        key_columns.push(column.clone());
    }
    let net = schema::decimal_column(completed, NET_AMOUNT, MONEY_PRECISION, MONEY_SCALE)?;

    let grouped = group::count_and_sum(&key_columns, &net, sum_name)?;

    let mut fields = key_fields;
    fields.push(Field::new(count_name, DataType::Int64, false));
    fields.push(Field::new(sum_name, money_type(), false));

    let mut columns = grouped.keys;
    columns.push(Arc::new(grouped.counts));
    columns.push(Arc::new(grouped.sums));

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context(ArrowSnafu)
}

/// Completed transactions and net revenue per `(transaction_date, region)`.
///
/// `completed` should already be filtered with [`completed_only`].
pub fn daily_summary(completed: &RecordBatch) -> PipelineResult<RecordBatch> {
    summarize(
        completed,
        &[TRANSACTION_DATE, REGION],
        TOTAL_TRANSACTIONS,
        NET_REVENUE,
    )
}

/// Completed orders and total spend per `customer_id`.
///
/// `completed` should already be filtered with [`completed_only`].
pub fn customer_metrics(completed: &RecordBatch) -> PipelineResult<RecordBatch> {
    summarize(completed, &[CUSTOMER_ID], TOTAL_ORDERS, TOTAL_SPEND)
}

/// Completed orders and total revenue per `product_name`.
///
/// `completed` should already be filtered with [`completed_only`].
pub fn product_metrics(completed: &RecordBatch) -> PipelineResult<RecordBatch> {
    summarize(completed, &[PRODUCT_NAME], TOTAL_ORDERS, TOTAL_REVENUE)
}

/// Filter `silver` to completed rows and build all three views.
pub fn aggregate(silver: &RecordBatch) -> PipelineResult<GoldTables> {
    let completed = completed_only(silver)?;
    debug!(
        "gold: {} of {} rows are {COMPLETED_STATUS}",
        completed.num_rows(),
        silver.num_rows()
    );

    let tables = GoldTables {
        daily_summary: daily_summary(&completed)?,
        customer_metrics: customer_metrics(&completed)?,
        product_metrics: product_metrics(&completed)?,
    };
    for (name, batch) in tables.views() {
        debug!("gold: {name} has {} groups", batch.num_rows());
    }
    Ok(tables)
}
