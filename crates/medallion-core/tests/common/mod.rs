#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

type Row<'a> = (
    &'a str,
    &'a str,
    &'a str,
    i64,
    f64,
    &'a str,
    &'a str,
    &'a str,
    Option<f64>,
    Option<&'a str>,
);

/// Five transactions with messy casing, punctuation and date formats.
pub const SAMPLE_ROWS: [Row<'static>; 5] = [
    ("TXN001", "cust001", "Widget A", 10, 25.00, "2024-01-15", "Northeast", "completed", Some(0.0), Some("Rush order")),
    ("TXN002", "CUST-002", "WIDGET A", 5, 30.50, "01/20/2024", "NORTHEAST", "COMPLETED", Some(10.0), Some("")),
    ("TXN003", "cust_003", "widget a", 20, 25.00, "15-02-2024", "northeast", "Completed", None, None),
    ("TXN004", "CUST004", "Gadget X", 15, 45.99, "2024/03/10", "Southwest", "pending", Some(5.0), Some("standard")),
    ("TXN005", "cust005", "Tool Z", 8, 100.00, "2024-04-01", "WEST", "cancelled", Some(20.0), Some("PRIORITY")),
];

pub fn raw_schema() -> Schema {
    Schema::new(vec![
        Field::new("transaction_id", DataType::Utf8, false),
        Field::new("customer_id", DataType::Utf8, false),
        Field::new("product_name", DataType::Utf8, false),
        Field::new("quantity", DataType::Int64, false),
        Field::new("unit_price", DataType::Float64, false),
        Field::new("transaction_date", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("status", DataType::Utf8, false),
        Field::new("discount_pct", DataType::Float64, true),
        Field::new("notes", DataType::Utf8, true),
    ])
}

pub fn raw_batch(rows: &[Row<'_>]) -> TestResult<RecordBatch> {
    let mut ids = StringBuilder::new();
    let mut customers = StringBuilder::new();
    let mut products = StringBuilder::new();
    let mut quantities = Int64Builder::with_capacity(rows.len());
    let mut prices = Float64Builder::with_capacity(rows.len());
    let mut dates = StringBuilder::new();
    let mut regions = StringBuilder::new();
    let mut statuses = StringBuilder::new();
    let mut discounts = Float64Builder::with_capacity(rows.len());
    let mut notes = StringBuilder::new();

    for (id, customer, product, qty, price, date, region, status, discount, note) in rows {
        ids.append_value(id);
        customers.append_value(customer);
        products.append_value(product);
        quantities.append_value(*qty);
        prices.append_value(*price);
        dates.append_value(date);
        regions.append_value(region);
        statuses.append_value(status);
        discounts.append_option(*discount);
        notes.append_option(*note);
    }

    Ok(RecordBatch::try_new(
        Arc::new(raw_schema()),
        vec![
            Arc::new(ids.finish()) as _,
            Arc::new(customers.finish()),
            Arc::new(products.finish()),
            Arc::new(quantities.finish()),
            Arc::new(prices.finish()),
            Arc::new(dates.finish()),
            Arc::new(regions.finish()),
            Arc::new(statuses.finish()),
            Arc::new(discounts.finish()),
            Arc::new(notes.finish()),
        ],
    )?)
}

pub fn sample_raw_batch() -> TestResult<RecordBatch> {
    raw_batch(&SAMPLE_ROWS)
}

pub fn write_parquet(path: &Path, batch: &RecordBatch) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;
    let props = parquet::file::properties::WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}
