#![allow(dead_code)]

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;

use arrow::array::{Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// `(id, customer, product, quantity, unit_price, date, region, status, discount)`
pub type Row = (&'static str, &'static str, &'static str, i64, f64, &'static str, &'static str, &'static str, Option<f64>);

pub const SAMPLE_ROWS: [Row; 5] = [
    ("TXN001", "cust001", "Widget A", 10, 25.00, "2024-01-15", "Northeast", "completed", Some(0.0)),
    ("TXN002", "CUST-002", "WIDGET A", 5, 30.50, "01/20/2024", "NORTHEAST", "COMPLETED", Some(10.0)),
    ("TXN003", "cust_003", "widget a", 20, 25.00, "15-02-2024", "northeast", "Completed", None),
    ("TXN004", "CUST004", "Gadget X", 15, 45.99, "2024/03/10", "Southwest", "pending", Some(5.0)),
    ("TXN005", "cust005", "Tool Z", 8, 100.00, "2024-04-01", "WEST", "cancelled", Some(20.0)),
];

pub fn cli_bin() -> &'static str {
    env!("CARGO_BIN_EXE_medallion")
}

pub fn run_cli<I, S>(args: I) -> std::io::Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(cli_bin())
        .args(args)
        .env("MEDALLION_LOG", "warn")
        .output()
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn assert_cli_success(output: &Output) {
    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        stdout_of(output),
        stderr_of(output)
    );
}

pub fn assert_cli_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure\nstdout:\n{}\nstderr:\n{}",
        stdout_of(output),
        stderr_of(output)
    );
}

/// Write `rows` as a raw transactions Parquet file (no notes column values).
pub fn write_raw_parquet(path: &Path, rows: &[Row]) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

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

    for (id, customer, product, qty, price, date, region, status, discount) in rows {
        ids.append_value(id);
        customers.append_value(customer);
        products.append_value(product);
        quantities.append_value(*qty);
        prices.append_value(*price);
        dates.append_value(date);
        regions.append_value(region);
        statuses.append_value(status);
        discounts.append_option(*discount);
        notes.append_null();
    }

    let schema = Arc::new(Schema::new(vec![
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
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
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
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
