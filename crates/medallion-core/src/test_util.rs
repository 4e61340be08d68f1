use std::sync::Arc;

use arrow::array::{Float64Builder, Int64Builder, RecordBatch, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;

use crate::schema::{
    CUSTOMER_ID, DISCOUNT_PCT, NOTES, PRODUCT_NAME, QUANTITY, REGION, STATUS, TRANSACTION_DATE,
    TRANSACTION_ID, UNIT_PRICE,
};

pub(crate) type TestResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Clone)]
pub(crate) struct RawRow {
    pub(crate) transaction_id: String,
    pub(crate) customer_id: &'static str,
    pub(crate) product_name: &'static str,
    pub(crate) quantity: i64,
    pub(crate) unit_price: f64,
    pub(crate) transaction_date: &'static str,
    pub(crate) region: &'static str,
    pub(crate) status: &'static str,
    pub(crate) discount_pct: Option<f64>,
    pub(crate) notes: Option<&'static str>,
}

impl RawRow {
    pub(crate) fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            customer_id: "CUST001",
            product_name: "Widget A",
            quantity: 1,
            unit_price: 10.0,
            transaction_date: "2024-01-01",
            region: "Northeast",
            status: "completed",
            discount_pct: Some(0.0),
            notes: None,
        }
    }
}

pub(crate) fn raw_schema() -> Schema {
    Schema::new(vec![
        Field::new(TRANSACTION_ID, DataType::Utf8, false),
        Field::new(CUSTOMER_ID, DataType::Utf8, false),
        Field::new(PRODUCT_NAME, DataType::Utf8, false),
        Field::new(QUANTITY, DataType::Int64, false),
        Field::new(UNIT_PRICE, DataType::Float64, false),
        Field::new(TRANSACTION_DATE, DataType::Utf8, false),
        Field::new(REGION, DataType::Utf8, false),
        Field::new(STATUS, DataType::Utf8, false),
        Field::new(DISCOUNT_PCT, DataType::Float64, true),
        Field::new(NOTES, DataType::Utf8, true),
    ])
}

pub(crate) fn raw_batch(rows: &[RawRow]) -> Result<RecordBatch, ArrowError> {
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

    for row in rows {
        ids.append_value(&row.transaction_id);
        customers.append_value(row.customer_id);
        products.append_value(row.product_name);
        quantities.append_value(row.quantity);
        prices.append_value(row.unit_price);
        dates.append_value(row.transaction_date);
        regions.append_value(row.region);
        statuses.append_value(row.status);
        discounts.append_option(row.discount_pct);
        notes.append_option(row.notes);
    }

    RecordBatch::try_new(
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
    )
}

/// The five-transaction batch with messy casing, punctuation, mixed date
/// formats and one missing discount.
pub(crate) fn sample_rows() -> Vec<RawRow> {
    let specs: [(&str, &str, &str, i64, f64, &str, &str, &str, Option<f64>, Option<&str>); 5] = [
        ("TXN001", "cust001", "Widget A", 10, 25.00, "2024-01-15", "Northeast", "completed", Some(0.0), Some("Rush order")),
        ("TXN002", "CUST-002", "WIDGET A", 5, 30.50, "01/20/2024", "NORTHEAST", "COMPLETED", Some(10.0), Some("")),
        ("TXN003", "cust_003", "widget a", 20, 25.00, "15-02-2024", "northeast", "Completed", None, None),
        ("TXN004", "CUST004", "Gadget X", 15, 45.99, "2024/03/10", "Southwest", "pending", Some(5.0), Some("standard")),
        ("TXN005", "cust005", "Tool Z", 8, 100.00, "2024-04-01", "WEST", "cancelled", Some(20.0), Some("PRIORITY")),
    ];

    specs
        .into_iter()
        .map(
            |(id, customer, product, quantity, price, date, region, status, discount, notes)| {
                RawRow {
                    transaction_id: id.to_string(),
                    customer_id: customer,
                    product_name: product,
                    quantity,
                    unit_price: price,
                    transaction_date: date,
                    region,
                    status,
                    discount_pct: discount,
                    notes,
                }
            },
        )
        .collect()
}

pub(crate) fn sample_raw_batch() -> Result<RecordBatch, ArrowError> {
    raw_batch(&sample_rows())
}

/// Twenty already-clean transactions: three customers, two products, one
/// day each, 15 completed / 3 pending / 2 cancelled.
pub(crate) fn twenty_day_rows() -> Vec<RawRow> {
    const DATES: [&str; 20] = [
        "2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05",
        "2024-01-06", "2024-01-07", "2024-01-08", "2024-01-09", "2024-01-10",
        "2024-01-11", "2024-01-12", "2024-01-13", "2024-01-14", "2024-01-15",
        "2024-01-16", "2024-01-17", "2024-01-18", "2024-01-19", "2024-01-20",
    ];
    const DISCOUNTS: [f64; 5] = [0.0, 5.0, 10.0, 15.0, 20.0];

    (0..20)
        .map(|i| {
            let mut row = RawRow::new(format!("TXN{i}"));
            row.customer_id = match i {
                0..5 => "CUST001",
                5..10 => "CUST002",
                _ => "CUST003",
            };
            row.product_name = if i < 10 { "Widget A" } else { "Gadget X" };
            row.quantity = (i as i64 % 7) + 1;
            row.unit_price = 10.0 + i as f64 * 2.5;
            row.transaction_date = DATES[i];
            row.region = match i {
                0..7 => "Northeast",
                7..14 => "Southwest",
                _ => "West",
            };
            row.status = match i {
                0..15 => "completed",
                15..18 => "pending",
                _ => "cancelled",
            };
            row.discount_pct = Some(DISCOUNTS[i % DISCOUNTS.len()]);
            row
        })
        .collect()
}
