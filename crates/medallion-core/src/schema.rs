//! Column contract for the transaction batches flowing through the pipeline.
//!
//! This module owns every column name used by the stages and the rules for
//! which Arrow types a raw batch may carry for each of them. Raw inputs come
//! from loosely-typed producers (a `discount_pct` column may be integer or
//! float, a `transaction_date` may be a string or a date), so validation is
//! expressed as "accepted type families" rather than exact types, and the
//! typed accessors below cast into the canonical representation the
//! transforms compute with.
//!
//! Casting is done with `safe: false` so that values which do not fit the
//! target type surface as [`SchemaError::Cast`] instead of turning into nulls.

use arrow::array::{
    Array, ArrayRef, AsArray, Decimal128Array, Float64Array, Int64Array, RecordBatch, StringArray,
};
use arrow::compute::{CastOptions, cast_with_options};
use arrow::datatypes::{DataType, Decimal128Type, Float64Type, Int64Type, Schema};
use arrow::error::ArrowError;
use snafu::prelude::*;

// ====================
// Raw columns
// ====================

/// Unique transaction identifier.
pub const TRANSACTION_ID: &str = "transaction_id";
/// Customer identifier (free-form casing and punctuation in raw data).
pub const CUSTOMER_ID: &str = "customer_id";
/// Product name (free-form casing in raw data).
pub const PRODUCT_NAME: &str = "product_name";
/// Ordered quantity.
pub const QUANTITY: &str = "quantity";
/// Price per unit.
pub const UNIT_PRICE: &str = "unit_price";
/// Transaction date, possibly in several string formats.
pub const TRANSACTION_DATE: &str = "transaction_date";
/// Sales region (free-form casing in raw data).
pub const REGION: &str = "region";
/// Lifecycle status: completed, pending or cancelled.
pub const STATUS: &str = "status";
/// Discount percentage in `[0, 100]`, may be null.
pub const DISCOUNT_PCT: &str = "discount_pct";
/// Optional free text.
pub const NOTES: &str = "notes";

// ====================
// Bronze metadata columns
// ====================

/// When the batch was ingested into the bronze zone.
pub const INGESTION_TIMESTAMP: &str = "_ingestion_timestamp";
/// Tag of the system that produced the raw file.
pub const SOURCE_SYSTEM: &str = "_source_system";
/// Name of the raw file the rows came from.
pub const FILE_NAME: &str = "_file_name";

/// Metadata columns appended by bronze ingestion, in output order.
pub const BRONZE_METADATA_COLUMNS: [&str; 3] = [INGESTION_TIMESTAMP, SOURCE_SYSTEM, FILE_NAME];

// ====================
// Silver derived columns
// ====================

/// `quantity * unit_price`.
pub const GROSS_AMOUNT: &str = "gross_amount";
/// `gross_amount * discount_pct / 100`.
pub const DISCOUNT_AMOUNT: &str = "discount_amount";
/// `gross_amount - discount_amount`.
pub const NET_AMOUNT: &str = "net_amount";

// ====================
// Gold metric columns
// ====================

/// Number of completed transactions in a daily/region group.
pub const TOTAL_TRANSACTIONS: &str = "total_transactions";
/// Summed net amount of a daily/region group.
pub const NET_REVENUE: &str = "net_revenue";
/// Number of completed orders for a customer or product.
pub const TOTAL_ORDERS: &str = "total_orders";
/// Summed net amount for a customer.
pub const TOTAL_SPEND: &str = "total_spend";
/// Summed net amount for a product.
pub const TOTAL_REVENUE: &str = "total_revenue";

/// Errors raised when a batch does not satisfy the column contract.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SchemaError {
    /// A required column is absent from the batch.
    #[snafu(display("Batch is missing required column {column}"))]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },

    /// A column exists but its Arrow type is outside the accepted family.
    #[snafu(display("Column {column} has unsupported type {data_type}; expected {expected}"))]
    UnsupportedType {
        /// Name of the offending column.
        column: String,
        /// Arrow type found in the batch.
        data_type: DataType,
        /// Human-readable description of the accepted types.
        expected: &'static str,
    },

    /// A raw batch already carries a column name reserved for pipeline metadata.
    #[snafu(display("Column {column} is reserved for pipeline metadata"))]
    ReservedColumn {
        /// The reserved column name found in the input.
        column: String,
    },

    /// Casting a column into its canonical type failed.
    #[snafu(display("Cannot convert column {column} to {target}: {source}"))]
    Cast {
        /// Name of the column being converted.
        column: String,
        /// Target Arrow type.
        target: DataType,
        /// Underlying Arrow cast error.
        source: ArrowError,
    },
}

/// A convenience type alias for results of schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Family of Arrow types accepted for a raw column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Utf8, LargeUtf8 or Utf8View.
    Text,
    /// Any signed or unsigned integer.
    Integer,
    /// Any integer, float or decimal.
    Numeric,
    /// Any numeric type, or an all-null column.
    OptionalNumeric,
    /// Text, Date32, Date64 or Timestamp.
    DateLike,
}

impl ColumnKind {
    /// Whether `data_type` belongs to this family.
    pub fn accepts(self, data_type: &DataType) -> bool {
        match self {
            ColumnKind::Text => is_text(data_type),
            ColumnKind::Integer => data_type.is_integer(),
            ColumnKind::Numeric => data_type.is_numeric(),
            ColumnKind::OptionalNumeric => {
                data_type.is_numeric() || matches!(data_type, DataType::Null)
            }
            ColumnKind::DateLike => {
                is_text(data_type)
                    || matches!(
                        data_type,
                        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _)
                    )
            }
        }
    }

    fn expected(self) -> &'static str {
        match self {
            ColumnKind::Text => "a string type",
            ColumnKind::Integer => "an integer type",
            ColumnKind::Numeric => "a numeric type",
            ColumnKind::OptionalNumeric => "a numeric type or an all-null column",
            ColumnKind::DateLike => "a string, date or timestamp type",
        }
    }
}

fn is_text(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

/// Required raw columns and their accepted type families.
///
/// `notes` is optional and therefore not listed.
pub const RAW_COLUMNS: [(&str, ColumnKind); 9] = [
    (TRANSACTION_ID, ColumnKind::Text),
    (CUSTOMER_ID, ColumnKind::Text),
    (PRODUCT_NAME, ColumnKind::Text),
    (QUANTITY, ColumnKind::Integer),
    (UNIT_PRICE, ColumnKind::Numeric),
    (TRANSACTION_DATE, ColumnKind::DateLike),
    (REGION, ColumnKind::Text),
    (STATUS, ColumnKind::Text),
    (DISCOUNT_PCT, ColumnKind::OptionalNumeric),
];

/// Check that every required raw column is present with an accepted type.
///
/// Extra columns (bronze metadata, notes, anything else) are allowed.
pub fn validate_raw(schema: &Schema) -> SchemaResult<()> {
    validate_columns(schema, &RAW_COLUMNS)
}

/// Check `schema` against an arbitrary list of `(column, kind)` requirements.
pub fn validate_columns(schema: &Schema, required: &[(&str, ColumnKind)]) -> SchemaResult<()> {
    for (name, kind) in required {
        let field = schema
            .field_with_name(name)
            .map_err(|_| SchemaError::MissingColumn {
                column: name.to_string(),
            })?;

        if !kind.accepts(field.data_type()) {
            return UnsupportedTypeSnafu {
                column: name.to_string(),
                data_type: field.data_type().clone(),
                expected: kind.expected(),
            }
            .fail();
        }
    }
    Ok(())
}

/// Fail if `schema` already contains any of the bronze metadata columns.
pub fn ensure_no_reserved_columns(schema: &Schema) -> SchemaResult<()> {
    match BRONZE_METADATA_COLUMNS
        .iter()
        .find(|name| schema.field_with_name(name).is_ok())
    {
        Some(name) => ReservedColumnSnafu {
            column: name.to_string(),
        }
        .fail(),
        None => Ok(()),
    }
}

/// Look up a column by name.
pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> SchemaResult<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .context(MissingColumnSnafu { column: name })
}

/// Cast `array` (the contents of column `name`) to `target`.
///
/// Values that cannot be represented in `target` are an error, not null.
pub fn cast_array(array: &ArrayRef, name: &str, target: &DataType) -> SchemaResult<ArrayRef> {
    if array.data_type() == target {
        return Ok(array.clone());
    }

    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(array, target, &options).context(CastSnafu {
        column: name,
        target: target.clone(),
    })
}

fn cast_column(batch: &RecordBatch, name: &str, target: &DataType) -> SchemaResult<ArrayRef> {
    cast_array(column(batch, name)?, name, target)
}

/// Read a column as UTF-8 strings.
pub fn string_column(batch: &RecordBatch, name: &str) -> SchemaResult<StringArray> {
    let array = cast_column(batch, name, &DataType::Utf8)?;
    Ok(array.as_string::<i32>().clone())
}

/// Read a column as 64-bit signed integers.
pub fn int64_column(batch: &RecordBatch, name: &str) -> SchemaResult<Int64Array> {
    let array = cast_column(batch, name, &DataType::Int64)?;
    Ok(array.as_primitive::<Int64Type>().clone())
}

/// Read a column as 64-bit floats.
pub fn float64_column(batch: &RecordBatch, name: &str) -> SchemaResult<Float64Array> {
    let array = cast_column(batch, name, &DataType::Float64)?;
    Ok(array.as_primitive::<Float64Type>().clone())
}

/// Read a column as `Decimal128(precision, scale)`.
pub fn decimal_column(
    batch: &RecordBatch,
    name: &str,
    precision: u8,
    scale: i8,
) -> SchemaResult<Decimal128Array> {
    let array = cast_column(batch, name, &DataType::Decimal128(precision, scale))?;
    Ok(array.as_primitive::<Decimal128Type>().clone())
}
