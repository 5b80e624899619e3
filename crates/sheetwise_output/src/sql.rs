//! SQL type mapping and constraint expressions.

use sheetwise_foundation::DataType;
use sheetwise_schema::{ColumnMetadata, ColumnStats};

/// Fixed SQL type for a data type. `enum` maps to its value list via
/// [`sql_type`]; here it falls back to `VARCHAR(255)`.
#[must_use]
pub const fn base_sql_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Id | DataType::Integer => "INTEGER",
        DataType::Date => "DATE",
        DataType::Datetime => "TIMESTAMP",
        DataType::Float | DataType::Currency => "DECIMAL(10,2)",
        DataType::Percentage => "DECIMAL(5,2)",
        DataType::Boolean => "BOOLEAN",
        DataType::Phone => "VARCHAR(20)",
        DataType::Url => "VARCHAR(500)",
        DataType::Text | DataType::Email | DataType::Enum | DataType::Empty => "VARCHAR(255)",
    }
}

/// SQL type of a classified column.
#[must_use]
pub fn sql_type(column: &ColumnMetadata) -> String {
    match (&column.data_type, &column.stats) {
        (DataType::Enum, ColumnStats::Enum { values, .. }) if !values.is_empty() => {
            let quoted: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
            format!("ENUM({})", quoted.join(","))
        }
        (data_type, _) => base_sql_type(*data_type).to_string(),
    }
}

/// Quotes a string literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Regular expression a column's values are expected to match.
#[must_use]
pub const fn value_pattern(data_type: DataType) -> Option<&'static str> {
    match data_type {
        DataType::Email => Some(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"),
        DataType::Phone => Some(r"^\+?[0-9()\-.\s]{7,20}$"),
        DataType::Url => Some(r"^https?://\S+$"),
        _ => None,
    }
}

/// Allowed numeric range of a column, when its type implies one.
///
/// Currency with no negative values must stay non-negative. Percentages
/// stay within `[0, 1]` or `[0, 100]` depending on the observed scale.
#[must_use]
pub fn value_range(column: &ColumnMetadata) -> Option<(Option<f64>, Option<f64>)> {
    let ColumnStats::Numeric { min, max, .. } = column.stats else {
        return None;
    };
    match column.data_type {
        DataType::Currency if min >= 0.0 => Some((Some(0.0), None)),
        DataType::Percentage if max <= 1.0 => Some((Some(0.0), Some(1.0))),
        DataType::Percentage => Some((Some(0.0), Some(100.0))),
        _ => None,
    }
}

/// `CHECK` expression for a range.
#[must_use]
pub fn range_expression(column: &str, min: Option<f64>, max: Option<f64>) -> Option<String> {
    match (min, max) {
        (Some(lo), Some(hi)) => Some(format!("{column} BETWEEN {lo} AND {hi}")),
        (Some(lo), None) => Some(format!("{column} >= {lo}")),
        (None, Some(hi)) => Some(format!("{column} <= {hi}")),
        (None, None) => None,
    }
}
