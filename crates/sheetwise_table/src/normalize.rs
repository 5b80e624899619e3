//! Region normalization into typed tables.

use std::collections::{HashMap, HashSet};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sheetwise_foundation::naming::{column_letter, snake_case};
use sheetwise_foundation::{CellValue, DetectionThresholds, parse_number_lenient, parse_temporal};
use sheetwise_loader::RawSheet;
use tracing::debug;

use crate::region::DataRegion;

/// Primitive type a column was coerced to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integers and floats.
    Numeric,
    /// Calendar dates.
    Date,
    /// Dates with a time of day.
    DateTime,
    /// Trimmed strings.
    Text,
}

/// One named, typed column of a [`Table`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    /// Cleaned, deduplicated snake_case name.
    pub name: String,
    /// Header text as it appeared on the sheet.
    pub original_name: String,
    /// Absolute column index on the sheet.
    pub source_col: usize,
    /// Coerced primitive kind.
    pub kind: ColumnKind,
    /// One value per record; values that failed coercion are `Empty`.
    pub values: Vec<CellValue>,
}

impl TableColumn {
    /// Number of non-empty values.
    #[must_use]
    pub fn non_null(&self) -> usize {
        self.values.iter().filter(|v| !v.is_empty()).count()
    }
}

/// Records of one region with named, typed columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Sheet name.
    pub sheet: String,
    /// Zero-based sheet position in the workbook.
    pub sheet_index: usize,
    /// The region the table was read from.
    pub region: DataRegion,
    /// Columns in sheet order.
    pub columns: Vec<TableColumn>,
    /// Source row of each record, for traceability only.
    pub row_indices: Vec<usize>,
}

impl Table {
    /// Number of records.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_indices.len()
    }

    /// Returns a column by cleaned name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Maps sheet column letters (`"E"`) to column names.
    #[must_use]
    pub fn field_map(&self) -> HashMap<String, String> {
        self.columns
            .iter()
            .map(|c| (column_letter(c.source_col), c.name.clone()))
            .collect()
    }
}

/// Converts a detected region into a [`Table`].
///
/// Empty rows are skipped, all-empty columns are dropped, names are cleaned
/// and deduplicated, and each column is coerced to numeric, date/datetime or
/// text in that order of preference.
#[must_use]
pub fn normalize(region: &DataRegion, sheet: &RawSheet, thresholds: &DetectionThresholds) -> Table {
    let row_indices: Vec<usize> = region
        .record_rows()
        .filter(|&r| !sheet.is_row_empty(r, region.start_col, region.end_col))
        .collect();

    let mut names = NameDeduper::default();
    let mut columns = Vec::with_capacity(region.width());
    for (offset, col) in (region.start_col..=region.end_col).enumerate() {
        let raw: Vec<CellValue> = row_indices
            .iter()
            .map(|&r| sheet.value(r, col).clone())
            .collect();
        if raw.iter().all(CellValue::is_empty) {
            debug!(sheet = %sheet.name, col, "dropping empty column");
            continue;
        }
        let original_name = region
            .column_names
            .get(offset)
            .cloned()
            .unwrap_or_default();
        let (kind, values) = coerce(raw, thresholds.coercion_ratio);
        columns.push(TableColumn {
            name: names.unique(&clean_name(&original_name, col)),
            original_name,
            source_col: col,
            kind,
            values,
        });
    }

    debug!(
        sheet = %sheet.name,
        rows = row_indices.len(),
        columns = columns.len(),
        "normalized region"
    );
    Table {
        sheet: sheet.name.clone(),
        sheet_index: sheet.index,
        region: region.clone(),
        columns,
        row_indices,
    }
}

/// snake_case name, or `column_<letter>` when nothing is left.
fn clean_name(original: &str, col: usize) -> String {
    let cleaned = snake_case(original);
    if cleaned.is_empty() {
        format!("column_{}", column_letter(col).to_lowercase())
    } else {
        cleaned
    }
}

/// Appends `_1`, `_2`, ... to repeated names in encounter order.
#[derive(Debug, Default)]
pub struct NameDeduper {
    taken: HashSet<String>,
    repeats: HashMap<String, usize>,
}

impl NameDeduper {
    /// Returns `name` or the next free suffixed variant of it.
    pub fn unique(&mut self, name: &str) -> String {
        if self.taken.insert(name.to_string()) {
            return name.to_string();
        }
        let counter = self.repeats.entry(name.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{name}_{counter}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn coerce(raw: Vec<CellValue>, ratio: f64) -> (ColumnKind, Vec<CellValue>) {
    let non_null = raw.iter().filter(|v| !v.is_empty()).count();
    let share = |hits: usize| hits as f64 / non_null.max(1) as f64;

    let numeric: Vec<Option<CellValue>> = raw.iter().map(to_number).collect();
    if share(numeric.iter().flatten().count()) >= ratio {
        let values = numeric
            .into_iter()
            .map(|v| v.unwrap_or(CellValue::Empty))
            .collect();
        return (ColumnKind::Numeric, values);
    }

    let temporal: Vec<Option<CellValue>> = raw.iter().map(to_temporal).collect();
    if share(temporal.iter().flatten().count()) >= ratio {
        let with_time = temporal.iter().flatten().any(CellValue::has_time_component);
        let values = temporal
            .into_iter()
            .map(|v| match v {
                Some(CellValue::Date(d)) if with_time => {
                    CellValue::DateTime(d.and_time(NaiveTime::MIN))
                }
                Some(CellValue::DateTime(dt)) if !with_time => CellValue::Date(dt.date()),
                Some(v) => v,
                None => CellValue::Empty,
            })
            .collect();
        let kind = if with_time {
            ColumnKind::DateTime
        } else {
            ColumnKind::Date
        };
        return (kind, values);
    }

    let values = raw
        .into_iter()
        .map(|v| match v {
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(trimmed.to_string())
                }
            }
            CellValue::Empty => CellValue::Empty,
            other => CellValue::Text(other.key()),
        })
        .collect();
    (ColumnKind::Text, values)
}

#[allow(clippy::cast_possible_truncation)]
fn to_number(value: &CellValue) -> Option<CellValue> {
    match value {
        CellValue::Int(_) | CellValue::Float(_) => Some(value.clone()),
        CellValue::Text(s) => {
            let n = parse_number_lenient(s)?;
            let integral_text = !s.contains('.') && !s.contains(['e', 'E']) && !s.contains('%');
            if integral_text && n.fract() == 0.0 && n.abs() < 1e15 {
                Some(CellValue::Int(n as i64))
            } else {
                Some(CellValue::Float(n))
            }
        }
        _ => None,
    }
}

fn to_temporal(value: &CellValue) -> Option<CellValue> {
    match value {
        CellValue::Date(_) | CellValue::DateTime(_) => Some(value.clone()),
        CellValue::Text(s) => parse_temporal(s),
        _ => None,
    }
}
