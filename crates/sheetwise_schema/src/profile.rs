//! Order-independent statistics of a column, shared by every detector.

use std::collections::HashMap;

use sheetwise_foundation::{CellValue, parse_number_lenient};
use sheetwise_table::{ColumnKind, TableColumn};

/// Value counts and helpers over the non-null values of one column.
#[derive(Clone, Debug)]
pub struct ColumnProfile<'a> {
    /// Cleaned column name.
    pub name: &'a str,
    /// Coerced primitive kind from normalization.
    pub kind: ColumnKind,
    /// Non-null values in record order.
    pub values: Vec<&'a CellValue>,
    /// Total record count, nulls included.
    pub total: usize,
    /// Frequency of each canonical value key.
    pub counts: HashMap<String, usize>,
}

impl<'a> ColumnProfile<'a> {
    /// Profiles a normalized column.
    #[must_use]
    pub fn new(column: &'a TableColumn) -> Self {
        Self::from_values(&column.name, column.kind, &column.values)
    }

    /// Profiles raw values under a name and kind.
    #[must_use]
    pub fn from_values(name: &'a str, kind: ColumnKind, values: &'a [CellValue]) -> Self {
        let non_null: Vec<&CellValue> = values.iter().filter(|v| !v.is_empty()).collect();
        let mut counts = HashMap::new();
        for value in &non_null {
            *counts.entry(value.key()).or_insert(0) += 1;
        }
        Self {
            name,
            kind,
            values: non_null,
            total: values.len(),
            counts,
        }
    }

    /// Number of non-null values.
    #[must_use]
    pub fn non_null(&self) -> usize {
        self.values.len()
    }

    /// Number of null values.
    #[must_use]
    pub fn null_count(&self) -> usize {
        self.total - self.values.len()
    }

    /// Number of distinct values.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Distinct over non-null, 0 for an all-null column.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn uniqueness(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.distinct() as f64 / self.non_null() as f64
        }
    }

    /// Non-null over total.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fill(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.non_null() as f64 / self.total as f64
        }
    }

    /// True if every non-null value is distinct.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        !self.values.is_empty() && self.distinct() == self.non_null()
    }

    /// Share of non-null values satisfying a predicate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn share(&self, predicate: impl Fn(&CellValue) -> bool) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let hits = self.values.iter().filter(|v| predicate(**v)).count();
        hits as f64 / self.non_null() as f64
    }

    /// Numeric reading of every value that has one.
    #[must_use]
    pub fn numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(|v| as_number(v)).collect()
    }

    /// Distinct keys sorted, for deterministic output.
    #[must_use]
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.counts.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Most frequent values, ties broken by key.
    #[must_use]
    pub fn top_values(&self, n: usize) -> Vec<(String, usize)> {
        let mut pairs: Vec<(String, usize)> =
            self.counts.iter().map(|(k, c)| (k.clone(), *c)).collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs.truncate(n);
        pairs
    }

    /// Up to `n` distinct values in first-seen order.
    #[must_use]
    pub fn samples(&self, n: usize) -> Vec<String> {
        let mut seen = Vec::new();
        for value in &self.values {
            if seen.len() == n {
                break;
            }
            let key = value.key();
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }
}

/// Numeric reading of a value: numbers directly, text leniently.
#[must_use]
pub fn as_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Text(s) => parse_number_lenient(s),
        other => other.as_f64(),
    }
}
