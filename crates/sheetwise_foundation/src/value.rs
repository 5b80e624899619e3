//! Cell values and primitive kinds.
//!
//! [`CellValue`] is the single value type flowing from the loader through
//! normalization. Parsing helpers here are shared by the CSV loader (strict
//! typing of raw text) and the normalizer (lenient column coercion).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A single spreadsheet value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// Blank cell.
    Empty,
    /// Boolean literal.
    Bool(bool),
    /// Integer number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date with time of day.
    DateTime(NaiveDateTime),
    /// Spreadsheet error value such as `#DIV/0!`.
    Error(String),
}

/// Primitive kind of a cell, used for header and consistency scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    /// Blank.
    Empty,
    /// Integer or float.
    Number,
    /// Text.
    Text,
    /// Date or datetime.
    Date,
    /// Boolean.
    Bool,
    /// Error value.
    Error,
}

impl CellValue {
    /// Returns the primitive kind of this value.
    #[must_use]
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Empty => PrimitiveKind::Empty,
            Self::Text(s) if s.trim().is_empty() => PrimitiveKind::Empty,
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::Int(_) | Self::Float(_) => PrimitiveKind::Number,
            Self::Text(_) => PrimitiveKind::Text,
            Self::Date(_) | Self::DateTime(_) => PrimitiveKind::Date,
            Self::Error(_) => PrimitiveKind::Error,
        }
    }

    /// Returns true for blank cells and whitespace-only text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind() == PrimitiveKind::Empty
    }

    /// Returns the numeric value, if this is a number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the text, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this is a datetime with a non-midnight time of day.
    #[must_use]
    pub fn has_time_component(&self) -> bool {
        match self {
            Self::DateTime(dt) => dt.time() != NaiveTime::MIN,
            _ => false,
        }
    }

    /// Canonical string key used for uniqueness and value-overlap checks.
    ///
    /// Integral floats render as integers so `3.0` and `3` compare equal.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn key(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.trim().to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Self::Error(e) => e.clone(),
        }
    }

    /// Types raw text strictly: integers, floats, dates, otherwise text.
    ///
    /// Used for delimited input where every cell arrives as text.
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return Self::Empty;
        }
        if let Ok(i) = text.parse::<i64>() {
            // Leading zeros are identifiers, not numbers.
            if !(text.len() > 1 && text.starts_with('0')) {
                return Self::Int(i);
            }
        }
        if looks_like_float(text) {
            if let Ok(f) = text.parse::<f64>() {
                if f.is_finite() {
                    return Self::Float(f);
                }
            }
        }
        if let Some(temporal) = parse_temporal(text) {
            return temporal;
        }
        Self::Text(text.to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

fn looks_like_float(text: &str) -> bool {
    let body = text.trim_start_matches(['-', '+']);
    !body.is_empty()
        && body.chars().any(|c| c.is_ascii_digit())
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
}

/// Parses a number leniently: currency symbols, thousands separators,
/// trailing percent signs and accounting negatives `(12.50)` are accepted.
#[must_use]
pub fn parse_number_lenient(raw: &str) -> Option<f64> {
    let mut text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let mut negative = false;
    if text.starts_with('(') && text.ends_with(')') && text.len() > 2 {
        negative = true;
        text = &text[1..text.len() - 1];
    }

    let trimmed: String = text
        .trim_start_matches(['$', '€', '£', '¥'])
        .trim_end_matches(['$', '€', '£', '¥', '%'])
        .trim()
        .to_string();
    let trimmed = if let Some(rest) = trimmed.strip_prefix('-') {
        negative = !negative;
        rest.trim_start_matches(['$', '€', '£', '¥']).to_string()
    } else {
        trimmed
    };

    let digits = if trimmed.contains(',') {
        if !has_thousands_grouping(&trimmed) {
            return None;
        }
        trimmed.replace(',', "")
    } else {
        trimmed
    };

    if !looks_like_float(&digits) {
        return None;
    }
    let value = digits.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negative { -value } else { value })
}

fn has_thousands_grouping(text: &str) -> bool {
    let integral = text.split('.').next().unwrap_or_default();
    let mut groups = integral.split(',');
    let Some(first) = groups.next() else {
        return false;
    };
    if first.is_empty() || first.len() > 3 || !first.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Parses date or datetime text into [`CellValue::Date`] / [`CellValue::DateTime`].
#[must_use]
pub fn parse_temporal(raw: &str) -> Option<CellValue> {
    let text = raw.trim();
    if text.len() < 6 || !text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(CellValue::DateTime(dt.naive_utc()));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(CellValue::DateTime(dt));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, format) {
            return Some(CellValue::Date(d));
        }
    }
    None
}
