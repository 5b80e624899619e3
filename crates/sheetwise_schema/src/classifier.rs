//! Column classification.
//!
//! Data types come from an ordered list of [`TypeDetector`]s evaluated
//! first-match-wins. Semantic types come from a separate, name-only pass
//! (see [`vocabulary::infer_semantic`]).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sheetwise_foundation::{CellValue, DataType, DetectionThresholds, SemanticType, parse_temporal};
use sheetwise_table::{ColumnKind, Table, TableColumn};
use tracing::debug;

use crate::profile::ColumnProfile;
use crate::vocabulary::{self, BOOLEAN_SETS, CURRENCY, PERCENTAGE};

static EMAIL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$"));
static URL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(?i:https?://|www\.)[^\s]+\.[^\s]+$"));
static PHONE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9()\-.\s]{5,18}[0-9]$"));
static CODE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{0,6}[-_#]?[0-9]+$"));

// =============================================================================
// Column Metadata
// =============================================================================

/// Type-specific statistics of a column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStats {
    /// Numeric range.
    Numeric {
        /// Smallest value.
        min: f64,
        /// Largest value.
        max: f64,
        /// Mean value.
        mean: f64,
        /// Sorted values step by one.
        sequential: bool,
    },
    /// Categorical value set.
    Enum {
        /// Distinct values, sorted.
        values: Vec<String>,
        /// Up to five most frequent values with counts.
        top_values: Vec<(String, usize)>,
    },
    /// Text lengths in characters.
    Text {
        /// Shortest value.
        min_length: usize,
        /// Longest value.
        max_length: usize,
        /// Mean length.
        avg_length: f64,
    },
    /// Date range as ISO strings.
    Date {
        /// Earliest value.
        min: String,
        /// Latest value.
        max: String,
    },
    /// Nothing to report.
    None,
}

/// Description of one classified column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Cleaned column name.
    pub name: String,
    /// Header text on the sheet.
    pub original_name: String,
    /// Absolute sheet column index.
    pub source_col: usize,
    /// Inferred data type.
    pub data_type: DataType,
    /// Name-based semantic role.
    pub semantic_type: Option<SemanticType>,
    /// Every non-null value is distinct.
    pub is_unique: bool,
    /// At least one value is null.
    pub nullable: bool,
    /// Number of null values.
    pub null_count: usize,
    /// Number of distinct non-null values.
    pub distinct_count: usize,
    /// A few distinct values in first-seen order.
    pub sample_values: Vec<String>,
    /// Type-specific statistics.
    pub stats: ColumnStats,
    /// Confidence in the data type, in [0, 1].
    pub confidence: f64,
}

// =============================================================================
// Detectors
// =============================================================================

/// Result of a detector that recognized a column.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Recognized type.
    pub data_type: DataType,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Statistics gathered while detecting.
    pub stats: ColumnStats,
}

impl Detection {
    fn new(data_type: DataType, confidence: f64, stats: ColumnStats) -> Self {
        Self {
            data_type,
            confidence: confidence.clamp(0.0, 1.0),
            stats,
        }
    }
}

/// One step of the classification cascade.
pub trait TypeDetector: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Returns a detection if this detector claims the column.
    fn detect(&self, profile: &ColumnProfile<'_>, thresholds: &DetectionThresholds)
    -> Option<Detection>;
}

/// Email, URL and phone patterns over text columns.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatternDetector;

impl TypeDetector for PatternDetector {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn detect(&self, p: &ColumnProfile<'_>, t: &DetectionThresholds) -> Option<Detection> {
        if p.kind != ColumnKind::Text {
            return None;
        }
        let patterns = [
            (&EMAIL, DataType::Email),
            (&URL, DataType::Url),
            (&PHONE, DataType::Phone),
        ];
        for (pattern, data_type) in patterns {
            let Ok(ref regex) = **pattern else {
                continue;
            };
            let ratio = p.share(|v| v.as_text().is_some_and(|s| regex.is_match(s.trim())));
            if ratio >= t.pattern_ratio {
                return Some(Detection::new(data_type, ratio, text_stats(p)));
            }
        }
        None
    }
}

/// Unique, numeric-like identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdDetector;

impl TypeDetector for IdDetector {
    fn name(&self) -> &'static str {
        "id"
    }

    fn detect(&self, p: &ColumnProfile<'_>, t: &DetectionThresholds) -> Option<Detection> {
        if p.uniqueness() < t.unique_id || p.non_null() == 0 {
            return None;
        }
        // Money and measurements are often unique in small tables.
        if vocabulary::matches_any(p.name, CURRENCY)
            || vocabulary::matches_any(p.name, PERCENTAGE)
            || matches!(
                vocabulary::infer_semantic(p.name, None),
                Some(SemanticType::Quantity | SemanticType::Price)
            )
        {
            return None;
        }
        match p.kind {
            ColumnKind::Numeric => {
                let numbers = p.numbers();
                if numbers.iter().any(|n| n.fract() != 0.0) {
                    return None;
                }
                let sequential = is_sequential(&numbers, t.sequential_tolerance);
                let confidence = if sequential { 0.95 } else { 0.85 };
                Some(Detection::new(
                    DataType::Id,
                    confidence,
                    numeric_stats(&numbers, sequential),
                ))
            }
            ColumnKind::Text => {
                let Ok(ref code) = *CODE else {
                    return None;
                };
                let all_codes = p
                    .values
                    .iter()
                    .all(|v| v.as_text().is_some_and(|s| code.is_match(s.trim())));
                all_codes.then(|| Detection::new(DataType::Id, 0.85, ColumnStats::None))
            }
            ColumnKind::Date | ColumnKind::DateTime => None,
        }
    }
}

/// Exact boolean vocabularies.
#[derive(Clone, Copy, Debug, Default)]
pub struct BooleanDetector;

impl TypeDetector for BooleanDetector {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn detect(&self, p: &ColumnProfile<'_>, _t: &DetectionThresholds) -> Option<Detection> {
        if p.non_null() == 0 {
            return None;
        }
        let keys: Vec<String> = p.counts.keys().map(|k| k.to_lowercase()).collect();
        let matches = BOOLEAN_SETS
            .iter()
            .any(|set| keys.iter().all(|k| set.contains(&k.as_str())));
        matches.then(|| Detection::new(DataType::Boolean, 1.0, enum_stats(p)))
    }
}

/// Dates and datetimes.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateDetector;

impl TypeDetector for DateDetector {
    fn name(&self) -> &'static str {
        "date"
    }

    fn detect(&self, p: &ColumnProfile<'_>, t: &DetectionThresholds) -> Option<Detection> {
        let temporal: Vec<CellValue> = p.values.iter().filter_map(|v| as_temporal(v)).collect();
        if temporal.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = temporal.len() as f64 / p.non_null() as f64;
        if ratio < t.coercion_ratio {
            return None;
        }
        let with_time = temporal.iter().any(CellValue::has_time_component);
        let data_type = if with_time {
            DataType::Datetime
        } else {
            DataType::Date
        };
        let mut keys: Vec<String> = temporal.iter().map(CellValue::key).collect();
        keys.sort_unstable();
        let stats = ColumnStats::Date {
            min: keys.first().cloned().unwrap_or_default(),
            max: keys.last().cloned().unwrap_or_default(),
        };
        Some(Detection::new(data_type, ratio, stats))
    }
}

/// Currency, percentage, integer and float.
#[derive(Clone, Copy, Debug, Default)]
pub struct NumericDetector;

impl TypeDetector for NumericDetector {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn detect(&self, p: &ColumnProfile<'_>, t: &DetectionThresholds) -> Option<Detection> {
        if matches!(p.kind, ColumnKind::Date | ColumnKind::DateTime) {
            return None;
        }
        let numbers = p.numbers();
        if numbers.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = numbers.len() as f64 / p.non_null() as f64;
        if ratio < t.coercion_ratio {
            return None;
        }
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let stats = numeric_stats(&numbers, is_sequential(&numbers, t.sequential_tolerance));

        let (data_type, base) = if vocabulary::matches_any(p.name, CURRENCY) {
            (DataType::Currency, 0.9)
        } else if (min >= 0.0 && max <= 1.0)
            || (min >= 0.0 && max <= 100.0 && vocabulary::matches_any(p.name, PERCENTAGE))
        {
            (DataType::Percentage, 0.85)
        } else if numbers.iter().all(|n| n.fract() == 0.0) {
            (DataType::Integer, 0.95)
        } else {
            (DataType::Float, 0.95)
        };
        Some(Detection::new(data_type, base * ratio, stats))
    }
}

/// Low-cardinality categorical values.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnumDetector;

impl TypeDetector for EnumDetector {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn detect(&self, p: &ColumnProfile<'_>, t: &DetectionThresholds) -> Option<Detection> {
        if p.non_null() == 0 || p.uniqueness() >= t.enum_max_ratio {
            return None;
        }
        if p.distinct() >= t.enum_max_distinct {
            return None;
        }
        let confidence = 0.8 + 0.2 * (1.0 - p.uniqueness() / t.enum_max_ratio.max(f64::EPSILON));
        Some(Detection::new(DataType::Enum, confidence, enum_stats(p)))
    }
}

/// Fallback for anything else.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextDetector;

impl TypeDetector for TextDetector {
    fn name(&self) -> &'static str {
        "text"
    }

    fn detect(&self, p: &ColumnProfile<'_>, _t: &DetectionThresholds) -> Option<Detection> {
        if p.non_null() == 0 {
            return Some(Detection::new(DataType::Empty, 0.5, ColumnStats::None));
        }
        Some(Detection::new(
            DataType::Text,
            0.75 + 0.15 * p.fill(),
            text_stats(p),
        ))
    }
}

/// The standard cascade order.
#[must_use]
pub fn default_detectors() -> Vec<Box<dyn TypeDetector>> {
    vec![
        Box::new(PatternDetector),
        Box::new(IdDetector),
        Box::new(BooleanDetector),
        Box::new(DateDetector),
        Box::new(NumericDetector),
        Box::new(EnumDetector),
        Box::new(TextDetector),
    ]
}

// =============================================================================
// Classifier
// =============================================================================

/// Classifies normalized columns into [`ColumnMetadata`].
pub struct ColumnClassifier<'a> {
    thresholds: &'a DetectionThresholds,
    detectors: Vec<Box<dyn TypeDetector>>,
}

impl<'a> ColumnClassifier<'a> {
    /// Creates a classifier with the standard detector order.
    #[must_use]
    pub fn new(thresholds: &'a DetectionThresholds) -> Self {
        Self::with_detectors(thresholds, default_detectors())
    }

    /// Creates a classifier with a custom detector order.
    #[must_use]
    pub fn with_detectors(
        thresholds: &'a DetectionThresholds,
        detectors: Vec<Box<dyn TypeDetector>>,
    ) -> Self {
        Self {
            thresholds,
            detectors,
        }
    }

    /// Classifies one column. `owner` is the singular entity name.
    #[must_use]
    pub fn classify(&self, column: &TableColumn, owner: Option<&str>) -> ColumnMetadata {
        let profile = ColumnProfile::new(column);
        let (detector, detection) = self
            .detectors
            .iter()
            .find_map(|d| d.detect(&profile, self.thresholds).map(|det| (d.name(), det)))
            .unwrap_or((
                "none",
                Detection::new(DataType::Text, 0.5, ColumnStats::None),
            ));
        let semantic_type = vocabulary::infer_semantic(&column.name, owner);
        debug!(
            column = %column.name,
            detector,
            data_type = %detection.data_type,
            confidence = detection.confidence,
            "classified column"
        );

        ColumnMetadata {
            name: column.name.clone(),
            original_name: column.original_name.clone(),
            source_col: column.source_col,
            data_type: detection.data_type,
            semantic_type,
            is_unique: profile.is_unique(),
            nullable: profile.null_count() > 0,
            null_count: profile.null_count(),
            distinct_count: profile.distinct(),
            sample_values: profile.samples(self.thresholds.sample_size),
            stats: detection.stats,
            confidence: detection.confidence,
        }
    }

    /// Classifies every column of a table.
    #[must_use]
    pub fn classify_table(&self, table: &Table, owner: Option<&str>) -> Vec<ColumnMetadata> {
        table
            .columns
            .iter()
            .map(|c| self.classify(c, owner))
            .collect()
    }
}

impl std::fmt::Debug for ColumnClassifier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnClassifier")
            .field(
                "detectors",
                &self.detectors.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Mean deviation of sorted steps from 1 is under the tolerance.
#[allow(clippy::cast_precision_loss)]
fn is_sequential(numbers: &[f64], tolerance: f64) -> bool {
    if numbers.len() < 2 {
        return false;
    }
    let mut sorted = numbers.to_vec();
    sorted.sort_by(f64::total_cmp);
    let deviation: f64 = sorted
        .windows(2)
        .map(|w| (w[1] - w[0] - 1.0).abs())
        .sum::<f64>()
        / (sorted.len() - 1) as f64;
    deviation < tolerance
}

#[allow(clippy::cast_precision_loss)]
fn numeric_stats(numbers: &[f64], sequential: bool) -> ColumnStats {
    if numbers.is_empty() {
        return ColumnStats::None;
    }
    let mut sorted = numbers.to_vec();
    sorted.sort_by(f64::total_cmp);
    ColumnStats::Numeric {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        sequential,
    }
}

fn enum_stats(p: &ColumnProfile<'_>) -> ColumnStats {
    ColumnStats::Enum {
        values: p.sorted_keys().into_iter().map(str::to_string).collect(),
        top_values: p.top_values(5),
    }
}

#[allow(clippy::cast_precision_loss)]
fn text_stats(p: &ColumnProfile<'_>) -> ColumnStats {
    let lengths: Vec<usize> = p.values.iter().map(|v| v.key().chars().count()).collect();
    if lengths.is_empty() {
        return ColumnStats::None;
    }
    ColumnStats::Text {
        min_length: lengths.iter().copied().min().unwrap_or(0),
        max_length: lengths.iter().copied().max().unwrap_or(0),
        avg_length: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
    }
}

fn as_temporal(value: &CellValue) -> Option<CellValue> {
    match value {
        CellValue::Date(_) | CellValue::DateTime(_) => Some(value.clone()),
        CellValue::Text(s) => parse_temporal(s),
        _ => None,
    }
}
