//! Detection thresholds and scoring weights.
//!
//! Every tunable number used by the pipeline lives here so that different
//! corpora can be analyzed without code edits. Missing fields in a
//! deserialized config fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Weights of the six header-row signals. Must sum to 1.0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderWeights {
    /// Earlier rows score higher.
    pub position: f64,
    /// Share of text cells among non-empty cells.
    pub text_ratio: f64,
    /// Share of non-empty cells over the row's column span.
    pub fill_ratio: f64,
    /// Share of bold/styled cells.
    pub style: f64,
    /// Presence of header-like keywords.
    pub keywords: f64,
    /// Type consistency of the rows below.
    pub consistency: f64,
}

impl Default for HeaderWeights {
    fn default() -> Self {
        Self {
            position: 0.15,
            text_ratio: 0.30,
            fill_ratio: 0.15,
            style: 0.05,
            keywords: 0.15,
            consistency: 0.20,
        }
    }
}

impl HeaderWeights {
    fn sum(&self) -> f64 {
        self.position
            + self.text_ratio
            + self.fill_ratio
            + self.style
            + self.keywords
            + self.consistency
    }
}

/// Weights of the relationship sub-scores. Must sum to 1.0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipWeights {
    /// Column-name similarity.
    pub name: f64,
    /// Share of source values found among target keys.
    pub value_overlap: f64,
    /// Data type compatibility.
    pub type_compatibility: f64,
}

impl Default for RelationshipWeights {
    fn default() -> Self {
        Self {
            name: 0.5,
            value_overlap: 0.3,
            type_compatibility: 0.2,
        }
    }
}

/// Weights of the overall confidence score. Must sum to 1.0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverallWeights {
    /// Mean region quality.
    pub structure: f64,
    /// Mean entity confidence.
    pub entities: f64,
    /// Mean relationship confidence.
    pub relationships: f64,
}

impl Default for OverallWeights {
    fn default() -> Self {
        Self {
            structure: 0.3,
            entities: 0.4,
            relationships: 0.3,
        }
    }
}

/// All thresholds used by the detection pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    /// Minimum header score for a row to become a header candidate.
    pub header_candidate: f64,
    /// Header signal weights.
    pub header_weights: HeaderWeights,
    /// Rows over which the position signal decays to zero.
    pub header_position_window: usize,
    /// Rows below a candidate examined for type consistency.
    pub consistency_window: usize,
    /// Share of cells that must agree on a kind for a column to be consistent.
    pub consistency_ratio: f64,
    /// Consecutive empty rows that terminate a region.
    pub empty_row_run: usize,
    /// Quality cap for pseudo-header regions.
    pub fallback_quality_cap: f64,
    /// Share of values that must coerce for a numeric/date column.
    pub coercion_ratio: f64,
    /// Share of text values that must match a pattern detector.
    pub pattern_ratio: f64,
    /// Uniqueness at or above which a numeric-like column is an `id`.
    pub unique_id: f64,
    /// Mean deviation from a unit step below which ids are sequential.
    pub sequential_tolerance: f64,
    /// Uniqueness below which a column may be an `enum`.
    pub enum_max_ratio: f64,
    /// Distinct values below which a column may be an `enum`.
    pub enum_max_distinct: usize,
    /// Number of sample values retained per column.
    pub sample_size: usize,
    /// Relationship sub-score weights.
    pub relationship_weights: RelationshipWeights,
    /// Minimum relationship confidence to be accepted.
    pub relationship_accept: f64,
    /// Overall confidence weights.
    pub overall_weights: OverallWeights,
    /// Entities below this confidence get a warning.
    pub low_confidence: f64,
    /// Formula nesting depth tolerated before confidence is reduced.
    pub formula_depth_allowance: usize,
    /// Maximum AST nodes per formula.
    pub max_formula_nodes: usize,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            header_candidate: 0.5,
            header_weights: HeaderWeights::default(),
            header_position_window: 10,
            consistency_window: 5,
            consistency_ratio: 0.7,
            empty_row_run: 3,
            fallback_quality_cap: 0.5,
            coercion_ratio: 0.8,
            pattern_ratio: 0.8,
            unique_id: 0.95,
            sequential_tolerance: 0.01,
            enum_max_ratio: 0.1,
            enum_max_distinct: 20,
            sample_size: 5,
            relationship_weights: RelationshipWeights::default(),
            relationship_accept: 0.6,
            overall_weights: OverallWeights::default(),
            low_confidence: 0.6,
            formula_depth_allowance: 2,
            max_formula_nodes: 512,
        }
    }
}

impl DetectionThresholds {
    /// Sets the header candidate threshold.
    #[must_use]
    pub fn with_header_candidate(mut self, threshold: f64) -> Self {
        self.header_candidate = threshold;
        self
    }

    /// Sets the relationship acceptance threshold.
    #[must_use]
    pub fn with_relationship_accept(mut self, threshold: f64) -> Self {
        self.relationship_accept = threshold;
        self
    }

    /// Sets the relationship sub-score weights.
    #[must_use]
    pub fn with_relationship_weights(mut self, weights: RelationshipWeights) -> Self {
        self.relationship_weights = weights;
        self
    }

    /// Sets the header signal weights.
    #[must_use]
    pub fn with_header_weights(mut self, weights: HeaderWeights) -> Self {
        self.header_weights = weights;
        self
    }

    /// Sets the number of consecutive empty rows that end a region.
    #[must_use]
    pub fn with_empty_row_run(mut self, run: usize) -> Self {
        self.empty_row_run = run;
        self
    }

    /// Sets the AST node limit for formulas.
    #[must_use]
    pub fn with_max_formula_nodes(mut self, limit: usize) -> Self {
        self.max_formula_nodes = limit;
        self
    }

    /// Parses thresholds from JSON, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self> {
        let thresholds: Self =
            serde_json::from_str(json).map_err(|e| Error::invalid_config(e.to_string()))?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Checks that ratios lie in [0, 1] and weight groups sum to 1.0.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("header_candidate", self.header_candidate),
            ("consistency_ratio", self.consistency_ratio),
            ("fallback_quality_cap", self.fallback_quality_cap),
            ("coercion_ratio", self.coercion_ratio),
            ("pattern_ratio", self.pattern_ratio),
            ("unique_id", self.unique_id),
            ("enum_max_ratio", self.enum_max_ratio),
            ("relationship_accept", self.relationship_accept),
            ("low_confidence", self.low_confidence),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::invalid_config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        let rw = &self.relationship_weights;
        let ow = &self.overall_weights;
        let sums = [
            ("header_weights", self.header_weights.sum()),
            (
                "relationship_weights",
                rw.name + rw.value_overlap + rw.type_compatibility,
            ),
            ("overall_weights", ow.structure + ow.entities + ow.relationships),
        ];
        for (name, sum) in sums {
            if (sum - 1.0).abs() > 1e-6 {
                return Err(Error::invalid_config(format!(
                    "{name} must sum to 1.0, got {sum}"
                )));
            }
        }

        if self.empty_row_run == 0 {
            return Err(Error::invalid_config("empty_row_run must be at least 1"));
        }
        if self.max_formula_nodes == 0 {
            return Err(Error::invalid_config("max_formula_nodes must be at least 1"));
        }
        Ok(())
    }
}
