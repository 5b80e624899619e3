//! Relationship detection between entities.
//!
//! Every non-key column of every entity is scored against the primary key of
//! every other entity on three independent signals:
//!
//! - name similarity (`supplier_id` → `suppliers`)
//! - value overlap between the column and the target keys
//! - data type compatibility
//!
//! Candidates above the acceptance threshold are deduplicated per source
//! column, keeping the strongest.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sheetwise_foundation::naming::singularize;
use sheetwise_foundation::{DataType, DetectionThresholds};
use tracing::{debug, info};

use crate::classifier::ColumnMetadata;
use crate::entity::Entity;

// =============================================================================
// Value Index
// =============================================================================

/// Distinct canonical value keys per `(entity, column)`.
#[derive(Clone, Debug, Default)]
pub struct ValueIndex {
    columns: HashMap<(String, String), HashSet<String>>,
}

impl ValueIndex {
    /// Records the values of one column.
    pub fn insert(&mut self, entity: &str, column: &str, keys: impl IntoIterator<Item = String>) {
        self.columns
            .entry((entity.to_string(), column.to_string()))
            .or_default()
            .extend(keys.into_iter().map(|k| k.trim().to_string()));
    }

    /// Returns the distinct keys of a column.
    #[must_use]
    pub fn get(&self, entity: &str, column: &str) -> Option<&HashSet<String>> {
        self.columns.get(&(entity.to_string(), column.to_string()))
    }

    /// Share of the source column's distinct keys found in the target column.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn overlap(&self, source: (&str, &str), target: (&str, &str)) -> f64 {
        let (Some(from), Some(to)) = (self.get(source.0, source.1), self.get(target.0, target.1))
        else {
            return 0.0;
        };
        if from.is_empty() {
            return 0.0;
        }
        from.intersection(to).count() as f64 / from.len() as f64
    }
}

// =============================================================================
// Relationship Types
// =============================================================================

/// How the rows of two entities relate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    /// Both sides unique.
    OneToOne,
    /// Many source rows per target row.
    ManyToOne,
    /// One source row per many target rows.
    OneToMany,
    /// Neither side unique.
    ManyToMany,
}

impl Cardinality {
    /// Derives cardinality from the uniqueness of both columns.
    #[must_use]
    pub const fn from_uniqueness(source_unique: bool, target_unique: bool) -> Self {
        match (source_unique, target_unique) {
            (true, true) => Self::OneToOne,
            (false, true) => Self::ManyToOne,
            (true, false) => Self::OneToMany,
            (false, false) => Self::ManyToMany,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OneToOne => "ONE_TO_ONE",
            Self::ManyToOne => "MANY_TO_ONE",
            Self::OneToMany => "ONE_TO_MANY",
            Self::ManyToMany => "MANY_TO_MANY",
        })
    }
}

/// Kind of link between two entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    /// A column holds keys of another entity.
    ForeignKey,
    /// A formula reads cells of another sheet.
    FormulaReference,
}

/// Referential action on delete or update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    /// Reject the change while references exist.
    Restrict,
    /// Propagate the change.
    Cascade,
}

impl ReferentialAction {
    /// `(on_delete, on_update)` defaults for a cardinality.
    #[must_use]
    pub const fn defaults(cardinality: Cardinality) -> (Self, Self) {
        match cardinality {
            Cardinality::ManyToOne | Cardinality::OneToOne => (Self::Restrict, Self::Cascade),
            Cardinality::OneToMany | Cardinality::ManyToMany => (Self::Cascade, Self::Cascade),
        }
    }
}

/// Which signal found a relationship.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Name, value and type scoring.
    ColumnMatch,
    /// Sheet-qualified formula reference.
    FormulaReference,
}

/// Sub-scores behind a relationship.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMetadata {
    /// Which signal found the relationship.
    pub detection_method: DetectionMethod,
    /// Value overlap score.
    pub value_overlap: f64,
    /// Name similarity score.
    pub name_similarity: f64,
    /// Type compatibility score.
    pub type_compatibility: f64,
}

/// A link between two entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Identifier, `rel_<n>`.
    pub id: String,
    /// Source entity id.
    pub from_entity: String,
    /// Source column.
    pub from_column: String,
    /// Target entity id.
    pub to_entity: String,
    /// Target column.
    pub to_column: String,
    /// Kind of link.
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    /// Row cardinality.
    pub cardinality: Cardinality,
    /// Combined confidence in [0, 1].
    pub confidence: f64,
    /// Human-readable summary.
    pub description: String,
    /// Action when the target row is deleted.
    pub on_delete: ReferentialAction,
    /// Action when the target key changes.
    pub on_update: ReferentialAction,
    /// Sub-scores.
    pub metadata: RelationshipMetadata,
}

// =============================================================================
// Scoring
// =============================================================================

/// Name similarity of a column to a target entity.
#[must_use]
pub fn name_score(column: &str, target: &Entity) -> f64 {
    let name = target.name.as_str();
    let table = target.table_name.as_str();
    if name.is_empty() || table.is_empty() {
        return 0.0;
    }
    if column == format!("{table}_id") || column == format!("{name}_id") {
        return 1.0;
    }
    let base = column.strip_suffix("_id").unwrap_or(column);
    if base == table || singularize(base) == name {
        return 0.95;
    }
    if column.starts_with(name) || column.starts_with(table) {
        return 0.9;
    }
    if column.contains(name) || column.contains(table) {
        return 0.7;
    }
    // `category_id` against `product_categories`.
    let singular = singularize(base);
    if singular.len() > 2 && name.contains(&singular) {
        return 0.65;
    }
    0.0
}

/// Type compatibility of a source column with a target key.
#[must_use]
pub fn type_score(source: DataType, target: DataType) -> f64 {
    if source == target {
        1.0
    } else if source.is_numeric_family() && target.is_numeric_family() {
        0.9
    } else if source == DataType::Text {
        0.7
    } else {
        0.0
    }
}

/// Finds foreign-key relationships between entities.
#[derive(Debug)]
pub struct RelationshipFinder<'a> {
    thresholds: &'a DetectionThresholds,
}

impl<'a> RelationshipFinder<'a> {
    /// Creates a finder.
    #[must_use]
    pub fn new(thresholds: &'a DetectionThresholds) -> Self {
        Self { thresholds }
    }

    /// Scores every ordered entity pair and returns accepted, deduplicated
    /// relationships numbered `rel_1`, `rel_2`, ...
    #[must_use]
    pub fn find(&self, entities: &[Entity], values: &ValueIndex) -> Vec<Relationship> {
        let per_source: Vec<Vec<Relationship>> = entities
            .par_iter()
            .map(|source| {
                entities
                    .iter()
                    .filter(|target| target.id != source.id)
                    .flat_map(|target| self.candidates(source, target, values))
                    .collect()
            })
            .collect();

        let mut found = deduplicate(per_source.into_iter().flatten().collect());
        renumber(&mut found, 1);
        info!(relationships = found.len(), "found relationships");
        found
    }

    fn candidates(&self, source: &Entity, target: &Entity, values: &ValueIndex) -> Vec<Relationship> {
        let Some(target_key) = target.primary_key_column() else {
            return Vec::new();
        };
        source
            .columns
            .iter()
            .filter(|c| !source.is_primary_key(&c.name))
            .filter_map(|column| self.score(source, column, target, target_key, values))
            .collect()
    }

    fn score(
        &self,
        source: &Entity,
        column: &ColumnMetadata,
        target: &Entity,
        target_key: &ColumnMetadata,
        values: &ValueIndex,
    ) -> Option<Relationship> {
        let weights = &self.thresholds.relationship_weights;
        let name = name_score(&column.name, target);
        let overlap = values.overlap(
            (source.id.as_str(), column.name.as_str()),
            (target.id.as_str(), target_key.name.as_str()),
        );
        let types = type_score(column.data_type, target_key.data_type);
        let confidence = (weights.name * name
            + weights.value_overlap * overlap
            + weights.type_compatibility * types)
            .clamp(0.0, 1.0);
        if confidence < self.thresholds.relationship_accept {
            return None;
        }
        debug!(
            from = %source.id,
            column = %column.name,
            to = %target.id,
            name,
            overlap,
            types,
            confidence,
            "accepted relationship candidate"
        );

        let cardinality = Cardinality::from_uniqueness(column.is_unique, target_key.is_unique);
        let (on_delete, on_update) = ReferentialAction::defaults(cardinality);
        Some(Relationship {
            id: String::new(),
            from_entity: source.id.clone(),
            from_column: column.name.clone(),
            to_entity: target.id.clone(),
            to_column: target_key.name.clone(),
            kind: RelationshipKind::ForeignKey,
            cardinality,
            confidence,
            description: describe(source, &column.name, target, cardinality),
            on_delete,
            on_update,
            metadata: RelationshipMetadata {
                detection_method: DetectionMethod::ColumnMatch,
                value_overlap: overlap,
                name_similarity: name,
                type_compatibility: types,
            },
        })
    }
}

fn describe(source: &Entity, column: &str, target: &Entity, cardinality: Cardinality) -> String {
    match cardinality {
        Cardinality::ManyToOne => format!(
            "each {} references one {} via {column}",
            source.name, target.name
        ),
        Cardinality::OneToOne => format!(
            "each {} matches exactly one {} via {column}",
            source.name, target.name
        ),
        Cardinality::OneToMany | Cardinality::ManyToMany => format!(
            "{}.{column} relates to {} ({cardinality})",
            source.table_name, target.table_name
        ),
    }
}

/// Keeps the highest-confidence relationship per `(from_entity, from_column)`.
///
/// Surviving relationships keep their first-seen order; earlier candidates
/// win ties. Applying this twice gives the same result as applying it once.
#[must_use]
pub fn deduplicate(relationships: Vec<Relationship>) -> Vec<Relationship> {
    let mut best: Vec<Relationship> = Vec::with_capacity(relationships.len());
    let mut slots: HashMap<(String, String), usize> = HashMap::new();
    for rel in relationships {
        let key = (rel.from_entity.clone(), rel.from_column.clone());
        match slots.get(&key).copied() {
            Some(i) if rel.confidence > best[i].confidence => best[i] = rel,
            Some(_) => {}
            None => {
                slots.insert(key, best.len());
                best.push(rel);
            }
        }
    }
    best
}

/// Assigns `rel_<n>` ids in order, starting at `first`.
pub fn renumber(relationships: &mut [Relationship], first: usize) {
    for (n, rel) in relationships.iter_mut().enumerate() {
        rel.id = format!("rel_{}", first + n);
    }
}
