//! Entity extraction: one entity per normalized table.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sheetwise_foundation::naming::{singularize, snake_case};
use sheetwise_foundation::{DataType, DetectionThresholds, SemanticType, Warning};
use sheetwise_table::Table;
use tracing::{debug, info};

use crate::classifier::{ColumnClassifier, ColumnMetadata};
use crate::relationship::ValueIndex;

/// Column names accepted as a primary key by convention alone.
const CONVENTIONAL_KEYS: &[&str] = &["id", "pk", "key"];

/// Which selection rule picked an entity's primary key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKeyRule {
    /// A unique column with the `PRIMARY_KEY` semantic type.
    Semantic,
    /// A unique column literally named `id`, `pk` or `key`.
    ConventionalName,
    /// A unique column of data type `id`.
    IdType,
    /// Any unique column without nulls.
    UniqueNonNullable,
}

/// A candidate database table derived from a sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier; equals `table_name`.
    pub id: String,
    /// Singular snake_case name.
    pub name: String,
    /// Singularized sheet name for display.
    pub display_name: String,
    /// Plural snake_case table name, unique within the analysis.
    pub table_name: String,
    /// Source sheet name.
    pub sheet: String,
    /// Zero-based sheet position.
    pub sheet_index: usize,
    /// Classified columns in sheet order.
    pub columns: Vec<ColumnMetadata>,
    /// Name of the primary-key column.
    pub primary_key: Option<String>,
    /// Rule that selected the primary key.
    pub primary_key_rule: Option<PrimaryKeyRule>,
    /// Human-readable summary.
    pub description: String,
    /// Number of records.
    pub row_count: usize,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

impl Entity {
    /// Returns a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary-key column.
    #[must_use]
    pub fn primary_key_column(&self) -> Option<&ColumnMetadata> {
        self.primary_key.as_deref().and_then(|pk| self.column(pk))
    }

    /// Returns true if `column` is the primary key.
    #[must_use]
    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.as_deref() == Some(column)
    }
}

/// Entities plus what relationship detection needs from their tables.
#[derive(Debug, Default)]
pub struct Extraction {
    /// One entity per table, in table order.
    pub entities: Vec<Entity>,
    /// Distinct value keys per entity column.
    pub values: ValueIndex,
    /// Findings such as renamed tables and missing keys.
    pub warnings: Vec<Warning>,
}

/// The warning raised for an entity without a primary key.
#[must_use]
pub fn missing_key_warning(entity: &str) -> Warning {
    Warning::high(format!("entity '{entity}' has no primary key"))
        .with_suggestion("add a synthetic auto-increment id column")
        .with_entity(entity)
}

/// Returns `(name, display_name, table_name)` for a sheet.
#[must_use]
pub fn entity_names(sheet: &str) -> (String, String, String) {
    let display = singularize(sheet.trim());
    (snake_case(&display), display, snake_case(sheet))
}

/// Builds entities from normalized tables.
#[derive(Debug)]
pub struct EntityExtractor<'a> {
    thresholds: &'a DetectionThresholds,
}

impl<'a> EntityExtractor<'a> {
    /// Creates an extractor.
    #[must_use]
    pub fn new(thresholds: &'a DetectionThresholds) -> Self {
        Self { thresholds }
    }

    /// Classifies each table and turns it into an entity.
    ///
    /// Tables are classified in parallel; naming and key selection run in
    /// table order so that collisions resolve the same way every time.
    #[must_use]
    pub fn extract(&self, tables: &[Table]) -> Extraction {
        let classifier = ColumnClassifier::new(self.thresholds);
        let classified: Vec<Vec<ColumnMetadata>> = tables
            .par_iter()
            .map(|table| {
                let (owner, _, _) = entity_names(&table.sheet);
                classifier.classify_table(table, Some(&owner))
            })
            .collect();

        let mut extraction = Extraction::default();
        let mut taken = HashSet::new();
        for (table, columns) in tables.iter().zip(classified) {
            let entity = self.build(table, columns, &mut taken, &mut extraction.warnings);
            for column in &table.columns {
                extraction.values.insert(
                    &entity.id,
                    &column.name,
                    column.values.iter().filter(|v| !v.is_empty()).map(|v| v.key()),
                );
            }
            extraction.entities.push(entity);
        }
        info!(entities = extraction.entities.len(), "extracted entities");
        extraction
    }

    fn build(
        &self,
        table: &Table,
        columns: Vec<ColumnMetadata>,
        taken: &mut HashSet<String>,
        warnings: &mut Vec<Warning>,
    ) -> Entity {
        let (mut name, display_name, mut table_name) = entity_names(&table.sheet);
        if table_name.is_empty() {
            table_name = format!("sheet_{}", table.sheet_index + 1);
            name.clone_from(&table_name);
        }
        if !taken.insert(table_name.clone()) {
            // Start at the sheet position and count up past names other sheets hold.
            let mut suffix = table.sheet_index + 1;
            while taken.contains(&format!("{table_name}_{suffix}")) {
                suffix += 1;
            }
            let renamed = format!("{table_name}_{suffix}");
            warnings.push(
                Warning::low(format!(
                    "sheet '{}' collides with table '{table_name}'; renamed to '{renamed}'",
                    table.sheet
                ))
                .with_entity(renamed.clone()),
            );
            name = format!("{name}_{suffix}");
            table_name = renamed;
            taken.insert(table_name.clone());
        }

        let key = select_primary_key(&columns);
        if key.is_none() {
            warnings.push(missing_key_warning(&table_name));
        }
        let confidence = entity_confidence(&columns, key.is_some());
        if confidence < self.thresholds.low_confidence {
            debug!(entity = %table_name, confidence, "low-confidence entity");
        }

        let description = format!(
            "{} records from sheet '{}' with {} columns",
            table.row_count(),
            table.sheet,
            columns.len()
        );
        let (primary_key, primary_key_rule) = key.unzip();
        debug!(entity = %table_name, primary_key = ?primary_key, confidence, "built entity");

        Entity {
            id: table_name.clone(),
            name,
            display_name,
            table_name,
            sheet: table.sheet.clone(),
            sheet_index: table.sheet_index,
            columns,
            primary_key,
            primary_key_rule,
            description,
            row_count: table.row_count(),
            confidence,
        }
    }
}

/// Picks a primary key by the first matching rule.
#[must_use]
pub fn select_primary_key(columns: &[ColumnMetadata]) -> Option<(String, PrimaryKeyRule)> {
    let rules: [(PrimaryKeyRule, fn(&ColumnMetadata) -> bool); 4] = [
        (PrimaryKeyRule::Semantic, |c| {
            c.semantic_type == Some(SemanticType::PrimaryKey)
        }),
        (PrimaryKeyRule::ConventionalName, |c| {
            CONVENTIONAL_KEYS.contains(&c.name.as_str())
        }),
        (PrimaryKeyRule::IdType, |c| c.data_type == DataType::Id),
        (PrimaryKeyRule::UniqueNonNullable, |c| !c.nullable),
    ];
    rules.into_iter().find_map(|(rule, matches)| {
        columns
            .iter()
            .find(|c| c.is_unique && matches(c))
            .map(|c| (c.name.clone(), rule))
    })
}

#[allow(clippy::cast_precision_loss)]
fn entity_confidence(columns: &[ColumnMetadata], has_key: bool) -> f64 {
    if columns.is_empty() {
        return 0.0;
    }
    let n = columns.len() as f64;
    let mean = columns.iter().map(|c| c.confidence).sum::<f64>() / n;
    let empty = columns
        .iter()
        .filter(|c| c.data_type == DataType::Empty)
        .count() as f64;
    let penalty = if has_key { 0.0 } else { 0.3 };
    (mean - penalty - 0.1 * empty / n).clamp(0.0, 1.0)
}
