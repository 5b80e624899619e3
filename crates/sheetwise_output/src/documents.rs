//! The four output documents.
//!
//! Every document is plain data: `Serialize` for writing and `Deserialize`
//! so consumers and tests can read them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetwise_foundation::{Severity, Warning};
use sheetwise_formula::{AutomationRule, Condition, Operand};
use sheetwise_schema::{Cardinality, ReferentialAction, Relationship, RelationshipKind};

/// Format version written into every document.
pub const DOCUMENT_VERSION: &str = "1.0";

// =============================================================================
// schema.json
// =============================================================================

/// `schema.json`: tables, columns, indexes and constraints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Document format version.
    pub version: String,
    /// Provenance and overall confidence.
    pub metadata: SchemaMetadata,
    /// One table per entity.
    pub entities: Vec<EntitySchema>,
}

/// Provenance of a schema document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaMetadata {
    /// Analyzed file name.
    pub source_file: String,
    /// When the analysis ran.
    pub generated_at: DateTime<Utc>,
    /// Overall confidence.
    pub confidence: f64,
    /// Version of the engine that produced the document.
    pub engine_version: String,
    /// Every review warning, most severe first.
    pub warnings: Vec<Warning>,
}

/// A table definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Entity name, singular.
    pub name: String,
    /// Table name.
    pub table_name: String,
    /// Human-readable description.
    pub description: String,
    /// Primary key column, if one was found.
    pub primary_key: Option<String>,
    /// Columns in sheet order.
    pub columns: Vec<ColumnSchema>,
    /// Indexes to create.
    pub indexes: Vec<IndexSpec>,
    /// Table constraints.
    pub constraints: Vec<ConstraintSpec>,
}

impl EntitySchema {
    /// Returns a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A column definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// SQL type, like `VARCHAR(255)`.
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Accepts NULL.
    pub nullable: bool,
    /// Values are unique.
    pub unique: bool,
    /// Default value expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Generated by the database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_increment: Option<bool>,
    /// Human-readable description.
    pub description: String,
    /// Value checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ColumnValidation>,
    /// Referenced key, for foreign-key columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeySpec>,
    /// Where the column came from.
    pub metadata: ColumnSchemaMetadata,
}

/// Value checks on a column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnValidation {
    /// Smallest allowed value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Largest allowed value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regular expression values match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Allowed values.
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
}

impl ColumnValidation {
    /// True when no check is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.pattern.is_none() && self.allowed.is_empty()
    }
}

/// Target of a foreign key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    /// `table.column`.
    pub references: String,
    /// Action when the referenced row is deleted.
    pub on_delete: ReferentialAction,
    /// Action when the referenced key changes.
    pub on_update: ReferentialAction,
}

/// Provenance of a column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchemaMetadata {
    /// Header text on the sheet.
    pub original_column: String,
    /// Inferred data type name.
    pub data_type: String,
    /// Name-based semantic role.
    pub semantic_type: Option<String>,
    /// Classification confidence.
    pub confidence: f64,
}

/// Kind of index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexKind {
    /// Primary key index.
    Primary,
    /// Plain lookup index.
    Index,
}

/// An index definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Kind of index.
    #[serde(rename = "type")]
    pub kind: IndexKind,
}

/// Kind of table constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    /// Values are distinct.
    Unique,
    /// Values satisfy an expression.
    Check,
}

/// A table constraint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    /// Constraint name.
    pub name: String,
    /// Kind of constraint.
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    /// SQL expression.
    pub expression: String,
}

// =============================================================================
// relationships.json
// =============================================================================

/// `relationships.json`: relationships plus a diagram layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipsDocument {
    /// Document format version.
    pub version: String,
    /// Every relationship, foreign keys first.
    pub relationships: Vec<Relationship>,
    /// Entity-relationship diagram.
    pub diagram: Diagram,
}

/// Entity-relationship diagram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    /// Layout algorithm name.
    pub layout: String,
    /// One node per entity.
    pub nodes: Vec<DiagramNode>,
    /// One edge per relationship.
    pub edges: Vec<DiagramEdge>,
}

/// A diagram node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    /// Entity id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Always `"entity"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Top-left corner.
    pub position: Position,
    /// Fill color by confidence.
    pub color: String,
    /// Box size.
    pub size: Size,
    /// Facts shown on hover.
    pub metadata: NodeMetadata,
}

/// Diagram coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset.
    pub y: f64,
}

/// Diagram box size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Facts attached to a diagram node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Table name.
    pub table_name: String,
    /// Number of columns.
    pub column_count: usize,
    /// Number of records.
    pub row_count: usize,
    /// Entity confidence.
    pub confidence: f64,
}

/// Line style of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    /// Foreign keys.
    Solid,
    /// Formula references.
    Dashed,
}

impl From<RelationshipKind> for EdgeStyle {
    fn from(kind: RelationshipKind) -> Self {
        match kind {
            RelationshipKind::ForeignKey => Self::Solid,
            RelationshipKind::FormulaReference => Self::Dashed,
        }
    }
}

/// A diagram edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagramEdge {
    /// Relationship id.
    pub id: String,
    /// Source entity id.
    pub from: String,
    /// Target entity id.
    pub to: String,
    /// Label, the source column.
    pub label: String,
    /// Row cardinality.
    pub cardinality: Cardinality,
    /// Line style.
    pub style: EdgeStyle,
    /// Line color.
    pub color: String,
    /// Line thickness from confidence.
    pub thickness: f64,
}

// =============================================================================
// automation_rules.json
// =============================================================================

/// `automation_rules.json`: rules plus trigger workflows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutomationRulesDocument {
    /// Document format version.
    pub version: String,
    /// Rules ordered by priority.
    pub rules: Vec<AutomationRule>,
    /// One workflow per entity with triggers.
    pub workflows: Vec<Workflow>,
}

/// Trigger rules of one entity as a step sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Identifier, `workflow_<entity>`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What starts the workflow.
    pub trigger: WorkflowTrigger,
    /// Steps in execution order.
    pub steps: Vec<WorkflowStep>,
}

/// Event that starts a workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTrigger {
    /// Event name, `RECORD_SAVED`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Entity whose records raise the event.
    pub entity: String,
}

/// What a workflow step does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Evaluate a rule condition.
    EvaluateCondition,
    /// Write a field.
    SetField,
    /// Raise a notification.
    Notify,
}

/// One workflow step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Step id, unique within the workflow.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the step does.
    pub action: StepAction,
    /// Steps that must finish first.
    pub depends_on: Vec<String>,
    /// Rule the step comes from.
    pub rule: String,
    /// Condition, for evaluation steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Field written, for set-field steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Value written, for set-field steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Operand>,
    /// Notification text, for notify steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// confirmation_ui.json
// =============================================================================

/// `confirmation_ui.json`: the review screen description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationUi {
    /// Document format version.
    pub version: String,
    /// Screen title.
    pub title: String,
    /// Screen subtitle.
    pub subtitle: String,
    /// Sections in display order.
    pub sections: Vec<UiSection>,
    /// Screen-level actions.
    pub actions: Vec<UiAction>,
}

impl ConfirmationUi {
    /// Returns a section by id.
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&UiSection> {
        self.sections.iter().find(|s| s.id() == id)
    }
}

/// Review confidence band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// 0.8 and above.
    High,
    /// From the low-confidence threshold up to 0.8.
    Medium,
    /// Below the low-confidence threshold.
    Low,
}

/// A section of the review screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiSection {
    /// Headline numbers.
    SummaryCard {
        /// Section id.
        id: String,
        /// Section title.
        title: String,
        /// The numbers.
        summary: Summary,
    },
    /// Entities with their columns.
    EntityList {
        /// Section id.
        id: String,
        /// Section title.
        title: String,
        /// One item per entity.
        items: Vec<EntityItem>,
    },
    /// Relationships, drawn from the diagram in `relationships.json`.
    RelationshipDiagram {
        /// Section id.
        id: String,
        /// Section title.
        title: String,
        /// One item per relationship.
        items: Vec<RelationshipItem>,
    },
    /// Automation rules.
    RuleList {
        /// Section id.
        id: String,
        /// Section title.
        title: String,
        /// One item per rule.
        items: Vec<RuleItem>,
    },
    /// Review warnings.
    WarningList {
        /// Section id.
        id: String,
        /// Section title.
        title: String,
        /// One item per warning.
        items: Vec<WarningItem>,
    },
}

impl UiSection {
    /// Section id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::SummaryCard { id, .. }
            | Self::EntityList { id, .. }
            | Self::RelationshipDiagram { id, .. }
            | Self::RuleList { id, .. }
            | Self::WarningList { id, .. } => id,
        }
    }
}

/// Headline numbers of an analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Analyzed file name.
    pub source_file: String,
    /// Number of sheets in the workbook.
    pub sheets: usize,
    /// Number of entities.
    pub entities: usize,
    /// Number of relationships.
    pub relationships: usize,
    /// Number of rules.
    pub rules: usize,
    /// Number of warnings.
    pub warnings: usize,
    /// Overall confidence.
    pub overall_confidence: f64,
    /// Band of the overall confidence.
    pub confidence_level: ConfidenceLevel,
    /// Structure score.
    pub structure: f64,
    /// Entity score.
    pub entity_score: f64,
    /// Relationship score.
    pub relationship_score: f64,
    /// Formula score.
    pub formula_score: f64,
}

/// Review item for an entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityItem {
    /// Entity id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Table name.
    pub table_name: String,
    /// Source sheet.
    pub sheet: String,
    /// Primary key column.
    pub primary_key: Option<String>,
    /// Number of records.
    pub row_count: usize,
    /// Entity confidence.
    pub confidence: f64,
    /// Band of the confidence.
    pub confidence_level: ConfidenceLevel,
    /// Columns with their inferred types.
    pub columns: Vec<ColumnItem>,
    /// Fields a reviewer may change.
    pub editable_fields: Vec<String>,
    /// Actions offered on the item.
    pub actions: Vec<String>,
}

/// Column shown inside an entity item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnItem {
    /// Column name.
    pub name: String,
    /// Inferred data type name.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Semantic role.
    pub semantic_type: Option<String>,
    /// A few sample values.
    pub sample_values: Vec<String>,
    /// Classification confidence.
    pub confidence: f64,
}

/// Review item for a relationship.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipItem {
    /// Relationship id.
    pub id: String,
    /// `entity.column` on the source side.
    pub from: String,
    /// `entity.column` on the target side.
    pub to: String,
    /// Kind of link.
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    /// Row cardinality.
    pub cardinality: Cardinality,
    /// Confidence.
    pub confidence: f64,
    /// Band of the confidence.
    pub confidence_level: ConfidenceLevel,
    /// Human-readable summary.
    pub description: String,
    /// Fields a reviewer may change.
    pub editable_fields: Vec<String>,
    /// Actions offered on the item.
    pub actions: Vec<String>,
}

/// Review item for a rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleItem {
    /// Rule id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Rule type name.
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Owning entity.
    pub entity: String,
    /// Source formula.
    pub formula: String,
    /// Source location.
    pub location: String,
    /// Cells sharing the formula.
    pub occurrences: usize,
    /// Confidence.
    pub confidence: f64,
    /// Band of the confidence.
    pub confidence_level: ConfidenceLevel,
    /// Human-readable summary.
    pub description: String,
    /// Fields a reviewer may change.
    pub editable_fields: Vec<String>,
    /// Actions offered on the item.
    pub actions: Vec<String>,
}

/// Review item for a warning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WarningItem {
    /// Severity.
    pub severity: Severity,
    /// What was found.
    pub message: String,
    /// Suggested fix.
    pub suggestion: Option<String>,
    /// Affected entity.
    pub entity: Option<String>,
    /// Actions offered on the item.
    pub actions: Vec<String>,
}

/// A screen-level action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UiAction {
    /// Action id.
    pub id: String,
    /// Button label.
    pub label: String,
    /// `primary` or `secondary`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Command sent to the consumer.
    pub action: String,
    /// Sections that must be reviewed first.
    pub requires: Vec<String>,
}
