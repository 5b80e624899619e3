//! Assembly of the four documents from an analysis.
//!
//! Generation adds no inference of its own. It formats what the analysis
//! found, maps data types to SQL types, lays out the diagram and builds the
//! review screen.

use std::collections::BTreeMap;

use sheetwise_engine::AnalysisResult;
use sheetwise_foundation::{DataType, DetectionThresholds, SemanticType, Warning};
use sheetwise_formula::{AutomationRule, RuleAction, RuleImplementation, RuleType};
use sheetwise_schema::{
    ColumnMetadata, ColumnStats, Entity, Relationship, RelationshipKind,
};
use tracing::debug;

use crate::bundle::OutputBundle;
use crate::documents::{
    AutomationRulesDocument, ColumnItem, ColumnSchema, ColumnSchemaMetadata, ColumnValidation,
    ConfidenceLevel, ConfirmationUi, ConstraintKind, ConstraintSpec, DOCUMENT_VERSION, Diagram,
    DiagramEdge, DiagramNode, EdgeStyle, EntityItem, EntitySchema, ForeignKeySpec, IndexKind,
    IndexSpec, NodeMetadata, Position, RelationshipItem, RelationshipsDocument, RuleItem,
    SchemaDocument, SchemaMetadata, Size, StepAction, Summary, UiAction, UiSection, WarningItem,
    Workflow, WorkflowStep, WorkflowTrigger,
};
use crate::sql::{range_expression, sql_type, value_pattern, value_range};

/// Horizontal distance between diagram columns.
const NODE_SPACING_X: f64 = 250.0;
/// Vertical distance between diagram rows.
const NODE_SPACING_Y: f64 = 180.0;
/// Node width.
const NODE_WIDTH: f64 = 200.0;
/// Confidence at and above which an item is `high`.
const HIGH_CONFIDENCE: f64 = 0.8;

/// Generates documents with default thresholds.
#[must_use]
pub fn generate(result: &AnalysisResult) -> OutputBundle {
    OutputGenerator::new(&DetectionThresholds::default()).generate(result)
}

/// Builds the output documents.
#[derive(Clone, Copy, Debug)]
pub struct OutputGenerator<'a> {
    thresholds: &'a DetectionThresholds,
}

impl<'a> OutputGenerator<'a> {
    /// Creates a generator. Only the low-confidence threshold is read, to
    /// band review items.
    #[must_use]
    pub const fn new(thresholds: &'a DetectionThresholds) -> Self {
        Self { thresholds }
    }

    /// Builds all four documents.
    #[must_use]
    pub fn generate(&self, result: &AnalysisResult) -> OutputBundle {
        let bundle = OutputBundle {
            schema: self.schema(result),
            relationships: self.relationships(result),
            automation_rules: self.automation_rules(result),
            confirmation_ui: self.confirmation_ui(result),
        };
        debug!(
            source = %result.source_file,
            entities = bundle.schema.entities.len(),
            workflows = bundle.automation_rules.workflows.len(),
            "generated documents"
        );
        bundle
    }

    // =========================================================================
    // schema.json
    // =========================================================================

    /// Builds `schema.json`.
    #[must_use]
    pub fn schema(&self, result: &AnalysisResult) -> SchemaDocument {
        SchemaDocument {
            version: DOCUMENT_VERSION.to_string(),
            metadata: SchemaMetadata {
                source_file: result.source_file.clone(),
                generated_at: result.generated_at,
                confidence: result.score.overall,
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                warnings: result.score.warnings.clone(),
            },
            entities: result
                .entities
                .iter()
                .map(|entity| entity_schema(entity, &result.relationships))
                .collect(),
        }
    }

    // =========================================================================
    // relationships.json
    // =========================================================================

    /// Builds `relationships.json`.
    #[must_use]
    pub fn relationships(&self, result: &AnalysisResult) -> RelationshipsDocument {
        RelationshipsDocument {
            version: DOCUMENT_VERSION.to_string(),
            relationships: result.relationships.clone(),
            diagram: Diagram {
                layout: "grid".to_string(),
                nodes: self.diagram_nodes(&result.entities),
                edges: result.relationships.iter().map(diagram_edge).collect(),
            },
        }
    }

    fn diagram_nodes(&self, entities: &[Entity]) -> Vec<DiagramNode> {
        let columns = grid_columns(entities.len());
        entities
            .iter()
            .enumerate()
            .map(|(i, entity)| DiagramNode {
                id: entity.id.clone(),
                label: entity.display_name.clone(),
                kind: "entity".to_string(),
                position: Position {
                    x: f64::from(to_u32(i % columns)) * NODE_SPACING_X,
                    y: f64::from(to_u32(i / columns)) * NODE_SPACING_Y,
                },
                color: self.node_color(entity.confidence).to_string(),
                size: node_size(entity.columns.len()),
                metadata: NodeMetadata {
                    table_name: entity.table_name.clone(),
                    column_count: entity.columns.len(),
                    row_count: entity.row_count,
                    confidence: entity.confidence,
                },
            })
            .collect()
    }

    fn node_color(&self, confidence: f64) -> &'static str {
        match self.level(confidence) {
            ConfidenceLevel::High => "#4CAF50",
            ConfidenceLevel::Medium => "#FFC107",
            ConfidenceLevel::Low => "#F44336",
        }
    }

    // =========================================================================
    // automation_rules.json
    // =========================================================================

    /// Builds `automation_rules.json`. Rules are ordered by priority, then id.
    #[must_use]
    pub fn automation_rules(&self, result: &AnalysisResult) -> AutomationRulesDocument {
        let mut rules = result.rules.clone();
        rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        let workflows = workflows(&rules);
        AutomationRulesDocument {
            version: DOCUMENT_VERSION.to_string(),
            rules,
            workflows,
        }
    }

    // =========================================================================
    // confirmation_ui.json
    // =========================================================================

    /// Builds `confirmation_ui.json`.
    #[must_use]
    pub fn confirmation_ui(&self, result: &AnalysisResult) -> ConfirmationUi {
        let score = &result.score;
        let sections = vec![
            UiSection::SummaryCard {
                id: "summary".to_string(),
                title: "Analysis summary".to_string(),
                summary: Summary {
                    source_file: result.source_file.clone(),
                    sheets: result.sheets.len(),
                    entities: result.entities.len(),
                    relationships: result.relationships.len(),
                    rules: result.rules.len(),
                    warnings: score.warnings.len(),
                    overall_confidence: score.overall,
                    confidence_level: self.level(score.overall),
                    structure: score.structure,
                    entity_score: score.entities,
                    relationship_score: score.relationships,
                    formula_score: score.formulas,
                },
            },
            UiSection::EntityList {
                id: "entities".to_string(),
                title: "Detected tables".to_string(),
                items: result.entities.iter().map(|e| self.entity_item(e)).collect(),
            },
            UiSection::RelationshipDiagram {
                id: "relationships".to_string(),
                title: "Relationships".to_string(),
                items: result
                    .relationships
                    .iter()
                    .map(|r| self.relationship_item(r))
                    .collect(),
            },
            UiSection::RuleList {
                id: "rules".to_string(),
                title: "Automation rules".to_string(),
                items: result.rules.iter().map(|r| self.rule_item(r)).collect(),
            },
            UiSection::WarningList {
                id: "warnings".to_string(),
                title: "Needs review".to_string(),
                items: score.warnings.iter().map(warning_item).collect(),
            },
        ];

        ConfirmationUi {
            version: DOCUMENT_VERSION.to_string(),
            title: format!("Review the structure of {}", result.source_file),
            subtitle: format!(
                "{} tables, {} relationships and {} rules found with {:.0}% confidence",
                result.entities.len(),
                result.relationships.len(),
                result.rules.len(),
                score.overall * 100.0
            ),
            sections,
            actions: screen_actions(),
        }
    }

    fn entity_item(&self, entity: &Entity) -> EntityItem {
        EntityItem {
            id: entity.id.clone(),
            name: entity.display_name.clone(),
            table_name: entity.table_name.clone(),
            sheet: entity.sheet.clone(),
            primary_key: entity.primary_key.clone(),
            row_count: entity.row_count,
            confidence: entity.confidence,
            confidence_level: self.level(entity.confidence),
            columns: entity
                .columns
                .iter()
                .map(|c| ColumnItem {
                    name: c.name.clone(),
                    data_type: c.data_type.name().to_string(),
                    semantic_type: c.semantic_type.as_ref().map(ToString::to_string),
                    sample_values: c.sample_values.clone(),
                    confidence: c.confidence,
                })
                .collect(),
            editable_fields: strings(&["name", "table_name", "primary_key", "columns"]),
            actions: strings(&["confirm", "rename", "exclude"]),
        }
    }

    fn relationship_item(&self, relationship: &Relationship) -> RelationshipItem {
        RelationshipItem {
            id: relationship.id.clone(),
            from: format!("{}.{}", relationship.from_entity, relationship.from_column),
            to: format!("{}.{}", relationship.to_entity, relationship.to_column),
            kind: relationship.kind,
            cardinality: relationship.cardinality,
            confidence: relationship.confidence,
            confidence_level: self.level(relationship.confidence),
            description: relationship.description.clone(),
            editable_fields: strings(&["cardinality", "on_delete", "on_update"]),
            actions: strings(&["confirm", "reject"]),
        }
    }

    fn rule_item(&self, rule: &AutomationRule) -> RuleItem {
        let mut actions = strings(&["confirm", "disable"]);
        if rule.rule_type == RuleType::Formula {
            actions.push("edit_manually".to_string());
        }
        RuleItem {
            id: rule.id.clone(),
            name: rule.name.clone(),
            rule_type: rule.rule_type.name().to_string(),
            entity: rule.entity.clone(),
            formula: rule.source.formula.clone(),
            location: rule.source.location.clone(),
            occurrences: rule.occurrences,
            confidence: rule.confidence,
            confidence_level: self.level(rule.confidence),
            description: rule.description.clone(),
            editable_fields: strings(&["name", "enabled", "priority"]),
            actions,
        }
    }

    fn level(&self, confidence: f64) -> ConfidenceLevel {
        if confidence >= HIGH_CONFIDENCE {
            ConfidenceLevel::High
        } else if confidence >= self.thresholds.low_confidence {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

// =============================================================================
// Schema Helpers
// =============================================================================

fn entity_schema(entity: &Entity, relationships: &[Relationship]) -> EntitySchema {
    let foreign_keys: BTreeMap<&str, &Relationship> = relationships
        .iter()
        .filter(|r| r.kind == RelationshipKind::ForeignKey && r.from_entity == entity.id)
        .map(|r| (r.from_column.as_str(), r))
        .collect();

    let columns = entity
        .columns
        .iter()
        .map(|column| {
            let is_pk = entity.primary_key.as_deref() == Some(column.name.as_str());
            column_schema(column, is_pk, foreign_keys.get(column.name.as_str()).copied())
        })
        .collect();

    let table = &entity.table_name;
    let mut indexes = Vec::new();
    if let Some(pk) = &entity.primary_key {
        indexes.push(IndexSpec {
            name: format!("pk_{table}"),
            columns: vec![pk.clone()],
            kind: IndexKind::Primary,
        });
    }
    for column in foreign_keys.keys() {
        indexes.push(IndexSpec {
            name: format!("idx_{table}_{column}"),
            columns: vec![(*column).to_string()],
            kind: IndexKind::Index,
        });
    }

    let mut constraints = Vec::new();
    for column in &entity.columns {
        let is_pk = entity.primary_key.as_deref() == Some(column.name.as_str());
        if column.is_unique && !is_pk {
            constraints.push(ConstraintSpec {
                name: format!("uq_{table}_{}", column.name),
                kind: ConstraintKind::Unique,
                expression: format!("UNIQUE ({})", column.name),
            });
        }
        if let Some(expression) = value_range(column)
            .and_then(|(min, max)| range_expression(&column.name, min, max))
        {
            constraints.push(ConstraintSpec {
                name: format!("chk_{table}_{}", column.name),
                kind: ConstraintKind::Check,
                expression,
            });
        }
    }

    EntitySchema {
        name: entity.name.clone(),
        table_name: entity.table_name.clone(),
        description: entity.description.clone(),
        primary_key: entity.primary_key.clone(),
        columns,
        indexes,
        constraints,
    }
}

fn column_schema(
    column: &ColumnMetadata,
    is_pk: bool,
    foreign_key: Option<&Relationship>,
) -> ColumnSchema {
    let sequential = matches!(column.stats, ColumnStats::Numeric { sequential: true, .. });
    let auto_increment = (is_pk && column.data_type == DataType::Id && sequential).then_some(true);
    let default = matches!(
        column.semantic_type,
        Some(SemanticType::DateCreated | SemanticType::DateModified)
    )
    .then(|| "CURRENT_TIMESTAMP".to_string());

    ColumnSchema {
        name: column.name.clone(),
        sql_type: sql_type(column),
        nullable: column.nullable && !is_pk,
        unique: column.is_unique,
        default,
        auto_increment,
        description: column_description(column, is_pk),
        validation: validation(column),
        foreign_key: foreign_key.map(|r| ForeignKeySpec {
            references: format!("{}.{}", r.to_entity, r.to_column),
            on_delete: r.on_delete,
            on_update: r.on_update,
        }),
        metadata: ColumnSchemaMetadata {
            original_column: column.original_name.clone(),
            data_type: column.data_type.name().to_string(),
            semantic_type: column.semantic_type.as_ref().map(ToString::to_string),
            confidence: column.confidence,
        },
    }
}

fn column_description(column: &ColumnMetadata, is_pk: bool) -> String {
    let role = if is_pk { ", primary key" } else { "" };
    format!(
        "{} from column '{}'{role}",
        column.data_type, column.original_name
    )
}

fn validation(column: &ColumnMetadata) -> Option<ColumnValidation> {
    let mut validation = ColumnValidation {
        pattern: value_pattern(column.data_type).map(str::to_string),
        ..ColumnValidation::default()
    };
    if let Some((min, max)) = value_range(column) {
        validation.min = min;
        validation.max = max;
    }
    if let (DataType::Enum, ColumnStats::Enum { values, .. }) = (column.data_type, &column.stats) {
        validation.allowed.clone_from(values);
    }
    (!validation.is_empty()).then_some(validation)
}

// =============================================================================
// Diagram Helpers
// =============================================================================

/// Smallest column count whose square holds `n` nodes.
fn grid_columns(n: usize) -> usize {
    let mut columns = 1;
    while columns * columns < n {
        columns += 1;
    }
    columns
}

fn node_size(column_count: usize) -> Size {
    let shown = to_u32(column_count.min(12));
    Size {
        width: NODE_WIDTH,
        height: 40.0 + 20.0 * f64::from(shown),
    }
}

fn diagram_edge(relationship: &Relationship) -> DiagramEdge {
    let style = EdgeStyle::from(relationship.kind);
    DiagramEdge {
        id: relationship.id.clone(),
        from: relationship.from_entity.clone(),
        to: relationship.to_entity.clone(),
        label: relationship.from_column.clone(),
        cardinality: relationship.cardinality,
        style,
        color: match style {
            EdgeStyle::Solid => "#2196F3",
            EdgeStyle::Dashed => "#9C27B0",
        }
        .to_string(),
        thickness: 1.0 + 2.0 * relationship.confidence.clamp(0.0, 1.0),
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// =============================================================================
// Workflow Helpers
// =============================================================================

/// One workflow per entity owning trigger rules, in first-seen order.
fn workflows(rules: &[AutomationRule]) -> Vec<Workflow> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_entity: BTreeMap<&str, Vec<&AutomationRule>> = BTreeMap::new();
    for rule in rules.iter().filter(|r| r.rule_type == RuleType::Trigger) {
        if !by_entity.contains_key(rule.entity.as_str()) {
            order.push(&rule.entity);
        }
        by_entity.entry(&rule.entity).or_default().push(rule);
    }

    order
        .into_iter()
        .map(|entity| {
            let steps = by_entity
                .get(entity)
                .into_iter()
                .flatten()
                .flat_map(|rule| trigger_steps(rule))
                .collect();
            Workflow {
                id: format!("workflow_{entity}"),
                name: format!("{entity} triggers"),
                trigger: WorkflowTrigger {
                    kind: "RECORD_SAVED".to_string(),
                    entity: entity.to_string(),
                },
                steps,
            }
        })
        .collect()
}

/// `evaluate_condition` followed by one step per action, each depending on
/// the one before.
fn trigger_steps(rule: &AutomationRule) -> Vec<WorkflowStep> {
    let RuleImplementation::Trigger {
        condition, actions, ..
    } = &rule.implementation
    else {
        return Vec::new();
    };

    let evaluate = WorkflowStep {
        id: format!("{}_evaluate", rule.id),
        name: format!("Check {condition}"),
        action: StepAction::EvaluateCondition,
        depends_on: Vec::new(),
        rule: rule.id.clone(),
        condition: Some(condition.clone()),
        field: None,
        value: None,
        message: None,
    };

    let mut steps = vec![evaluate];
    for (n, action) in actions.iter().enumerate() {
        let previous = steps.last().map(|s| s.id.clone()).into_iter().collect();
        let step = match action {
            RuleAction::SetField { field, value } => WorkflowStep {
                id: format!("{}_set_field_{}", rule.id, n + 1),
                name: format!(
                    "Set {} to {value}",
                    field.as_deref().unwrap_or("the result")
                ),
                action: StepAction::SetField,
                depends_on: previous,
                rule: rule.id.clone(),
                condition: None,
                field: field.clone(),
                value: Some(value.clone()),
                message: None,
            },
            RuleAction::Notify { message } => WorkflowStep {
                id: format!("{}_notify_{}", rule.id, n + 1),
                name: "Notify".to_string(),
                action: StepAction::Notify,
                depends_on: previous,
                rule: rule.id.clone(),
                condition: None,
                field: None,
                value: None,
                message: Some(message.clone()),
            },
        };
        steps.push(step);
    }
    steps
}

// =============================================================================
// UI Helpers
// =============================================================================

fn warning_item(warning: &Warning) -> WarningItem {
    WarningItem {
        severity: warning.severity,
        message: warning.message.clone(),
        suggestion: warning.suggestion.clone(),
        entity: warning.entity.clone(),
        actions: strings(&["acknowledge"]),
    }
}

fn screen_actions() -> Vec<UiAction> {
    vec![
        UiAction {
            id: "confirm_all".to_string(),
            label: "Confirm and build".to_string(),
            kind: "primary".to_string(),
            action: "confirm_schema".to_string(),
            requires: strings(&["entities", "relationships"]),
        },
        UiAction {
            id: "reanalyze".to_string(),
            label: "Analyze again".to_string(),
            kind: "secondary".to_string(),
            action: "reanalyze".to_string(),
            requires: Vec::new(),
        },
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}
