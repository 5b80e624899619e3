//! Tests for the content of the generated documents.

use sheetwise_output::{
    EdgeStyle, IndexKind, OutputGenerator, StepAction, UiSection, generate,
};
use sheetwise_foundation::DetectionThresholds;
use sheetwise_schema::RelationshipKind;

use crate::store;

// =============================================================================
// schema.json
// =============================================================================

#[test]
fn schema_has_one_table_per_entity() {
    let result = store();
    let schema = generate(&result).schema;

    let tables: Vec<_> = schema.entities.iter().map(|e| e.table_name.as_str()).collect();
    assert_eq!(tables, ["products", "suppliers", "orders", "inventory"]);
    assert_eq!(schema.metadata.source_file, "store.xlsx");
    assert!((schema.metadata.confidence - result.score.overall).abs() < f64::EPSILON);
    assert_eq!(schema.metadata.warnings, result.score.warnings);
}

#[test]
fn foreign_key_column_references_target() {
    let schema = generate(&store()).schema;
    let products = schema
        .entities
        .iter()
        .find(|e| e.table_name == "products")
        .unwrap();

    assert_eq!(products.primary_key.as_deref(), Some("product_id"));
    let supplier = products.column("supplier_id").unwrap();
    let foreign_key = supplier.foreign_key.as_ref().unwrap();
    assert_eq!(foreign_key.references, "suppliers.supplier_id");

    let names: Vec<_> = products.indexes.iter().map(|i| i.name.as_str()).collect();
    assert!(names.contains(&"pk_products"));
    assert!(names.contains(&"idx_products_supplier_id"));
    let primary = products
        .indexes
        .iter()
        .find(|i| i.name == "pk_products")
        .unwrap();
    assert_eq!(primary.kind, IndexKind::Primary);
    assert_eq!(primary.columns, ["product_id"]);
}

#[test]
fn column_types_and_provenance() {
    let schema = generate(&store()).schema;
    let products = &schema.entities[0];

    let id = products.column("product_id").unwrap();
    assert_eq!(id.sql_type, "INTEGER");
    assert!(!id.nullable);
    assert_eq!(id.metadata.original_column, "Product ID");

    let price = products.column("unit_price").unwrap();
    assert_eq!(price.sql_type, "DECIMAL(10,2)");
    assert!(price.foreign_key.is_none());
}

#[test]
fn schema_serializes_sql_type_as_type() {
    let schema = generate(&store()).schema;
    let json = serde_json::to_value(&schema).unwrap();
    let column = &json["entities"][0]["columns"][0];
    assert_eq!(column["name"], "product_id");
    assert_eq!(column["type"], "INTEGER");
    assert_eq!(json["version"], "1.0");
}

// =============================================================================
// relationships.json
// =============================================================================

#[test]
fn diagram_mirrors_relationships() {
    let result = store();
    let document = generate(&result).relationships;

    assert_eq!(document.relationships, result.relationships);
    assert_eq!(document.diagram.nodes.len(), result.entities.len());
    assert_eq!(document.diagram.edges.len(), result.relationships.len());

    for (edge, relationship) in document.diagram.edges.iter().zip(&result.relationships) {
        assert_eq!(edge.id, relationship.id);
        assert_eq!(edge.from, relationship.from_entity);
        assert_eq!(edge.to, relationship.to_entity);
        let expected = match relationship.kind {
            RelationshipKind::ForeignKey => EdgeStyle::Solid,
            RelationshipKind::FormulaReference => EdgeStyle::Dashed,
        };
        assert_eq!(edge.style, expected);
        assert!((1.0..=3.0).contains(&edge.thickness));
    }
    assert!(document.diagram.edges.iter().any(|e| e.style == EdgeStyle::Solid));
    assert!(document.diagram.edges.iter().any(|e| e.style == EdgeStyle::Dashed));
}

#[test]
fn diagram_nodes_do_not_overlap() {
    let nodes = generate(&store()).relationships.diagram.nodes;
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            assert_ne!(a.position, b.position, "{} and {}", a.id, b.id);
        }
    }
}

// =============================================================================
// automation_rules.json
// =============================================================================

#[test]
fn trigger_becomes_workflow() {
    let rules = generate(&store()).automation_rules;

    assert_eq!(rules.workflows.len(), 1);
    let workflow = &rules.workflows[0];
    assert_eq!(workflow.id, "workflow_inventory");
    assert_eq!(workflow.trigger.kind, "RECORD_SAVED");
    assert_eq!(workflow.trigger.entity, "inventory");

    let ids: Vec<_> = workflow.steps.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "rule_inventory_g2_evaluate",
            "rule_inventory_g2_set_field_1",
            "rule_inventory_g2_notify_2",
        ]
    );
    assert_eq!(workflow.steps[0].action, StepAction::EvaluateCondition);
    assert!(workflow.steps[0].depends_on.is_empty());
    assert!(workflow.steps[0].condition.is_some());
    assert_eq!(workflow.steps[1].field.as_deref(), Some("status"));
    assert_eq!(workflow.steps[1].depends_on, [ids[0]]);
    assert_eq!(workflow.steps[2].action, StepAction::Notify);
    assert_eq!(workflow.steps[2].depends_on, [ids[1]]);
}

#[test]
fn rules_are_ordered_by_priority() {
    let rules = generate(&store()).automation_rules.rules;
    assert!(rules.len() >= 2);
    assert!(rules.windows(2).all(|w| w[0].priority <= w[1].priority));
}

// =============================================================================
// confirmation_ui.json
// =============================================================================

#[test]
fn review_screen_sections() {
    let result = store();
    let ui = generate(&result).confirmation_ui;

    let ids: Vec<_> = ui.sections.iter().map(UiSection::id).collect();
    assert_eq!(ids, ["summary", "entities", "relationships", "rules", "warnings"]);
    assert_eq!(ui.actions[0].id, "confirm_all");
    assert_eq!(ui.actions[0].requires, ["entities", "relationships"]);

    let Some(UiSection::SummaryCard { summary, .. }) = ui.section("summary") else {
        panic!("missing summary");
    };
    assert_eq!(summary.sheets, 4);
    assert_eq!(summary.entities, 4);
    assert_eq!(summary.relationships, result.relationships.len());
    assert_eq!(summary.rules, result.rules.len());

    let Some(UiSection::EntityList { items, .. }) = ui.section("entities") else {
        panic!("missing entity list");
    };
    assert_eq!(items.len(), 4);
    assert!(items.iter().all(|i| i.actions.contains(&"confirm".to_string())));
}

#[test]
fn sections_are_tagged_by_type() {
    let ui = generate(&store()).confirmation_ui;
    let json = serde_json::to_value(&ui).unwrap();
    assert_eq!(json["sections"][0]["type"], "SUMMARY_CARD");
    assert_eq!(json["sections"][2]["type"], "RELATIONSHIP_DIAGRAM");
    assert_eq!(json["sections"][4]["type"], "WARNING_LIST");
}

#[test]
fn stricter_threshold_lowers_bands() {
    let result = store();
    let lenient = generate(&result).confirmation_ui;
    let strict_thresholds = DetectionThresholds {
        low_confidence: 0.99,
        ..DetectionThresholds::default()
    };
    let strict = OutputGenerator::new(&strict_thresholds).confirmation_ui(&result);

    let levels = |ui: &sheetwise_output::ConfirmationUi| match ui.section("entities") {
        Some(UiSection::EntityList { items, .. }) => {
            items.iter().map(|i| i.confidence_level).collect::<Vec<_>>()
        }
        _ => Vec::new(),
    };
    let (lenient, strict) = (levels(&lenient), levels(&strict));
    assert_eq!(lenient.len(), strict.len());
    for (l, s) in lenient.iter().zip(&strict) {
        assert!(
            *l == *s || *s == sheetwise_output::ConfidenceLevel::Low,
            "{l:?} became {s:?}"
        );
    }
}
