//! Integration tests for formula translation
//!
//! Tests rules and cross-sheet relationships produced from formulas whose
//! field names come from entities extracted out of loaded sheets.

use sheetwise_foundation::DetectionThresholds;
use sheetwise_formula::{
    Comparison, Condition, FormulaSite, FormulaTranslator, Operand, RuleAction,
    RuleImplementation, RuleType, WorkbookContext,
};
use sheetwise_loader::Loader;
use sheetwise_schema::{Cardinality, EntityExtractor, RelationshipKind};
use sheetwise_table::{RegionDetector, Table, normalize};

fn table(sheet: &str, index: usize, csv: &str) -> Table {
    let wb = Loader::new()
        .load(csv.as_bytes(), &format!("{sheet}.csv"))
        .unwrap();
    let raw = wb.sheets.into_iter().next().unwrap().with_index(index);
    let thresholds = DetectionThresholds::default();
    let regions = RegionDetector::new(&thresholds).detect(&raw);
    normalize(&regions[0], &raw, &thresholds)
}

fn context() -> WorkbookContext {
    let tables = [
        table(
            "Inventory",
            0,
            "SKU,Name,Category,Location,Stock,Reorder Level,Status\n\
             A-1,Bolt,Hardware,Shelf 1,4,10,REORDER\n\
             A-2,Nut,Hardware,Shelf 2,50,10,OK\n\
             A-3,Glue,Supplies,Shelf 3,12,5,OK\n",
        ),
        table(
            "Orders",
            1,
            "Order ID,Product ID,Quantity,Line Total\n1,1,2,19\n2,2,1,12\n3,1,5,47.5\n",
        ),
        table(
            "Products",
            2,
            "Product ID,Name,Category,Unit Price\n1,Widget,Tools,9.5\n2,Gadget,Tools,12\n",
        ),
    ];
    let thresholds = DetectionThresholds::default();
    let extraction = EntityExtractor::new(&thresholds).extract(&tables);
    WorkbookContext::from_entities(&extraction.entities)
}

fn translate(sheet: &str, row: usize, col: usize, formula: &str) -> sheetwise_formula::AutomationRule {
    let thresholds = DetectionThresholds::default();
    FormulaTranslator::new(&thresholds)
        .translate(&FormulaSite::new(sheet, row, col, formula), &context())
        .unwrap()
}

// =============================================================================
// Triggers
// =============================================================================

#[test]
fn reorder_status_becomes_trigger() {
    let rule = translate("Inventory", 1, 6, "=IF(E2<=F2,\"REORDER\",\"OK\")");
    assert_eq!(rule.rule_type, RuleType::Trigger);
    assert_eq!(rule.entity, "inventory");
    assert_eq!(rule.target_field.as_deref(), Some("status"));
    assert!(rule.confidence >= 0.8);

    let RuleImplementation::Trigger {
        condition,
        actions,
        otherwise,
    } = &rule.implementation
    else {
        panic!("expected trigger, got {:?}", rule.implementation);
    };
    assert_eq!(
        condition,
        &Condition::Compare {
            left: Operand::Field("stock".into()),
            operator: Comparison::Le,
            right: Operand::Field("reorder_level".into()),
        }
    );
    assert!(actions.iter().any(|a| matches!(
        a,
        RuleAction::SetField { field: Some(f), value: Operand::Text(v) } if f == "status" && v == "REORDER"
    )));
    assert_eq!(otherwise, &Some(Operand::Text("OK".into())));
}

#[test]
fn rule_serializes_with_type_tags() {
    let rule = translate("Inventory", 1, 6, "=IF(E2<=F2,\"REORDER\",\"OK\")");
    let json = serde_json::to_value(&rule).unwrap();
    assert_eq!(json["type"], "TRIGGER");
    assert_eq!(json["implementation"]["type"], "TRIGGER");
    assert_eq!(json["implementation"]["condition"]["operator"], "<=");
    assert_eq!(json["source"]["location"], "Inventory!G2");
}

// =============================================================================
// Lookups
// =============================================================================

#[test]
fn vlookup_into_products() {
    let rule = translate("Orders", 1, 3, "=C2*VLOOKUP(B2,Products!A:D,4,FALSE)");
    assert_eq!(rule.rule_type, RuleType::Lookup);
    let RuleImplementation::Lookup {
        lookup_field,
        target_entity,
        target_column_index,
        target_column,
        destination_field,
        exact_match,
        ..
    } = &rule.implementation
    else {
        panic!("expected lookup, got {:?}", rule.implementation);
    };
    assert_eq!(lookup_field, &Operand::Field("product_id".into()));
    assert_eq!(target_entity.as_deref(), Some("products"));
    assert_eq!(*target_column_index, Some(4));
    assert_eq!(target_column.as_deref(), Some("unit_price"));
    assert_eq!(destination_field.as_deref(), Some("line_total"));
    assert!(exact_match);
}

#[test]
fn index_match_resolves_result_column() {
    let rule = translate("Orders", 1, 3, "=INDEX(Products!D:D,MATCH(B2,Products!A:A,0))");
    let RuleImplementation::Lookup {
        target_entity,
        target_column,
        match_column,
        exact_match,
        ..
    } = &rule.implementation
    else {
        panic!("expected lookup, got {:?}", rule.implementation);
    };
    assert_eq!(target_entity.as_deref(), Some("products"));
    assert_eq!(target_column.as_deref(), Some("unit_price"));
    assert_eq!(match_column.as_deref(), Some("product_id"));
    assert!(exact_match);
}

// =============================================================================
// Whole Workbook
// =============================================================================

#[test]
fn filled_down_lookup_yields_rule_and_reference() {
    let thresholds = DetectionThresholds::default();
    let sites: Vec<FormulaSite> = (1..=3)
        .map(|row| {
            FormulaSite::new(
                "Orders",
                row,
                3,
                format!("=C{0}*VLOOKUP(B{0},Products!A:D,4,FALSE)", row + 1),
            )
        })
        .collect();
    let translation = FormulaTranslator::new(&thresholds).translate_all(&sites, &context());

    assert_eq!(translation.rules.len(), 1);
    assert_eq!(translation.rules[0].id, "rule_orders_d2");
    assert_eq!(translation.rules[0].occurrences, 3);

    assert_eq!(translation.relationships.len(), 1);
    let rel = &translation.relationships[0];
    assert_eq!(rel.kind, RelationshipKind::FormulaReference);
    assert_eq!(rel.from_entity, "orders");
    assert_eq!(rel.to_entity, "products");
    assert_eq!(rel.from_column, "line_total");
    assert_eq!(rel.to_column, "product_id");
    assert_eq!(rel.cardinality, Cardinality::ManyToOne);
    assert!((rel.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn distinct_formulas_in_one_column_stay_separate() {
    let thresholds = DetectionThresholds::default();
    let sites = [
        FormulaSite::new("Orders", 1, 3, "=C2*10"),
        FormulaSite::new("Orders", 2, 3, "=C3*10"),
        FormulaSite::new("Orders", 3, 3, "=C4*12"),
    ];
    let translation = FormulaTranslator::new(&thresholds).translate_all(&sites, &context());
    assert_eq!(translation.rules.len(), 2);
    assert!(translation.relationships.is_empty());
}

#[test]
fn unknown_sheet_leaves_target_unresolved() {
    let rule = translate("Orders", 1, 3, "=VLOOKUP(B2,Archive!A:D,2,FALSE)");
    assert_eq!(rule.rule_type, RuleType::Lookup);
    assert!(rule.confidence < 1.0);
    let RuleImplementation::Lookup { target_entity, .. } = &rule.implementation else {
        panic!("expected lookup");
    };
    assert!(target_entity.is_none());
}
