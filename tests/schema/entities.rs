//! Integration tests for entity extraction
//!
//! Tests naming, primary-key selection and confidence on loaded sheets.

use sheetwise_foundation::{DataType, DetectionThresholds, Severity};
use sheetwise_schema::{EntityExtractor, PrimaryKeyRule};

use crate::table_from_csv;

// =============================================================================
// Single Sheet
// =============================================================================

#[test]
fn products_sheet_becomes_product_entity() {
    let table = table_from_csv("Products", 0, "Product ID,Name\n1,Widget\n2,Gadget\n");
    let thresholds = DetectionThresholds::default();
    let out = EntityExtractor::new(&thresholds).extract(&[table]);

    assert_eq!(out.entities.len(), 1);
    let entity = &out.entities[0];
    assert_eq!(entity.id, "products");
    assert_eq!(entity.name, "product");
    assert_eq!(entity.display_name, "Product");
    assert_eq!(entity.primary_key.as_deref(), Some("product_id"));
    let key = entity.primary_key_column().unwrap();
    assert_eq!(key.data_type, DataType::Id);
    assert!(key.is_unique);
    assert!(entity.confidence >= 0.85);
    assert_eq!(entity.row_count, 2);
}

#[test]
fn conventional_id_column_is_the_key() {
    let table = table_from_csv("Staff", 0, "ID,Full Name\n7,Ada\n9,Grace\n12,Linus\n");
    let thresholds = DetectionThresholds::default();
    let out = EntityExtractor::new(&thresholds).extract(&[table]);
    let entity = &out.entities[0];
    assert_eq!(entity.primary_key.as_deref(), Some("id"));
    assert_eq!(entity.primary_key_rule, Some(PrimaryKeyRule::Semantic));
}

#[test]
fn keyless_sheet_warns_high() {
    let table = table_from_csv("Log", 0, "Event,Level\nstart,info\nstart,info\nstop,warn\n");
    let thresholds = DetectionThresholds::default();
    let out = EntityExtractor::new(&thresholds).extract(&[table]);
    assert!(out.entities[0].primary_key.is_none());
    assert!(out.warnings.iter().any(|w| w.severity == Severity::High));
}

// =============================================================================
// Multiple Sheets
// =============================================================================

#[test]
fn entities_keep_sheet_order_and_index() {
    let thresholds = DetectionThresholds::default();
    let tables = [
        table_from_csv("Customers", 0, "Customer ID,Name\n1,Ada\n2,Grace\n"),
        table_from_csv("Order Lines", 1, "Line ID,Qty\n1,3\n2,4\n"),
    ];
    let out = EntityExtractor::new(&thresholds).extract(&tables);
    let ids: Vec<_> = out.entities.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["customers", "order_lines"]);
    assert_eq!(out.entities[1].name, "order_line");
    assert_eq!(out.entities[1].sheet_index, 1);
}

#[test]
fn colliding_names_are_suffixed_by_position() {
    let thresholds = DetectionThresholds::default();
    let tables = [
        table_from_csv("Orders", 0, "Order ID,Total\n1,5\n2,6\n"),
        table_from_csv("orders", 1, "Order ID,Total\n3,7\n4,8\n"),
    ];
    let out = EntityExtractor::new(&thresholds).extract(&tables);
    assert_eq!(out.entities[0].id, "orders");
    assert_eq!(out.entities[1].id, "orders_2");
    assert!(
        out.warnings
            .iter()
            .any(|w| w.entity.as_deref() == Some("orders_2") && w.severity == Severity::Low)
    );
}

#[test]
fn suffixed_name_already_used_by_a_sheet_counts_up() {
    let thresholds = DetectionThresholds::default();
    let tables = [
        table_from_csv("Orders_3", 0, "Order ID,Total\n1,5\n2,6\n"),
        table_from_csv("Orders", 1, "Order ID,Total\n3,7\n4,8\n"),
        table_from_csv("orders", 2, "Order ID,Total\n5,9\n6,10\n"),
    ];
    let out = EntityExtractor::new(&thresholds).extract(&tables);
    let ids: Vec<_> = out.entities.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["orders_3", "orders", "orders_4"]);
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}
