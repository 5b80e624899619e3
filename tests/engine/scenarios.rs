//! Integration tests for end-to-end analysis
//!
//! Each test runs the full pipeline on one realistic workbook.

use sheetwise_engine::Analyzer;
use sheetwise_foundation::DataType;
use sheetwise_formula::{Comparison, Condition, Operand, RuleImplementation, RuleType};
use sheetwise_loader::FileFormat;
use sheetwise_schema::{Cardinality, RelationshipKind};

use crate::shop_book;

// =============================================================================
// Single Sheet
// =============================================================================

#[test]
fn two_column_products_sheet() {
    let csv = b"Product ID,Name\n1,Widget\n2,Gadget\n";
    let result = Analyzer::new().analyze(csv, "Products.csv").unwrap();

    assert_eq!(result.format, FileFormat::Csv);
    assert_eq!(result.sheets, vec!["Products"]);
    assert_eq!(result.entities.len(), 1);
    let entity = &result.entities[0];
    assert_eq!(entity.table_name, "products");
    assert_eq!(entity.name, "product");
    assert_eq!(entity.primary_key.as_deref(), Some("product_id"));
    let key = entity.primary_key_column().unwrap();
    assert_eq!(key.data_type, DataType::Id);
    assert!(key.is_unique);
    assert!(entity.confidence >= 0.85);
    assert!(result.relationships.is_empty());
    assert!(result.rules.is_empty());
}

#[test]
fn empty_row_run_truncates_the_table() {
    let csv = b"Code,Qty\nA,1\nB,2\nC,3\n,\n,\n,\nZ,99\n";
    let result = Analyzer::new().analyze(csv, "Stock.csv").unwrap();
    let region = result.regions.iter().find(|r| r.header_row == 0).unwrap();
    assert_eq!(region.data_end_row, 3);
    assert_eq!(result.entities[0].row_count, 3);
}

#[test]
fn title_rows_above_the_header_are_skipped() {
    let csv = b"Q3 Customer List,,\n,,\nCustomer ID,Name,Email\n1,Ada,ada@example.com\n2,Grace,grace@example.com\n3,Linus,linus@example.com\n";
    let result = Analyzer::new().analyze(csv, "Customers.csv").unwrap();
    let entity = &result.entities[0];
    assert_eq!(entity.primary_key.as_deref(), Some("customer_id"));
    assert_eq!(entity.column("email").unwrap().data_type, DataType::Email);
    assert_eq!(entity.row_count, 3);
}

// =============================================================================
// Multi-sheet Workbook
// =============================================================================

#[test]
fn workbook_sheets_become_entities() {
    let bytes = shop_book().unwrap();
    let result = Analyzer::new().analyze(&bytes, "shop.xlsx").unwrap();

    assert_eq!(result.format, FileFormat::Xlsx);
    let ids: Vec<_> = result.entities.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["products", "suppliers", "orders", "inventory"]);
    assert_eq!(result.entity("orders").unwrap().row_count, 5);
    assert_eq!(
        result.entity("suppliers").unwrap().primary_key.as_deref(),
        Some("supplier_id")
    );
}

#[test]
fn supplier_foreign_key_is_found() {
    let bytes = shop_book().unwrap();
    let result = Analyzer::new().analyze(&bytes, "shop.xlsx").unwrap();

    let to_suppliers: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.from_entity == "products" && r.to_entity == "suppliers")
        .collect();
    assert_eq!(to_suppliers.len(), 1);
    let rel = to_suppliers[0];
    assert_eq!(rel.kind, RelationshipKind::ForeignKey);
    assert_eq!(rel.from_column, "supplier_id");
    assert_eq!(rel.to_column, "supplier_id");
    assert_eq!(rel.cardinality, Cardinality::ManyToOne);
    assert!(rel.confidence >= 0.9);
}

#[test]
fn reorder_formula_becomes_trigger() {
    let bytes = shop_book().unwrap();
    let result = Analyzer::new().analyze(&bytes, "shop.xlsx").unwrap();

    let rules: Vec<_> = result.rules_for("inventory").collect();
    assert_eq!(rules.len(), 1);
    let rule = rules[0];
    assert_eq!(rule.id, "rule_inventory_g2");
    assert_eq!(rule.rule_type, RuleType::Trigger);
    assert_eq!(rule.occurrences, 4);
    assert!(rule.confidence >= 0.8);
    let RuleImplementation::Trigger { condition, .. } = &rule.implementation else {
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
}

#[test]
fn lookup_formula_yields_rule_and_reference() {
    let bytes = shop_book().unwrap();
    let result = Analyzer::new().analyze(&bytes, "shop.xlsx").unwrap();

    let lookup = result
        .rules_for("orders")
        .find(|r| r.rule_type == RuleType::Lookup)
        .unwrap();
    let RuleImplementation::Lookup {
        target_entity,
        target_column_index,
        ..
    } = &lookup.implementation
    else {
        panic!("expected lookup");
    };
    assert_eq!(target_entity.as_deref(), Some("products"));
    assert_eq!(*target_column_index, Some(4));

    let reference = result
        .relationships
        .iter()
        .find(|r| r.kind == RelationshipKind::FormulaReference)
        .unwrap();
    assert_eq!(reference.from_entity, "orders");
    assert_eq!(reference.to_entity, "products");

    let foreign_key = result
        .relationships
        .iter()
        .find(|r| r.kind == RelationshipKind::ForeignKey && r.from_entity == "orders")
        .unwrap();
    assert_eq!(foreign_key.from_column, "product_id");
    assert_eq!(foreign_key.to_entity, "products");
}

#[test]
fn relationship_ids_are_sequential() {
    let bytes = shop_book().unwrap();
    let result = Analyzer::new().analyze(&bytes, "shop.xlsx").unwrap();
    let ids: Vec<_> = result.relationships.iter().map(|r| r.id.clone()).collect();
    let expected: Vec<_> = (1..=ids.len()).map(|n| format!("rel_{n}")).collect();
    assert_eq!(ids, expected);
    // Formula references follow the column matches.
    let first_reference = result
        .relationships
        .iter()
        .position(|r| r.kind == RelationshipKind::FormulaReference)
        .unwrap();
    assert!(
        result.relationships[first_reference..]
            .iter()
            .all(|r| r.kind == RelationshipKind::FormulaReference)
    );
}

#[test]
fn formula_over_two_sheets_keeps_one_edge_per_column() {
    let mut book = rust_xlsxwriter::Workbook::new();
    let products = book.add_worksheet();
    products.set_name("Products").unwrap();
    products.write_row(0, 0, ["Product ID", "Name", "Category", "Unit Price"]).unwrap();
    let rows = [("Widget", 9.5), ("Gadget", 12.25), ("Gizmo", 4.75)];
    for (n, (name, price)) in rows.into_iter().enumerate() {
        let row = u32::try_from(n).unwrap() + 1;
        products.write_number(row, 0, f64::from(row)).unwrap();
        products.write_string(row, 1, name).unwrap();
        products.write_string(row, 2, "Tools").unwrap();
        products.write_number(row, 3, price).unwrap();
    }
    let stock = book.add_worksheet();
    stock.set_name("Stock").unwrap();
    stock.write_row(0, 0, ["SKU", "Location", "On Hand"]).unwrap();
    for (n, on_hand) in [40, 12, 3].into_iter().enumerate() {
        let row = u32::try_from(n).unwrap() + 1;
        stock.write_number(row, 0, f64::from(row)).unwrap();
        stock.write_string(row, 1, "Aisle 1").unwrap();
        stock.write_number(row, 2, f64::from(on_hand)).unwrap();
    }
    let orders = book.add_worksheet();
    orders.set_name("Orders").unwrap();
    orders.write_row(0, 0, ["Order ID", "Product ID", "Quantity", "Line Total"]).unwrap();
    for row in 1..=4u32 {
        orders.write_number(row, 0, f64::from(500 + row)).unwrap();
        orders.write_number(row, 1, f64::from(1 + row % 3)).unwrap();
        orders.write_number(row, 2, f64::from(row)).unwrap();
        let formula = format!(
            "=VLOOKUP(B{0},Products!A:D,4,FALSE)+VLOOKUP(B{0},Stock!A:C,3,FALSE)",
            row + 1
        );
        orders.write_formula(row, 3, formula.as_str()).unwrap();
    }
    let bytes = book.save_to_buffer().unwrap();

    let result = Analyzer::new().analyze(&bytes, "two_lookups.xlsx").unwrap();
    let from_line_total: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.from_entity == "orders" && r.from_column == "line_total")
        .collect();
    assert_eq!(from_line_total.len(), 1);
    assert_eq!(from_line_total[0].to_entity, "products");
    assert_eq!(from_line_total[0].kind, RelationshipKind::FormulaReference);

    let mut sources: Vec<_> = result
        .relationships
        .iter()
        .map(|r| (r.from_entity.clone(), r.from_column.clone()))
        .collect();
    let count = sources.len();
    sources.sort();
    sources.dedup();
    assert_eq!(sources.len(), count);
}

#[test]
fn analysis_is_repeatable() {
    let bytes = shop_book().unwrap();
    let analyzer = Analyzer::new();
    let first = analyzer.analyze(&bytes, "shop.xlsx").unwrap();
    let second = analyzer.analyze(&bytes, "shop.xlsx").unwrap();
    assert_eq!(first.entities, second.entities);
    assert_eq!(first.relationships, second.relationships);
    assert_eq!(first.rules, second.rules);
    assert_eq!(first.score, second.score);
}

#[test]
fn analyze_path_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.xlsx");
    std::fs::write(&path, shop_book().unwrap()).unwrap();
    let result = Analyzer::new().analyze_path(&path).unwrap();
    assert_eq!(result.source_file, "shop.xlsx");
    assert_eq!(result.entities.len(), 4);
}
