//! Integration tests for normalization
//!
//! Tests column naming, coercion and record tracking on loaded sheets.

use proptest::prelude::*;
use sheetwise_foundation::{CellValue, DetectionThresholds};
use sheetwise_loader::{Loader, RawSheet};
use sheetwise_table::{ColumnKind, RegionDetector, Table, normalize};

fn table_from_csv(csv: &str) -> Table {
    let wb = Loader::new().load(csv.as_bytes(), "Orders.csv").unwrap();
    let sheet = &wb.sheets[0];
    let thresholds = DetectionThresholds::default();
    let regions = RegionDetector::new(&thresholds).detect(sheet);
    normalize(&regions[0], sheet, &thresholds)
}

// =============================================================================
// Names
// =============================================================================

#[test]
fn names_are_snake_case_and_unique() {
    let tbl = table_from_csv("Order ID,Customer Name,Qty,Qty\n1,Ada,2,3\n2,Grace,1,1\n");
    let names: Vec<_> = tbl.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["order_id", "customer_name", "qty", "qty_1"]);
    assert_eq!(tbl.columns[1].original_name, "Customer Name");
}

#[test]
fn field_map_uses_sheet_letters() {
    let tbl = table_from_csv("SKU,Stock,Reorder Level\nA,5,2\nB,1,3\n");
    let map = tbl.field_map();
    assert_eq!(map.get("A").map(String::as_str), Some("sku"));
    assert_eq!(map.get("C").map(String::as_str), Some("reorder_level"));
}

// =============================================================================
// Coercion
// =============================================================================

#[test]
fn currency_text_becomes_numeric() {
    let tbl = table_from_csv("Item,Price\nPen,\"$1,250.00\"\nInk,$3.50\n");
    let price = tbl.column("price").unwrap();
    assert_eq!(price.kind, ColumnKind::Numeric);
    assert_eq!(price.values, vec![CellValue::Float(1250.0), CellValue::Float(3.5)]);
}

#[test]
fn iso_dates_become_dates() {
    let tbl = table_from_csv("Order,Placed\nA,2024-03-01\nB,2024-03-02\n");
    let placed = tbl.column("placed").unwrap();
    assert_eq!(placed.kind, ColumnKind::Date);
    assert!(placed.values.iter().all(|v| matches!(v, CellValue::Date(_))));
}

#[test]
fn empty_rows_are_skipped_but_traced() {
    let tbl = table_from_csv("Code,Qty\nA,1\n,\nB,2\n");
    assert_eq!(tbl.row_count(), 2);
    assert_eq!(tbl.row_indices, vec![1, 3]);
}

#[test]
fn sheet_index_follows_the_sheet() {
    let sheet = RawSheet::from_rows(
        "Second",
        vec![
            vec![CellValue::Text("Name".into()), CellValue::Text("Qty".into())],
            vec![CellValue::Text("a".into()), CellValue::Int(1)],
            vec![CellValue::Text("b".into()), CellValue::Int(2)],
        ],
    )
    .with_index(1);
    let thresholds = DetectionThresholds::default();
    let regions = RegionDetector::new(&thresholds).detect(&sheet);
    let tbl = normalize(&regions[0], &sheet, &thresholds);
    assert_eq!(tbl.sheet_index, 1);
    assert_eq!(tbl.sheet, "Second");
}

// =============================================================================
// Invariants
// =============================================================================

proptest! {
    #[test]
    fn columns_align_with_records(
        rows in prop::collection::vec(
            prop::collection::vec(
                prop_oneof![
                    Just(CellValue::Empty),
                    (0i64..9).prop_map(CellValue::Int),
                    "[a-c]{1,3}".prop_map(CellValue::Text),
                ],
                1..5,
            ),
            2..10,
        )
    ) {
        let sheet = RawSheet::from_rows("Fuzz", rows);
        let thresholds = DetectionThresholds::default();
        for region in RegionDetector::new(&thresholds).detect(&sheet) {
            let tbl = normalize(&region, &sheet, &thresholds);
            prop_assert!(tbl.columns.len() <= region.width());
            for column in &tbl.columns {
                prop_assert_eq!(column.values.len(), tbl.row_count());
                prop_assert!(column.non_null() > 0);
            }
            let mut names: Vec<_> = tbl.columns.iter().map(|c| c.name.clone()).collect();
            names.sort();
            names.dedup();
            prop_assert_eq!(names.len(), tbl.columns.len());
        }
    }
}
