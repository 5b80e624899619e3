//! Integration tests for region detection
//!
//! Tests header placement, region termination and structural invariants.

use proptest::prelude::*;
use sheetwise_foundation::{CellValue, DetectionThresholds};
use sheetwise_loader::{Loader, RawSheet};
use sheetwise_table::{DataRegion, RegionDetector};

fn detect_csv(csv: &str) -> (RawSheet, Vec<DataRegion>) {
    let wb = Loader::new().load(csv.as_bytes(), "Sheet.csv").unwrap();
    let sheet = wb.sheets.into_iter().next().unwrap();
    let regions = RegionDetector::new(&DetectionThresholds::default()).detect(&sheet);
    (sheet, regions)
}

// =============================================================================
// Header Placement
// =============================================================================

#[test]
fn header_on_first_row() {
    let (_, regions) = detect_csv("Product ID,Name,Price\n1,Widget,9.5\n2,Gadget,12\n3,Gizmo,4.25\n");
    assert_eq!(regions.len(), 1);
    let r = &regions[0];
    assert_eq!(r.header_row, 0);
    assert_eq!(r.data_start_row, 1);
    assert_eq!(r.data_end_row, 3);
    assert_eq!(r.column_names, vec!["Product ID", "Name", "Price"]);
    assert!(!r.pseudo_header);
}

#[test]
fn header_below_title_and_blank_line() {
    let csv = "Quarterly Inventory,,\n,,\nSKU,Name,Qty\nA-1,Bolt,5\nA-2,Nut,7\nA-3,Washer,9\n";
    let (_, regions) = detect_csv(csv);
    let r = &regions[0];
    assert_eq!(r.header_row, 2);
    assert_eq!(r.width(), 3);
    assert_eq!(r.data_rows(), 3);
}

#[test]
fn total_row_is_excluded() {
    let csv = "Item,Amount\nPens,10\nPaper,20\nTotal,30\n";
    let (_, regions) = detect_csv(csv);
    assert_eq!(regions[0].data_end_row, 2);
}

#[test]
fn header_starting_with_total_stays_header() {
    let (_, regions) = detect_csv("Total Sales,Region\n100,East\n200,West\n300,North\n");
    let r = &regions[0];
    assert_eq!(r.header_row, 0);
    assert_eq!(r.column_names, vec!["Total Sales", "Region"]);
    assert_eq!(r.data_end_row, 3);
    assert!(!r.pseudo_header);
}

#[test]
fn header_starting_with_count_stays_header() {
    let (_, regions) = detect_csv("Count,Item,Price\n3,Bolt,1.5\n7,Nut,0.25\n2,Washer,0.1\n");
    let r = &regions[0];
    assert_eq!(r.header_row, 0);
    assert_eq!(r.column_names, vec!["Count", "Item", "Price"]);
    assert_eq!(r.data_rows(), 3);
}

// =============================================================================
// Termination
// =============================================================================

#[test]
fn three_empty_rows_end_the_region() {
    let csv = "Code,Qty\nA,1\nB,2\nC,3\n,\n,\n,\nZ,9\n";
    let (_, regions) = detect_csv(csv);
    let primary = regions.iter().find(|r| r.header_row == 0).unwrap();
    assert_eq!(primary.data_end_row, 3);
    assert_eq!(primary.data_rows(), 3);
}

#[test]
fn configured_run_length_is_honored() {
    let csv = "Code,Qty\nA,1\nB,2\n,\nC,3\n";
    let wb = Loader::new().load(csv.as_bytes(), "Sheet.csv").unwrap();
    let thresholds = DetectionThresholds::default().with_empty_row_run(1);
    let regions = RegionDetector::new(&thresholds).detect(&wb.sheets[0]);
    let primary = regions.iter().find(|r| r.header_row == 0).unwrap();
    assert_eq!(primary.data_end_row, 2);
}

#[test]
fn header_only_sheet_falls_back_to_nothing() {
    let (_, regions) = detect_csv("Name,Email\n");
    assert!(regions.is_empty());
}

// =============================================================================
// Invariants
// =============================================================================

fn cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        3 => Just(CellValue::Empty),
        2 => (0i64..50).prop_map(CellValue::Int),
        2 => prop::sample::select(vec!["Name", "ID", "Total", "Qty", "red", "Bolt", "x"])
            .prop_map(|s| CellValue::Text(s.to_string())),
        1 => any::<bool>().prop_map(CellValue::Bool),
    ]
}

fn grid() -> impl Strategy<Value = Vec<Vec<CellValue>>> {
    prop::collection::vec(prop::collection::vec(cell(), 0..6), 0..12)
}

proptest! {
    #[test]
    fn regions_are_well_formed(rows in grid()) {
        let sheet = RawSheet::from_rows("Fuzz", rows);
        let regions = RegionDetector::new(&DetectionThresholds::default()).detect(&sheet);
        for r in &regions {
            prop_assert!(r.data_start_row > r.header_row);
            prop_assert!(r.data_end_row >= r.data_start_row);
            prop_assert!(r.data_end_row < sheet.height());
            prop_assert!(r.start_col <= r.end_col);
            prop_assert!(r.end_col < sheet.width());
            prop_assert_eq!(r.column_names.len(), r.width());
            prop_assert!((0.0..=1.0).contains(&r.quality));
        }
    }

    #[test]
    fn regions_are_ordered_by_quality(rows in grid()) {
        let sheet = RawSheet::from_rows("Fuzz", rows);
        let regions = RegionDetector::new(&DetectionThresholds::default()).detect(&sheet);
        for pair in regions.windows(2) {
            prop_assert!(pair[0].quality >= pair[1].quality);
        }
    }
}
