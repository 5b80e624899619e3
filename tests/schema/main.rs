//! Integration tests for Layer 2: Schema
//!
//! Tests column classification, entity extraction and relationship discovery.

mod classify;
mod entities;

use sheetwise_foundation::DetectionThresholds;
use sheetwise_loader::Loader;
use sheetwise_table::{RegionDetector, Table, normalize};

/// Loads a CSV sheet and normalizes its best region.
pub fn table_from_csv(sheet: &str, index: usize, csv: &str) -> Table {
    let wb = Loader::new()
        .load(csv.as_bytes(), &format!("{sheet}.csv"))
        .unwrap();
    let raw = wb.sheets.into_iter().next().unwrap().with_index(index);
    let thresholds = DetectionThresholds::default();
    let regions = RegionDetector::new(&thresholds).detect(&raw);
    normalize(&regions[0], &raw, &thresholds)
}
