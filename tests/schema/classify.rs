//! Integration tests for column classification
//!
//! Tests the detector cascade on loaded data and its independence from row order.

use proptest::prelude::*;
use sheetwise_foundation::{CellValue, DataType, DetectionThresholds, SemanticType};
use sheetwise_schema::{ColumnClassifier, ColumnMetadata, ColumnStats};
use sheetwise_table::{ColumnKind, TableColumn};

use crate::table_from_csv;

fn classify_all(csv: &str) -> Vec<ColumnMetadata> {
    let table = table_from_csv("Customers", 0, csv);
    let thresholds = DetectionThresholds::default();
    ColumnClassifier::new(&thresholds).classify_table(&table, Some("customer"))
}

fn find<'a>(columns: &'a [ColumnMetadata], name: &str) -> &'a ColumnMetadata {
    columns.iter().find(|c| c.name == name).unwrap()
}

// =============================================================================
// Cascade
// =============================================================================

#[test]
fn mixed_customer_sheet() {
    let csv = "\
Customer ID,Name,Email,Phone,Active,Signup Date,Balance,Tier
1,Ada,ada@example.com,555-123-4567,yes,2024-01-02,10.50,Gold
2,Grace,grace@example.com,555-222-3333,no,2024-01-05,0.00,Gold
3,Linus,linus@example.com,555-987-6543,yes,2024-02-11,99.99,Silver
4,Ken,ken@example.com,555-444-1212,yes,2024-03-01,5.25,Gold
";
    let cols = classify_all(csv);
    let id = find(&cols, "customer_id");
    assert_eq!(id.data_type, DataType::Id);
    assert_eq!(id.semantic_type, Some(SemanticType::PrimaryKey));
    assert!(id.is_unique);

    assert_eq!(find(&cols, "email").data_type, DataType::Email);
    assert_eq!(find(&cols, "phone").data_type, DataType::Phone);
    assert_eq!(find(&cols, "active").data_type, DataType::Boolean);
    assert_eq!(find(&cols, "signup_date").data_type, DataType::Date);
    assert_eq!(find(&cols, "balance").data_type, DataType::Currency);
    assert_eq!(find(&cols, "name").semantic_type, Some(SemanticType::Name));
}

#[test]
fn repeated_categories_become_enum() {
    let mut csv = String::from("Ticket,Status\n");
    for n in 0..40 {
        let status = ["Open", "Closed", "Pending"][n % 3];
        csv.push_str(&format!("T{n},{status}\n"));
    }
    let cols = classify_all(&csv);
    let status = find(&cols, "status");
    assert_eq!(status.data_type, DataType::Enum);
    assert_eq!(status.semantic_type, Some(SemanticType::Status));
    let ColumnStats::Enum { values, top_values } = &status.stats else {
        panic!("expected enum stats, got {:?}", status.stats);
    };
    assert_eq!(values, &vec!["Closed".to_string(), "Open".into(), "Pending".into()]);
    assert_eq!(top_values[0], ("Open".to_string(), 14));
}

#[test]
fn nulls_are_counted() {
    let cols = classify_all("Code,Notes\nA,x\nB,\nC,y\n");
    let notes = find(&cols, "notes");
    assert!(notes.nullable);
    assert_eq!(notes.null_count, 1);
    assert_eq!(notes.distinct_count, 2);
}

// =============================================================================
// Order Independence
// =============================================================================

fn column(kind: ColumnKind, values: Vec<CellValue>) -> TableColumn {
    TableColumn {
        name: "value".into(),
        original_name: "Value".into(),
        source_col: 0,
        kind,
        values,
    }
}

fn assert_same(a: &ColumnMetadata, b: &ColumnMetadata) -> Result<(), TestCaseError> {
    prop_assert_eq!(a.data_type, b.data_type);
    prop_assert_eq!(&a.semantic_type, &b.semantic_type);
    prop_assert_eq!(a.is_unique, b.is_unique);
    prop_assert_eq!(a.distinct_count, b.distinct_count);
    prop_assert_eq!(&a.stats, &b.stats);
    prop_assert!((a.confidence - b.confidence).abs() < 1e-12);
    Ok(())
}

fn shuffled<T: Clone + std::fmt::Debug>(
    items: impl Strategy<Value = Vec<T>>,
) -> impl Strategy<Value = (Vec<T>, Vec<T>)> {
    items.prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
}

proptest! {
    #[test]
    fn numeric_classification_ignores_order(
        (original, permuted) in shuffled(prop::collection::vec(-5i64..200, 1..30))
    ) {
        let thresholds = DetectionThresholds::default();
        let classifier = ColumnClassifier::new(&thresholds);
        let to_cells = |v: Vec<i64>| v.into_iter().map(CellValue::Int).collect();
        let a = classifier.classify(&column(ColumnKind::Numeric, to_cells(original)), None);
        let b = classifier.classify(&column(ColumnKind::Numeric, to_cells(permuted)), None);
        assert_same(&a, &b)?;
    }

    #[test]
    fn text_classification_ignores_order(
        (original, permuted) in shuffled(prop::collection::vec(
            prop::sample::select(vec![
                "a@b.co", "red", "blue", "https://x.io", "SKU-100", "yes", "", "2024-01-01",
            ]),
            1..30,
        ))
    ) {
        let thresholds = DetectionThresholds::default();
        let classifier = ColumnClassifier::new(&thresholds);
        let to_cells = |v: Vec<&str>| {
            v.into_iter()
                .map(|s| if s.is_empty() { CellValue::Empty } else { CellValue::Text(s.into()) })
                .collect()
        };
        let a = classifier.classify(&column(ColumnKind::Text, to_cells(original)), None);
        let b = classifier.classify(&column(ColumnKind::Text, to_cells(permuted)), None);
        assert_same(&a, &b)?;
    }
}
