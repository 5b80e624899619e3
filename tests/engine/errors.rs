//! Integration tests for analysis errors
//!
//! Tests which failures abort an analysis and which become warnings.

use sheetwise_engine::Analyzer;
use sheetwise_foundation::{DetectionThresholds, ErrorKind, Severity};

#[test]
fn empty_input_is_unsupported() {
    let err = Analyzer::new().analyze(b"", "empty.csv").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnsupportedFormat(_)));
    assert!(err.is_fatal());
}

#[test]
fn binary_input_is_unsupported() {
    let bytes: Vec<u8> = (0u8..=255).cycle().take(2048).collect();
    let err = Analyzer::new().analyze(&bytes, "blob.bin").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnsupportedFormat(_)));
}

#[test]
fn header_without_rows_has_no_usable_data() {
    let err = Analyzer::new().analyze(b"Notes\n", "notes.csv").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoUsableData { sheets: 1 }));
    let context = err.context.unwrap();
    assert_eq!(context.source.as_deref(), Some("notes.csv"));
}

#[test]
fn missing_file_is_io() {
    let dir = tempfile::tempdir().unwrap();
    let err = Analyzer::new()
        .analyze_path(dir.path().join("absent.xlsx"))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Io(_)));
}

#[test]
fn invalid_thresholds_fail_before_loading() {
    let thresholds = DetectionThresholds::default().with_relationship_accept(1.5);
    let err = Analyzer::new()
        .with_thresholds(thresholds)
        .analyze(b"a,b\n1,2\n", "x.csv")
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidConfig(_)));
}

#[test]
fn blank_sheet_is_skipped_not_fatal() {
    let mut book = rust_xlsxwriter::Workbook::new();
    book.add_worksheet().set_name("Empty").unwrap();
    let data = book.add_worksheet();
    data.set_name("Codes").unwrap();
    data.write_string(0, 0, "Code").unwrap();
    data.write_string(0, 1, "Label").unwrap();
    data.write_string(1, 0, "X1").unwrap();
    data.write_string(1, 1, "First").unwrap();
    data.write_string(2, 0, "X2").unwrap();
    data.write_string(2, 1, "Second").unwrap();
    let bytes = book.save_to_buffer().unwrap();

    let result = Analyzer::new().analyze(&bytes, "codes.xlsx").unwrap();
    assert_eq!(result.sheets, vec!["Empty", "Codes"]);
    assert_eq!(result.entities.len(), 1);
    assert!(
        result
            .score
            .warnings
            .iter()
            .any(|w| w.severity == Severity::Medium && w.message.contains("Empty"))
    );
}
