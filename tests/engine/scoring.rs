//! Integration tests for confidence scoring
//!
//! Tests the overall score, its dimensions and the review warnings.

use sheetwise_engine::{Analyzer, NEUTRAL_SCORE};
use sheetwise_foundation::Severity;

use crate::shop_book;

#[test]
fn scores_stay_in_unit_range() {
    let bytes = shop_book().unwrap();
    let score = Analyzer::new().analyze(&bytes, "shop.xlsx").unwrap().score;
    for value in [
        score.overall,
        score.structure,
        score.entities,
        score.relationships,
        score.formulas,
    ] {
        assert!((0.0..=1.0).contains(&value), "{value} out of range");
    }
    assert!(score.overall > 0.7);
}

#[test]
fn no_relationships_scores_neutral() {
    let csv = b"Product ID,Name\n1,Widget\n2,Gadget\n";
    let score = Analyzer::new().analyze(csv, "Products.csv").unwrap().score;
    assert!((score.relationships - NEUTRAL_SCORE).abs() < 1e-9);
    assert!((score.formulas - NEUTRAL_SCORE).abs() < 1e-9);
    assert!((score.structure - 1.0).abs() < 1e-9);
}

#[test]
fn keyless_sheet_raises_one_high_warning() {
    let csv = b"Topic,Body\nbilling,late fee\nbilling,late fee\nsupport,reset\n";
    let score = Analyzer::new().analyze(csv, "Notes.csv").unwrap().score;
    assert_eq!(score.count_at_least(Severity::High), 1);
    assert_eq!(score.warnings[0].severity, Severity::High);
    assert_eq!(score.warnings[0].entity.as_deref(), Some("notes"));
}

#[test]
fn headerless_sheet_is_flagged_for_review() {
    let csv = b"1,20\n2,21\n3,19\n4,22\n";
    let result = Analyzer::new().analyze(csv, "Readings.csv").unwrap();
    assert!(result.regions[0].pseudo_header);
    assert!(result.score.structure <= 0.5);
    assert!(
        result
            .score
            .warnings
            .iter()
            .any(|w| w.severity == Severity::Medium && w.message.contains("no header row"))
    );
}

#[test]
fn warnings_are_sorted_by_severity() {
    let csv = b"Topic,Body\nbilling,late fee\nbilling,late fee\nsupport,reset\n";
    let score = Analyzer::new().analyze(csv, "Notes.csv").unwrap().score;
    for pair in score.warnings.windows(2) {
        assert!(pair[0].severity >= pair[1].severity);
    }
}
