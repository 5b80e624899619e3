//! Integration tests for formula parsing
//!
//! Tests the arena tree, error reporting and pattern recognition.

use sheetwise_foundation::ErrorKind;
use sheetwise_formula::{FormulaPattern, Node, parse, recognize};

// =============================================================================
// Trees
// =============================================================================

#[test]
fn leading_equals_is_optional() {
    let with = parse("=A1+B1", 64).unwrap();
    let without = parse("A1+B1", 64).unwrap();
    assert_eq!(with.len(), without.len());
}

#[test]
fn root_is_the_outer_call() {
    let ast = parse("=IF(E2<=F2,\"REORDER\",\"OK\")", 64).unwrap();
    let root = ast.root().unwrap();
    assert_eq!(ast.node(root).call_name(), Some("IF"));
    assert_eq!(ast.children(root).len(), 3);
}

#[test]
fn cross_sheet_references_are_collected() {
    let ast = parse("=C2*VLOOKUP(B2,Products!A:D,4,FALSE)", 64).unwrap();
    let root = ast.root().unwrap();
    let sheets: Vec<_> = ast
        .references(root)
        .into_iter()
        .filter_map(|r| r.sheet.clone())
        .collect();
    assert_eq!(sheets, vec!["Products".to_string()]);
}

#[test]
fn string_literals_keep_their_text() {
    let ast = parse("=\"say \"\"hi\"\"\"", 8).unwrap();
    let root = ast.root().unwrap();
    assert_eq!(ast.node(root), &Node::Text("say \"hi\"".into()));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn unbalanced_call_is_a_syntax_error() {
    let err = parse("=SUM(A1:A3", 64).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::FormulaSyntax { .. }));
    assert!(!err.is_fatal());
}

#[test]
fn empty_formula_is_a_syntax_error() {
    let err = parse("=", 64).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::FormulaSyntax { .. }));
}

#[test]
fn node_limit_bounds_width_and_depth() {
    let wide = format!("={}", vec!["A1"; 100].join("+"));
    let err = parse(&wide, 50).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NodeLimitExceeded { limit: 50 }));

    let deep = format!("={}1{}", "ABS(".repeat(200), ")".repeat(200));
    assert!(parse(&deep, 64).is_err());
    assert!(parse(&deep, 1024).is_ok());
}

// =============================================================================
// Recognition
// =============================================================================

#[test]
fn recognizes_common_business_patterns() {
    let cases = [
        ("=SUMIFS(D:D,E:E,\"West\")", FormulaPattern::SumIfs),
        ("=AVERAGE(B2:B40)", FormulaPattern::Average),
        ("=IFS(A2>90,\"A\",A2>80,\"B\")", FormulaPattern::Ifs),
        ("=XLOOKUP(A2,Products!A:A,Products!D:D)", FormulaPattern::XLookup),
        ("=TEXTJOIN(\", \",TRUE,A2:C2)", FormulaPattern::TextJoin),
        ("=DATEDIF(A2,B2,\"d\")", FormulaPattern::Date),
        ("=B2*(1+C2)", FormulaPattern::Math),
    ];
    for (source, expected) in cases {
        let ast = parse(source, 256).unwrap();
        assert_eq!(recognize(&ast).pattern, expected, "{source}");
    }
}

#[test]
fn index_match_pairs_are_one_pattern() {
    let ast = parse("=INDEX(Products!D:D,MATCH(B2,Products!A:A,0))", 256).unwrap();
    let recognition = recognize(&ast);
    assert_eq!(recognition.pattern, FormulaPattern::IndexMatch);
    assert!(!recognition.embedded);
}
