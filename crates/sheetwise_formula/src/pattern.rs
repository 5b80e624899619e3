//! Recognition of common formula shapes.
//!
//! Function names map to a fixed table of patterns. A formula whose root is
//! not a recognized call falls back to the first recognized call found in
//! pre-order, then to plain arithmetic, then to the generic pattern.

use crate::ast::{Ast, Node, NodeId};

/// Date and time functions, all translated as computed fields.
pub const DATE_FUNCTIONS: &[&str] = &[
    "TODAY",
    "NOW",
    "DATE",
    "YEAR",
    "MONTH",
    "DAY",
    "DATEDIF",
    "EDATE",
    "EOMONTH",
    "WEEKDAY",
    "NETWORKDAYS",
];

/// Logical and inspection functions, translated as validations.
pub const VALIDATION_FUNCTIONS: &[&str] = &[
    "AND", "OR", "NOT", "ISBLANK", "ISNUMBER", "ISTEXT", "ISERROR", "EXACT",
];

/// A recognized formula pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormulaPattern {
    /// `SUM(range)`
    Sum,
    /// `SUMIF(range, criteria, [sum_range])`
    SumIf,
    /// `SUMIFS(sum_range, range1, criteria1, ...)`
    SumIfs,
    /// `COUNT` or `COUNTA`
    Count,
    /// `COUNTIF(range, criteria)`
    CountIf,
    /// `COUNTIFS(range1, criteria1, ...)`
    CountIfs,
    /// `AVERAGE(range)`
    Average,
    /// `AVERAGEIF(range, criteria, [average_range])`
    AverageIf,
    /// `AVERAGEIFS(average_range, range1, criteria1, ...)`
    AverageIfs,
    /// `MAX(range)`
    Max,
    /// `MIN(range)`
    Min,
    /// `IF(condition, then, else)`
    If,
    /// `IFS(condition1, value1, ...)`
    Ifs,
    /// `VLOOKUP(value, table, column, [exact])`
    VLookup,
    /// `HLOOKUP(value, table, row, [exact])`
    HLookup,
    /// `XLOOKUP(value, lookup_array, return_array, ...)`
    XLookup,
    /// `INDEX(return_range, MATCH(value, lookup_range, 0))`
    IndexMatch,
    /// `CONCATENATE` or `CONCAT`
    Concatenate,
    /// `TEXTJOIN(delimiter, ignore_empty, text1, ...)`
    TextJoin,
    /// One of [`DATE_FUNCTIONS`].
    Date,
    /// One of [`VALIDATION_FUNCTIONS`].
    Validation,
    /// Bare arithmetic over references and literals.
    Math,
    /// Anything else.
    Generic,
}

impl FormulaPattern {
    /// Maps a function name to its pattern. `INDEX` needs the tree to pair
    /// with `MATCH` and is handled by [`recognize`].
    #[must_use]
    pub fn from_function(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        let pattern = match upper.as_str() {
            "SUM" => Self::Sum,
            "SUMIF" => Self::SumIf,
            "SUMIFS" => Self::SumIfs,
            "COUNT" | "COUNTA" => Self::Count,
            "COUNTIF" => Self::CountIf,
            "COUNTIFS" => Self::CountIfs,
            "AVERAGE" => Self::Average,
            "AVERAGEIF" => Self::AverageIf,
            "AVERAGEIFS" => Self::AverageIfs,
            "MAX" => Self::Max,
            "MIN" => Self::Min,
            "IF" => Self::If,
            "IFS" => Self::Ifs,
            "VLOOKUP" => Self::VLookup,
            "HLOOKUP" => Self::HLookup,
            "XLOOKUP" => Self::XLookup,
            "CONCATENATE" | "CONCAT" => Self::Concatenate,
            "TEXTJOIN" => Self::TextJoin,
            other if DATE_FUNCTIONS.contains(&other) => Self::Date,
            other if VALIDATION_FUNCTIONS.contains(&other) => Self::Validation,
            _ => return None,
        };
        Some(pattern)
    }

    /// Upper-case pattern name used in descriptions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::SumIf => "SUMIF",
            Self::SumIfs => "SUMIFS",
            Self::Count => "COUNT",
            Self::CountIf => "COUNTIF",
            Self::CountIfs => "COUNTIFS",
            Self::Average => "AVERAGE",
            Self::AverageIf => "AVERAGEIF",
            Self::AverageIfs => "AVERAGEIFS",
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::If => "IF",
            Self::Ifs => "IFS",
            Self::VLookup => "VLOOKUP",
            Self::HLookup => "HLOOKUP",
            Self::XLookup => "XLOOKUP",
            Self::IndexMatch => "INDEX_MATCH",
            Self::Concatenate => "CONCATENATE",
            Self::TextJoin => "TEXTJOIN",
            Self::Date => "DATE",
            Self::Validation => "VALIDATION",
            Self::Math => "MATH",
            Self::Generic => "FORMULA",
        }
    }
}

/// Outcome of pattern recognition over a parsed formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Recognition {
    /// The recognized pattern.
    pub pattern: FormulaPattern,
    /// The call that drives the pattern; `None` for math and generic.
    pub call: Option<NodeId>,
    /// True when the driving call is nested inside a larger expression.
    pub embedded: bool,
}

/// Recognizes the pattern of a parsed formula.
#[must_use]
pub fn recognize(ast: &Ast) -> Recognition {
    let Some(root) = ast.root() else {
        return Recognition {
            pattern: FormulaPattern::Generic,
            call: None,
            embedded: false,
        };
    };

    for id in ast.preorder(root) {
        if let Some(pattern) = call_pattern(ast, id) {
            return Recognition {
                pattern,
                call: Some(id),
                embedded: id != root,
            };
        }
    }

    let pattern = if ast.has_arithmetic(root) {
        FormulaPattern::Math
    } else {
        FormulaPattern::Generic
    };
    Recognition {
        pattern,
        call: None,
        embedded: false,
    }
}

fn call_pattern(ast: &Ast, id: NodeId) -> Option<FormulaPattern> {
    let Node::Call { name, args } = ast.node(id) else {
        return None;
    };
    if name == "INDEX" {
        let paired = args
            .iter()
            .any(|arg| ast.node(*arg).call_name() == Some("MATCH"));
        return paired.then_some(FormulaPattern::IndexMatch);
    }
    FormulaPattern::from_function(name)
}
