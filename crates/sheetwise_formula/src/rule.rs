//! Automation rules derived from formulas.
//!
//! This module provides:
//! - [`AutomationRule`] - One rule per recognized formula group
//! - [`RuleType`] - Rule category with its fixed priority
//! - [`RuleImplementation`] - Type-specific payload
//! - [`Condition`], [`Operand`], [`RuleAction`] - Building blocks of payloads

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::Operator;

/// Rule category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// Condition that sets a field and notifies.
    Trigger,
    /// Check that a record is valid.
    Validation,
    /// Value fetched from another entity.
    Lookup,
    /// Aggregate over a range, optionally filtered.
    Aggregate,
    /// Field computed from other fields.
    ComputedField,
    /// Unrecognized formula kept for manual handling.
    Formula,
}

impl RuleType {
    /// Evaluation priority, lower first.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Trigger => 1,
            Self::Validation => 2,
            Self::Lookup => 3,
            Self::Aggregate => 4,
            Self::ComputedField => 5,
            Self::Formula => 9,
        }
    }

    /// Name as serialized.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trigger => "TRIGGER",
            Self::Validation => "VALIDATION",
            Self::Lookup => "LOOKUP",
            Self::Aggregate => "AGGREGATE",
            Self::ComputedField => "COMPUTED_FIELD",
            Self::Formula => "FORMULA",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a rule came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleSource {
    /// Always `"FORMULA"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// First cell of the group, like `Orders!E2`.
    pub location: String,
    /// Formula text as found in that cell.
    pub formula: String,
}

impl RuleSource {
    /// Creates a formula source.
    #[must_use]
    pub fn formula(location: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            kind: "FORMULA".to_string(),
            location: location.into(),
            formula: formula.into(),
        }
    }
}

/// A rule derived from one formula group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    /// Stable id derived from the first cell, like `rule_orders_e2`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Rule category.
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    /// Owning entity id.
    pub entity: String,
    /// Rules are emitted enabled.
    pub enabled: bool,
    /// Evaluation priority from [`RuleType::priority`].
    pub priority: u8,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Free-text description.
    pub description: String,
    /// Originating formula.
    pub source: RuleSource,
    /// Type-specific payload.
    pub implementation: RuleImplementation,
    /// Number of cells sharing this formula shape.
    pub occurrences: usize,
    /// Field the formula's column maps to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_field: Option<String>,
}

/// Type-specific rule payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleImplementation {
    /// Condition with actions for the true branch.
    Trigger {
        /// When the actions fire.
        condition: Condition,
        /// Actions to run.
        actions: Vec<RuleAction>,
        /// Value written when the condition is false.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Operand>,
    },
    /// A check on a record.
    Validation {
        /// Condition a valid record satisfies.
        condition: Condition,
        /// Field holding the result, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        /// Message for failing records.
        message: String,
    },
    /// Fetch a value from another entity.
    Lookup {
        /// Field whose value is looked up.
        lookup_field: Operand,
        /// Entity holding the table.
        target_entity: Option<String>,
        /// 1-based column (or row, for `HLOOKUP`) index in the table.
        target_column_index: Option<u32>,
        /// Field at that index, when resolvable.
        target_column: Option<String>,
        /// Field matched against the lookup value.
        match_column: Option<String>,
        /// Field receiving the result.
        destination_field: Option<String>,
        /// Exact rather than approximate match.
        exact_match: bool,
    },
    /// Aggregate over a field.
    Aggregate {
        /// Aggregate operation.
        operation: AggregateOp,
        /// Entity the values come from.
        source_entity: Option<String>,
        /// Aggregated fields.
        value_fields: Vec<String>,
        /// Filters applied first.
        filters: Vec<Filter>,
        /// Field receiving the result.
        result_field: Option<String>,
    },
    /// Field computed from an expression.
    ComputedField {
        /// Field receiving the value.
        field: Option<String>,
        /// Expression with references replaced by field names.
        expression: String,
        /// Fields the expression reads.
        dependencies: Vec<String>,
        /// Conditional branches, for `IF` and `IFS`.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        branches: Vec<Branch>,
    },
    /// Verbatim formula needing manual handling.
    Formula {
        /// Formula text.
        formula: String,
        /// Why it was not translated.
        reason: String,
    },
}

impl RuleImplementation {
    /// The rule type this payload belongs to.
    #[must_use]
    pub const fn rule_type(&self) -> RuleType {
        match self {
            Self::Trigger { .. } => RuleType::Trigger,
            Self::Validation { .. } => RuleType::Validation,
            Self::Lookup { .. } => RuleType::Lookup,
            Self::Aggregate { .. } => RuleType::Aggregate,
            Self::ComputedField { .. } => RuleType::ComputedField,
            Self::Formula { .. } => RuleType::Formula,
        }
    }
}

/// A value in a condition or action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Operand {
    /// A field of the owning entity, or `entity.field` elsewhere.
    Field(String),
    /// A reference that resolved to no field.
    Cell(String),
    /// Text literal.
    Text(String),
    /// Numeric literal.
    Number(f64),
    /// Boolean literal.
    Bool(bool),
    /// Anything more complex, rendered with field names.
    Expression(String),
}

impl Operand {
    /// Field name, if this operand is a field.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Field(f) => Some(f),
            _ => None,
        }
    }

    /// Text literal, if this operand is one.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(s) | Self::Cell(s) | Self::Expression(s) => f.write_str(s),
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// Comparison operators in conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// `=`
    #[serde(rename = "=")]
    Eq,
    /// `<>`
    #[serde(rename = "<>")]
    Ne,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
}

impl Comparison {
    /// Converts a formula operator.
    #[must_use]
    pub const fn from_operator(op: Operator) -> Option<Self> {
        match op {
            Operator::Eq => Some(Self::Eq),
            Operator::Ne => Some(Self::Ne),
            Operator::Lt => Some(Self::Lt),
            Operator::Le => Some(Self::Le),
            Operator::Gt => Some(Self::Gt),
            Operator::Ge => Some(Self::Ge),
            _ => None,
        }
    }

    /// Parses a criteria prefix such as `>=`.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Eq),
            "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// The logical negation.
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Ge,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
            Self::Ge => Self::Lt,
        }
    }

    /// Symbol as written in a formula.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// A rule condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Binary comparison.
    Compare {
        /// Left operand.
        left: Operand,
        /// Operator.
        operator: Comparison,
        /// Right operand.
        right: Operand,
    },
    /// Any other boolean expression.
    Expression {
        /// Rendered expression.
        expression: String,
        /// Fields it reads.
        dependencies: Vec<String>,
    },
}

impl Condition {
    /// The logical negation.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Compare {
                left,
                operator,
                right,
            } => Self::Compare {
                left,
                operator: operator.negate(),
                right,
            },
            Self::Expression {
                expression,
                dependencies,
            } => Self::Expression {
                expression: format!("NOT({expression})"),
                dependencies,
            },
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare {
                left,
                operator,
                right,
            } => write!(f, "{left} {} {right}", operator.symbol()),
            Self::Expression { expression, .. } => f.write_str(expression),
        }
    }
}

/// Action run by a trigger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RuleAction {
    /// Write a value to a field.
    SetField {
        /// Field written, when known.
        field: Option<String>,
        /// Value written.
        value: Operand,
    },
    /// Raise a notification.
    Notify {
        /// Notification text.
        message: String,
    },
}

/// Aggregate operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregateOp {
    /// Sum of values.
    Sum,
    /// Count of values or matches.
    Count,
    /// Mean of values.
    Average,
    /// Largest value.
    Max,
    /// Smallest value.
    Min,
}

/// A filter in an aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field tested.
    pub field: String,
    /// Comparison.
    pub operator: Comparison,
    /// Criteria value.
    pub value: Operand,
}

/// One branch of a conditional computed field. The final branch of an
/// `IF` has no condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Condition guarding the branch.
    pub when: Option<Condition>,
    /// Value produced.
    pub value: Operand,
}
