//! Translation of formulas into automation rules.
//!
//! Each formula is parsed, matched against the pattern table and turned into
//! one [`AutomationRule`]. References resolve to field names through a
//! [`WorkbookContext`] built from the extracted entities. Filled-down copies
//! of a formula are grouped by shape so a column yields one rule, not one per
//! row.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use sheetwise_foundation::naming::{cell_reference, snake_case};
use sheetwise_foundation::DetectionThresholds;
use sheetwise_schema::{Entity, Relationship};
use tracing::{debug, trace};

use crate::ast::{Ast, Node, NodeId, UnaryOp};
use crate::lexer::Lexer;
use crate::parser::parse;
use crate::pattern::{FormulaPattern, Recognition, recognize};
use crate::references::{Reference, formula_references};
use crate::rule::{
    AggregateOp, AutomationRule, Branch, Comparison, Condition, Filter, Operand, RuleAction,
    RuleImplementation, RuleSource,
};
use crate::token::{Operator, TokenKind};

/// Branch values that make an `IF` a trigger.
const ACTION_WORDS: &[&str] = &[
    "reorder", "alert", "notify", "flag", "warning", "error", "pending", "approved", "rejected",
    "escalate",
];

/// Branch values that make an `IF` a validation.
const VALID_WORDS: &[&str] = &["valid", "true"];
const INVALID_WORDS: &[&str] = &["invalid", "false"];

/// Confidence of rules for unrecognized formulas.
const GENERIC_CONFIDENCE: f64 = 0.5;

// =============================================================================
// Context
// =============================================================================

/// One formula cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormulaSite {
    /// Sheet name.
    pub sheet: String,
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
    /// Formula text, with or without the leading `=`.
    pub formula: String,
}

impl FormulaSite {
    /// Creates a site.
    #[must_use]
    pub fn new(sheet: impl Into<String>, row: usize, col: usize, formula: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            col,
            formula: formula.into(),
        }
    }

    /// `Sheet!E2` for this cell.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}!{}", self.sheet, cell_reference(self.row, self.col))
    }
}

#[derive(Clone, Debug, Default)]
struct SheetFields {
    entity: String,
    fields: HashMap<usize, String>,
}

/// Maps sheets to entities and sheet columns to field names.
#[derive(Clone, Debug, Default)]
pub struct WorkbookContext {
    sheets: HashMap<String, SheetFields>,
}

impl WorkbookContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from extracted entities.
    #[must_use]
    pub fn from_entities(entities: &[Entity]) -> Self {
        let mut context = Self::new();
        for entity in entities {
            context.insert(
                &entity.sheet,
                &entity.id,
                entity
                    .columns
                    .iter()
                    .map(|c| (c.source_col, c.name.clone())),
            );
        }
        context
    }

    /// Registers a sheet with its entity and column fields.
    pub fn insert(
        &mut self,
        sheet: &str,
        entity: &str,
        fields: impl IntoIterator<Item = (usize, String)>,
    ) {
        self.sheets.insert(
            sheet.to_string(),
            SheetFields {
                entity: entity.to_string(),
                fields: fields.into_iter().collect(),
            },
        );
    }

    /// Entity id for a sheet. Sheet names match case-insensitively.
    #[must_use]
    pub fn entity(&self, sheet: &str) -> Option<&str> {
        self.sheet(sheet).map(|s| s.entity.as_str())
    }

    /// Field name for a sheet column.
    #[must_use]
    pub fn field(&self, sheet: &str, col: usize) -> Option<&str> {
        self.sheet(sheet)?.fields.get(&col).map(String::as_str)
    }

    fn sheet(&self, sheet: &str) -> Option<&SheetFields> {
        self.sheets.get(sheet).or_else(|| {
            self.sheets
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(sheet))
                .map(|(_, fields)| fields)
        })
    }
}

// =============================================================================
// Translator
// =============================================================================

/// Rules and relationships from all formulas in a workbook.
#[derive(Clone, Debug, Default)]
pub struct Translation {
    /// One rule per formula group, in first-seen order.
    pub rules: Vec<AutomationRule>,
    /// Cross-sheet relationships, ids unassigned.
    pub relationships: Vec<Relationship>,
}

/// Turns formulas into automation rules.
#[derive(Debug)]
pub struct FormulaTranslator<'a> {
    thresholds: &'a DetectionThresholds,
}

impl<'a> FormulaTranslator<'a> {
    /// Creates a translator.
    #[must_use]
    pub const fn new(thresholds: &'a DetectionThresholds) -> Self {
        Self { thresholds }
    }

    /// Translates every formula, one rule per (sheet, column, shape) group.
    #[must_use]
    pub fn translate_all(&self, sites: &[FormulaSite], context: &WorkbookContext) -> Translation {
        let mut slots: HashMap<(&str, usize, String), usize> = HashMap::new();
        let mut groups: Vec<(&FormulaSite, usize)> = Vec::new();
        for site in sites {
            let key = (site.sheet.as_str(), site.col, formula_shape(&site.formula, site.row));
            if let Some(slot) = slots.get(&key).copied() {
                groups[slot].1 += 1;
            } else {
                slots.insert(key, groups.len());
                groups.push((site, 1));
            }
        }

        let rules: Vec<AutomationRule> = groups
            .par_iter()
            .filter_map(|(site, occurrences)| {
                let mut rule = self.translate(site, context)?;
                rule.occurrences = *occurrences;
                Some(rule)
            })
            .collect();
        let relationships = formula_references(sites, context);
        debug!(
            formulas = sites.len(),
            rules = rules.len(),
            relationships = relationships.len(),
            "translated formulas"
        );
        Translation {
            rules,
            relationships,
        }
    }

    /// Translates one formula. Returns `None` only for blank text; anything
    /// unrecognized or unparseable becomes a generic rule.
    #[must_use]
    pub fn translate(&self, site: &FormulaSite, context: &WorkbookContext) -> Option<AutomationRule> {
        let text = site.formula.trim();
        if text.trim_start_matches('=').trim().is_empty() {
            return None;
        }
        let ast = match parse(text, self.thresholds.max_formula_nodes) {
            Ok(ast) => ast,
            Err(err) => {
                trace!(location = %site.location(), error = %err, "formula left untranslated");
                return Some(self.generic(site, context, &err.to_string()));
            }
        };
        let recognition = recognize(&ast);
        let mut scope = Scope::new(site, context);
        let Some(built) = scope.build(&ast, recognition) else {
            return Some(self.generic(site, context, "unrecognized formula pattern"));
        };

        let excess = paren_depth(text).saturating_sub(self.thresholds.formula_depth_allowance);
        #[allow(clippy::cast_precision_loss)]
        let confidence = 1.0 - 0.1 * (scope.unresolved.len() + excess) as f64;
        Some(self.finish(site, context, built, confidence.clamp(0.0, 1.0)))
    }

    fn generic(&self, site: &FormulaSite, context: &WorkbookContext, reason: &str) -> AutomationRule {
        let built = Built {
            implementation: RuleImplementation::Formula {
                formula: site.formula.clone(),
                reason: reason.to_string(),
            },
            description: format!(
                "Unrecognized formula kept for manual handling: {}",
                site.formula
            ),
        };
        self.finish(site, context, built, GENERIC_CONFIDENCE)
    }

    #[allow(clippy::unused_self)]
    fn finish(
        &self,
        site: &FormulaSite,
        context: &WorkbookContext,
        built: Built,
        confidence: f64,
    ) -> AutomationRule {
        let rule_type = built.implementation.rule_type();
        let target_field = context.field(&site.sheet, site.col).map(ToString::to_string);
        let subject = target_field
            .clone()
            .unwrap_or_else(|| cell_reference(site.row, site.col));
        let entity = context
            .entity(&site.sheet)
            .map_or_else(|| snake_case(&site.sheet), ToString::to_string);
        AutomationRule {
            id: format!(
                "rule_{}_{}",
                snake_case(&site.sheet),
                cell_reference(site.row, site.col).to_ascii_lowercase()
            ),
            name: format!("{subject} {}", rule_label(&built.implementation)),
            rule_type,
            entity,
            enabled: true,
            priority: rule_type.priority(),
            confidence,
            description: built.description,
            source: RuleSource::formula(site.location(), site.formula.clone()),
            implementation: built.implementation,
            occurrences: 1,
            target_field,
        }
    }
}

fn rule_label(implementation: &RuleImplementation) -> &'static str {
    match implementation {
        RuleImplementation::Trigger { .. } => "trigger",
        RuleImplementation::Validation { .. } => "validation",
        RuleImplementation::Lookup { .. } => "lookup",
        RuleImplementation::Aggregate { operation, .. } => match operation {
            AggregateOp::Sum => "sum",
            AggregateOp::Count => "count",
            AggregateOp::Average => "average",
            AggregateOp::Max => "max",
            AggregateOp::Min => "min",
        },
        RuleImplementation::ComputedField { .. } => "computation",
        RuleImplementation::Formula { .. } => "formula",
    }
}

/// Text that is equal for filled-down copies of one formula.
#[must_use]
pub fn formula_shape(formula: &str, row: usize) -> String {
    let mut shape = String::new();
    for token in Lexer::tokenize_all(formula) {
        match &token.kind {
            TokenKind::Eof => break,
            kind => {
                if let Some(reference) = kind.reference() {
                    shape.push_str(&reference.shape(row));
                } else {
                    shape.push_str(token.span.text(formula));
                }
                shape.push(' ');
            }
        }
    }
    shape
}

/// Deepest parenthesis nesting in the raw text, ignoring string literals.
#[must_use]
pub fn paren_depth(formula: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    let mut in_string = false;
    for c in formula.chars() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' if !in_string => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

// =============================================================================
// Per-formula translation
// =============================================================================

struct Built {
    implementation: RuleImplementation,
    description: String,
}

/// Reference resolution state for one formula.
struct Scope<'c> {
    site: &'c FormulaSite,
    context: &'c WorkbookContext,
    target: Option<String>,
    unresolved: HashSet<String>,
}

impl<'c> Scope<'c> {
    fn new(site: &'c FormulaSite, context: &'c WorkbookContext) -> Self {
        Self {
            site,
            context,
            target: context.field(&site.sheet, site.col).map(ToString::to_string),
            unresolved: HashSet::new(),
        }
    }

    fn build(&mut self, ast: &Ast, recognition: Recognition) -> Option<Built> {
        let root = ast.root()?;
        let call = recognition.call.unwrap_or(root);
        let args = match ast.node(call) {
            Node::Call { args, .. } => args.clone(),
            _ => Vec::new(),
        };
        let mut built = match recognition.pattern {
            FormulaPattern::If => self.conditional(ast, call, &args),
            FormulaPattern::Ifs => self.multi_branch(ast, root, &args),
            FormulaPattern::Validation => self.validation(ast, call),
            FormulaPattern::SumIf => self.filtered_aggregate(ast, AggregateOp::Sum, &args),
            FormulaPattern::CountIf => self.filtered_aggregate(ast, AggregateOp::Count, &args),
            FormulaPattern::AverageIf => self.filtered_aggregate(ast, AggregateOp::Average, &args),
            FormulaPattern::SumIfs => self.multi_aggregate(ast, AggregateOp::Sum, &args, true),
            FormulaPattern::AverageIfs => {
                self.multi_aggregate(ast, AggregateOp::Average, &args, true)
            }
            FormulaPattern::CountIfs => self.multi_aggregate(ast, AggregateOp::Count, &args, false),
            FormulaPattern::Sum => self.plain_aggregate(ast, AggregateOp::Sum, &args),
            FormulaPattern::Count => self.plain_aggregate(ast, AggregateOp::Count, &args),
            FormulaPattern::Average => self.plain_aggregate(ast, AggregateOp::Average, &args),
            FormulaPattern::Max => self.plain_aggregate(ast, AggregateOp::Max, &args),
            FormulaPattern::Min => self.plain_aggregate(ast, AggregateOp::Min, &args),
            FormulaPattern::VLookup => self.vertical_lookup(ast, &args, true),
            FormulaPattern::HLookup => self.vertical_lookup(ast, &args, false),
            FormulaPattern::XLookup => self.xlookup(ast, &args),
            FormulaPattern::IndexMatch => self.index_match(ast, &args)?,
            FormulaPattern::Concatenate
            | FormulaPattern::TextJoin
            | FormulaPattern::Date
            | FormulaPattern::Math => self.computed(ast, root, Vec::new()),
            FormulaPattern::Generic => return None,
        };
        let computed = matches!(built.implementation, RuleImplementation::ComputedField { .. });
        if recognition.embedded && !computed {
            let whole = self.render(ast, root);
            built.description = format!("{} (within {whole})", built.description);
        }
        Some(built)
    }

    // -------------------------------------------------------------------------
    // Conditionals
    // -------------------------------------------------------------------------

    fn conditional(&mut self, ast: &Ast, call: NodeId, args: &[NodeId]) -> Built {
        let condition = match args.first() {
            Some(first) => self.condition(ast, *first),
            None => self.expression_condition(ast, call),
        };
        let then = self.branch_value(ast, args.get(1), Operand::Number(0.0));
        let otherwise = self.branch_value(ast, args.get(2), Operand::Bool(false));

        if let Some(built) = self.trigger(&condition, &then, &otherwise) {
            return built;
        }
        if let Some(built) = self.branch_validation(&condition, &then, &otherwise) {
            return built;
        }
        let field = self.target.clone();
        let expression = self.render(ast, call);
        let dependencies = self.dependencies(ast, call);
        Built {
            description: format!(
                "{} = {then} if {condition}, otherwise {otherwise}",
                self.subject()
            ),
            implementation: RuleImplementation::ComputedField {
                field,
                expression,
                dependencies,
                branches: vec![
                    Branch {
                        when: Some(condition),
                        value: then,
                    },
                    Branch {
                        when: None,
                        value: otherwise,
                    },
                ],
            },
        }
    }

    fn trigger(&self, condition: &Condition, then: &Operand, otherwise: &Operand) -> Option<Built> {
        let (condition, value, other) = if has_word(then, ACTION_WORDS) {
            (condition.clone(), then, otherwise)
        } else if has_word(otherwise, ACTION_WORDS) {
            (condition.clone().negate(), otherwise, then)
        } else {
            return None;
        };
        let message = format!("{} is {value} because {condition}", self.subject());
        Some(Built {
            description: format!(
                "When {condition}, set {} to {value} and notify",
                self.subject()
            ),
            implementation: RuleImplementation::Trigger {
                condition,
                actions: vec![
                    RuleAction::SetField {
                        field: self.target.clone(),
                        value: value.clone(),
                    },
                    RuleAction::Notify { message },
                ],
                otherwise: Some(other.clone()),
            },
        })
    }

    fn branch_validation(
        &self,
        condition: &Condition,
        then: &Operand,
        otherwise: &Operand,
    ) -> Option<Built> {
        let positive = is_verdict(then, VALID_WORDS) && is_verdict(otherwise, INVALID_WORDS);
        let negative = is_verdict(then, INVALID_WORDS) && is_verdict(otherwise, VALID_WORDS);
        let condition = match (positive, negative) {
            (true, _) => condition.clone(),
            (_, true) => condition.clone().negate(),
            _ => return None,
        };
        Some(self.validation_rule(condition))
    }

    fn validation(&mut self, ast: &Ast, call: NodeId) -> Built {
        let condition = self.expression_condition(ast, call);
        self.validation_rule(condition)
    }

    fn validation_rule(&self, condition: Condition) -> Built {
        let message = format!("{} must satisfy {condition}", self.subject());
        Built {
            description: format!("Validates that {condition}"),
            implementation: RuleImplementation::Validation {
                condition,
                field: self.target.clone(),
                message,
            },
        }
    }

    fn multi_branch(&mut self, ast: &Ast, root: NodeId, args: &[NodeId]) -> Built {
        let mut branches = Vec::new();
        for pair in args.chunks(2) {
            let [when, value] = pair else {
                break;
            };
            let condition = self.condition(ast, *when);
            let value = self.operand(ast, *value);
            branches.push(Branch {
                when: Some(condition),
                value,
            });
        }
        self.computed(ast, root, branches)
    }

    fn condition(&mut self, ast: &Ast, id: NodeId) -> Condition {
        if let Node::Binary { op, left, right } = ast.node(id) {
            if let Some(operator) = Comparison::from_operator(*op) {
                return Condition::Compare {
                    left: self.operand(ast, *left),
                    operator,
                    right: self.operand(ast, *right),
                };
            }
        }
        self.expression_condition(ast, id)
    }

    fn expression_condition(&mut self, ast: &Ast, id: NodeId) -> Condition {
        Condition::Expression {
            expression: self.render(ast, id),
            dependencies: self.dependencies(ast, id),
        }
    }

    fn branch_value(&mut self, ast: &Ast, arg: Option<&NodeId>, default: Operand) -> Operand {
        match arg {
            Some(id) if *ast.node(*id) != Node::Missing => self.operand(ast, *id),
            _ => default,
        }
    }

    // -------------------------------------------------------------------------
    // Aggregates
    // -------------------------------------------------------------------------

    fn filtered_aggregate(&mut self, ast: &Ast, operation: AggregateOp, args: &[NodeId]) -> Built {
        let range = args.first().copied();
        let values = args.get(2).copied().or(range);
        let filters = match (range, args.get(1)) {
            (Some(range), Some(criteria)) => vec![self.filter(ast, range, *criteria)],
            _ => Vec::new(),
        };
        let value_fields = values.map(|v| self.fields(ast, v)).unwrap_or_default();
        let source = range.and_then(|r| self.source_entity(ast, r));
        self.aggregate(operation, source, value_fields, filters)
    }

    fn multi_aggregate(
        &mut self,
        ast: &Ast,
        operation: AggregateOp,
        args: &[NodeId],
        leading_values: bool,
    ) -> Built {
        let (value_fields, criteria) = if leading_values {
            let values = args.first().map(|v| self.fields(ast, *v)).unwrap_or_default();
            (values, args.get(1..).unwrap_or_default())
        } else {
            (Vec::new(), args)
        };
        let source = criteria
            .first()
            .or_else(|| args.first())
            .and_then(|r| self.source_entity(ast, *r));
        let filters = criteria
            .chunks(2)
            .filter_map(|pair| match pair {
                [range, value] => Some(self.filter(ast, *range, *value)),
                _ => None,
            })
            .collect();
        self.aggregate(operation, source, value_fields, filters)
    }

    fn plain_aggregate(&mut self, ast: &Ast, operation: AggregateOp, args: &[NodeId]) -> Built {
        let value_fields = args.iter().flat_map(|a| self.fields(ast, *a)).collect();
        let source = args.first().and_then(|a| self.source_entity(ast, *a));
        self.aggregate(operation, source, value_fields, Vec::new())
    }

    fn aggregate(
        &self,
        operation: AggregateOp,
        source_entity: Option<String>,
        value_fields: Vec<String>,
        filters: Vec<Filter>,
    ) -> Built {
        let mut description = format!("{operation:?} of {}", value_fields.join(", "));
        if value_fields.is_empty() {
            description = format!("{operation:?} of matching records");
        }
        if !filters.is_empty() {
            let clauses: Vec<String> = filters
                .iter()
                .map(|f| format!("{} {} {}", f.field, f.operator.symbol(), f.value))
                .collect();
            description = format!("{description} where {}", clauses.join(" and "));
        }
        Built {
            description,
            implementation: RuleImplementation::Aggregate {
                operation,
                source_entity,
                value_fields,
                filters,
                result_field: self.target.clone(),
            },
        }
    }

    fn filter(&mut self, ast: &Ast, range: NodeId, criteria: NodeId) -> Filter {
        let field = self
            .fields(ast, range)
            .into_iter()
            .next()
            .unwrap_or_else(|| self.render(ast, range));
        let (operator, value) = self.criteria(ast, criteria);
        Filter {
            field,
            operator,
            value,
        }
    }

    /// Splits criteria like `">=10"` or `">"&B1` into operator and value.
    fn criteria(&mut self, ast: &Ast, id: NodeId) -> (Comparison, Operand) {
        if let Node::Binary {
            op: Operator::Concat,
            left,
            right,
        } = ast.node(id)
        {
            if let Node::Text(prefix) = ast.node(*left) {
                if let Some(operator) = Comparison::from_symbol(prefix.trim()) {
                    return (operator, self.operand(ast, *right));
                }
            }
        }
        match self.operand(ast, id) {
            Operand::Text(text) => split_criteria(&text),
            other => (Comparison::Eq, other),
        }
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// `VLOOKUP` when `by_column`, else `HLOOKUP`.
    fn vertical_lookup(&mut self, ast: &Ast, args: &[NodeId], by_column: bool) -> Built {
        let lookup_field = self.arg_operand(ast, args.first());
        let table = args.get(1).and_then(|t| reference_at(ast, *t));
        let index = args.get(2).and_then(|i| integer_at(ast, *i));
        let exact = args.get(3).is_some_and(|m| is_false_or_zero(ast.node(*m)));

        let target_entity = table.and_then(|t| self.target_entity(t));
        let start = table.and_then(Reference::first_column);
        let (target_column, match_column) = match (table, start) {
            (Some(table), Some(start)) if by_column => {
                let target = index
                    .and_then(|i| usize::try_from(i).ok())
                    .filter(|i| *i >= 1)
                    .and_then(|i| self.column_field(table, start + i - 1));
                (target, self.column_field(table, start))
            }
            _ => (None, None),
        };
        self.lookup(lookup_field, target_entity, index, target_column, match_column, exact)
    }

    fn xlookup(&mut self, ast: &Ast, args: &[NodeId]) -> Built {
        let lookup_field = self.arg_operand(ast, args.first());
        let lookup = args.get(1).and_then(|a| reference_at(ast, *a));
        let result = args.get(2).and_then(|a| reference_at(ast, *a));
        let exact = match args.get(4).map(|m| ast.node(*m)) {
            None | Some(Node::Missing) => true,
            Some(Node::Number(n)) => is_zero(*n),
            Some(_) => false,
        };

        let target_entity = lookup.or(result).and_then(|r| self.target_entity(r));
        let match_column = lookup.and_then(|r| self.first_field(r));
        let target_column = result.and_then(|r| self.first_field(r));
        let index = match (
            lookup.and_then(Reference::first_column),
            result.and_then(Reference::first_column),
        ) {
            (Some(from), Some(to)) if to >= from => u32::try_from(to - from + 1).ok(),
            _ => None,
        };
        self.lookup(lookup_field, target_entity, index, target_column, match_column, exact)
    }

    fn index_match(&mut self, ast: &Ast, args: &[NodeId]) -> Option<Built> {
        let result = args.first().and_then(|a| reference_at(ast, *a));
        let matcher = args
            .iter()
            .find(|a| ast.node(**a).call_name() == Some("MATCH"))?;
        let Node::Call { args: match_args, .. } = ast.node(*matcher) else {
            return None;
        };
        let lookup_field = self.arg_operand(ast, match_args.first());
        let lookup = match_args.get(1).and_then(|a| reference_at(ast, *a));
        let exact = match_args
            .get(2)
            .is_some_and(|m| matches!(ast.node(*m), Node::Number(n) if is_zero(*n)));

        let target_entity = result.or(lookup).and_then(|r| self.target_entity(r));
        let target_column = result.and_then(|r| self.first_field(r));
        let match_column = lookup.and_then(|r| self.first_field(r));
        Some(self.lookup(lookup_field, target_entity, None, target_column, match_column, exact))
    }

    fn lookup(
        &self,
        lookup_field: Operand,
        target_entity: Option<String>,
        index: Option<u32>,
        target_column: Option<String>,
        match_column: Option<String>,
        exact_match: bool,
    ) -> Built {
        let entity = target_entity.as_deref().unwrap_or("another sheet");
        let column = target_column
            .clone()
            .or_else(|| index.map(|i| format!("column {i}")))
            .unwrap_or_else(|| "a column".to_string());
        Built {
            description: format!("Looks up {lookup_field} in {entity} and returns {column}"),
            implementation: RuleImplementation::Lookup {
                lookup_field,
                target_entity,
                target_column_index: index,
                target_column,
                match_column,
                destination_field: self.target.clone(),
                exact_match,
            },
        }
    }

    fn target_entity(&mut self, reference: &Reference) -> Option<String> {
        let sheet = self.sheet_of(reference);
        let entity = self.context.entity(sheet).map(ToString::to_string);
        if entity.is_none() {
            self.unresolved.insert(reference.to_string());
        }
        entity
    }

    fn column_field(&self, reference: &Reference, col: usize) -> Option<String> {
        self.context
            .field(self.sheet_of(reference), col)
            .map(ToString::to_string)
    }

    fn first_field(&self, reference: &Reference) -> Option<String> {
        reference
            .first_column()
            .and_then(|col| self.column_field(reference, col))
    }

    // -------------------------------------------------------------------------
    // Computed fields
    // -------------------------------------------------------------------------

    fn computed(&mut self, ast: &Ast, root: NodeId, branches: Vec<Branch>) -> Built {
        let expression = self.render(ast, root);
        let dependencies = self.dependencies(ast, root);
        Built {
            description: format!("{} = {expression}", self.subject()),
            implementation: RuleImplementation::ComputedField {
                field: self.target.clone(),
                expression,
                dependencies,
                branches,
            },
        }
    }

    // -------------------------------------------------------------------------
    // Operands and references
    // -------------------------------------------------------------------------

    fn operand(&mut self, ast: &Ast, id: NodeId) -> Operand {
        match ast.node(id) {
            Node::Number(n) => Operand::Number(*n),
            Node::Text(s) => Operand::Text(s.clone()),
            Node::Bool(b) => Operand::Bool(*b),
            Node::Reference(r) => self
                .qualified_field(r)
                .map_or_else(|| Operand::Cell(r.to_string()), Operand::Field),
            Node::Unary {
                op: UnaryOp::Neg,
                operand,
            } => match ast.node(*operand) {
                Node::Number(n) => Operand::Number(-n),
                _ => Operand::Expression(self.render(ast, id)),
            },
            _ => Operand::Expression(self.render(ast, id)),
        }
    }

    fn arg_operand(&mut self, ast: &Ast, arg: Option<&NodeId>) -> Operand {
        arg.map_or(Operand::Cell(String::new()), |id| self.operand(ast, *id))
    }

    /// Field name for a reference: bare on the formula's own sheet,
    /// `entity.field` elsewhere. Unresolved references are recorded.
    fn qualified_field(&mut self, reference: &Reference) -> Option<String> {
        let sheet = self.sheet_of(reference);
        let field = reference
            .first_column()
            .and_then(|col| self.context.field(sheet, col));
        let Some(field) = field else {
            self.unresolved.insert(reference.to_string());
            return None;
        };
        if self.is_own_sheet(sheet) {
            Some(field.to_string())
        } else {
            let entity = self.context.entity(sheet).unwrap_or(sheet);
            Some(format!("{entity}.{field}"))
        }
    }

    /// Bare field names of every reference under `id`.
    fn fields(&mut self, ast: &Ast, id: NodeId) -> Vec<String> {
        let mut fields = Vec::new();
        for reference in ast.references(id) {
            let sheet = self.sheet_of(reference);
            match reference
                .first_column()
                .and_then(|col| self.context.field(sheet, col))
            {
                Some(field) => fields.push(field.to_string()),
                None => {
                    self.unresolved.insert(reference.to_string());
                    fields.push(reference.to_string());
                }
            }
        }
        fields
    }

    fn source_entity(&self, ast: &Ast, id: NodeId) -> Option<String> {
        let reference = ast.references(id).into_iter().next()?;
        self.context
            .entity(self.sheet_of(reference))
            .map(ToString::to_string)
    }

    fn dependencies(&mut self, ast: &Ast, id: NodeId) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut dependencies = Vec::new();
        for reference in ast.references(id) {
            if let Some(field) = self.qualified_field(reference) {
                if seen.insert(field.clone()) {
                    dependencies.push(field);
                }
            }
        }
        dependencies
    }

    fn render(&mut self, ast: &Ast, id: NodeId) -> String {
        ast.render(id, |r| {
            self.qualified_field(r).unwrap_or_else(|| r.to_string())
        })
    }

    fn sheet_of<'r>(&self, reference: &'r Reference) -> &'r str
    where
        'c: 'r,
    {
        reference.sheet.as_deref().unwrap_or(&self.site.sheet)
    }

    fn is_own_sheet(&self, sheet: &str) -> bool {
        sheet.eq_ignore_ascii_case(&self.site.sheet)
    }

    fn subject(&self) -> String {
        self.target
            .clone()
            .unwrap_or_else(|| cell_reference(self.site.row, self.site.col))
    }
}

fn reference_at(ast: &Ast, id: NodeId) -> Option<&Reference> {
    match ast.node(id) {
        Node::Reference(r) => Some(r),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn integer_at(ast: &Ast, id: NodeId) -> Option<u32> {
    match ast.node(id) {
        Node::Number(n) if is_zero(n.fract()) && *n >= 0.0 && *n <= f64::from(u32::MAX) => {
            Some(*n as u32)
        }
        _ => None,
    }
}

fn is_zero(n: f64) -> bool {
    n.abs() < f64::EPSILON
}

fn is_false_or_zero(node: &Node) -> bool {
    matches!(node, Node::Bool(false)) || matches!(node, Node::Number(n) if is_zero(*n))
}

fn has_word(operand: &Operand, words: &[&str]) -> bool {
    operand.text().is_some_and(|text| {
        text.split(|c: char| !c.is_alphanumeric())
            .any(|w| words.contains(&w.to_lowercase().as_str()))
    })
}

fn is_verdict(operand: &Operand, words: &[&str]) -> bool {
    match operand {
        Operand::Bool(b) => words.contains(&if *b { "true" } else { "false" }),
        Operand::Text(t) => words.contains(&t.trim().to_lowercase().as_str()),
        _ => false,
    }
}

fn split_criteria(text: &str) -> (Comparison, Operand) {
    let trimmed = text.trim();
    let (operator, rest) = [">=", "<=", "<>", ">", "<", "="]
        .iter()
        .find_map(|symbol| {
            trimmed
                .strip_prefix(symbol)
                .and_then(|rest| Comparison::from_symbol(symbol).map(|op| (op, rest)))
        })
        .unwrap_or((Comparison::Eq, trimmed));
    let rest = rest.trim();
    let value = rest
        .parse::<f64>()
        .map_or_else(|_| Operand::Text(rest.to_string()), Operand::Number);
    (operator, value)
}
