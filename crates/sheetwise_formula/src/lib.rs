//! Formula parsing and translation into automation rules.
//!
//! This crate provides:
//! - [`Lexer`] - Tokenization of formula text
//! - [`parse`] - Precedence-climbing parser producing an arena [`Ast`]
//! - [`recognize`] - Mapping of parsed formulas onto known patterns
//! - [`FormulaTranslator`] - Rules from formulas, grouped by shape
//! - [`formula_references`] - Relationships implied by cross-sheet references

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod pattern;
pub mod references;
pub mod rule;
pub mod token;
pub mod translate;


pub use ast::{Ast, Node, NodeId, UnaryOp};
pub use lexer::Lexer;
pub use parser::{Parser, parse};
pub use pattern::{FormulaPattern, Recognition, recognize};
pub use references::{Area, CellAddress, Reference, formula_references};
pub use rule::{
    AggregateOp, AutomationRule, Branch, Comparison, Condition, Filter, Operand, RuleAction,
    RuleImplementation, RuleSource, RuleType,
};
pub use token::{Operator, Span, Token, TokenKind};
pub use translate::{
    FormulaSite, FormulaTranslator, Translation, WorkbookContext, formula_shape, paren_depth,
};
