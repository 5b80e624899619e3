//! Token types for spreadsheet formulas.
//!
//! Tokens are the output of the lexer and input to the parser.

use crate::references::Reference;

/// Byte range of a token in the formula text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset where this span starts.
    pub start: usize,
    /// Byte offset where this span ends (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the text this span covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Infix and postfix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`
    Pow,
    /// `&`
    Concat,
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `%` (postfix)
    Percent,
}

impl Operator {
    /// Returns the operator as written in a formula.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
            Self::Concat => "&",
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Percent => "%",
        }
    }

    /// Returns true for `+ - * / ^`.
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Pow)
    }
}

/// Token types for spreadsheet formulas.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Function name directly followed by `(`, upper-cased.
    Function(String),
    /// Multi-cell reference like `A1:B9`, `Products!A:D` or `1:3`.
    Range(Reference),
    /// Single-cell reference like `E2` or `'Order Lines'!$A$1`.
    CellRef(Reference),
    /// Named range or other bare identifier.
    Name(String),
    /// `TRUE` or `FALSE`.
    Bool(bool),
    /// String literal with `""` escapes resolved.
    String(String),
    /// Numeric literal.
    Number(f64),
    /// Error literal like `#N/A`.
    ErrorLiteral(String),
    /// Operator.
    Operator(Operator),
    /// Argument separator, `,` or `;`.
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// End of input.
    Eof,
    /// Lexer error.
    Error(String),
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Function(_) => "function",
            Self::Range(_) => "range",
            Self::CellRef(_) => "cell reference",
            Self::Name(_) => "name",
            Self::Bool(_) => "boolean",
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::ErrorLiteral(_) => "error literal",
            Self::Operator(_) => "operator",
            Self::Comma => "','",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }

    /// Returns the reference carried by a cell or range token.
    #[must_use]
    pub const fn reference(&self) -> Option<&Reference> {
        match self {
            Self::Range(r) | Self::CellRef(r) => Some(r),
            _ => None,
        }
    }
}
