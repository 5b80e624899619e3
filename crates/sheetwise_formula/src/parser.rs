//! Parser for spreadsheet formulas.
//!
//! The parser converts a stream of tokens into an arena [`Ast`] using
//! precedence climbing. Infix precedence, loosest first: comparisons, `&`,
//! `+ -`, `* /`, `^`. Prefix `-`/`+` bind tighter than `^`, and postfix `%`
//! tighter still.

use sheetwise_foundation::{Error, ErrorKind, Result};

use crate::ast::{Ast, Node, NodeId, UnaryOp, binary_precedence};
use crate::lexer::Lexer;
use crate::token::{Operator, Token, TokenKind};

/// Parses formula text, with or without its leading `=`.
///
/// # Errors
/// Returns `FormulaSyntax` for malformed input and `NodeLimitExceeded` when
/// the tree would grow past `max_nodes`.
pub fn parse(source: &str, max_nodes: usize) -> Result<Ast> {
    Parser::new(source, max_nodes).parse()
}

/// Parser for formula text.
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Tree under construction.
    ast: Ast,
    /// Maximum node count, also used as the nesting limit.
    max_nodes: usize,
    /// Current nesting of parentheses, calls and prefix operators.
    depth: usize,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str, max_nodes: usize) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            ast: Ast::new(),
            max_nodes,
            depth: 0,
        }
    }

    /// Parses the whole formula into a tree whose root is its last node.
    ///
    /// # Errors
    /// Returns an error if the source cannot be parsed.
    pub fn parse(mut self) -> Result<Ast> {
        if self.current.kind == TokenKind::Eof {
            return Err(self.syntax_error("empty formula"));
        }
        let root = self.expression(0)?;
        if self.current.kind != TokenKind::Eof {
            let message = format!("unexpected {} after expression", self.current.kind.name());
            return Err(self.syntax_error(message));
        }
        self.ast.set_root(root);
        Ok(self.ast)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expression(&mut self, min_precedence: u8) -> Result<NodeId> {
        let mut left = self.unary()?;
        loop {
            let op = match &self.current.kind {
                TokenKind::Operator(op) if *op != Operator::Percent => *op,
                _ => break,
            };
            let precedence = binary_precedence(op);
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.expression(precedence + 1)?;
            left = self.push(Node::Binary { op, left, right })?;
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<NodeId> {
        let op = match self.current.kind {
            TokenKind::Operator(Operator::Sub) => UnaryOp::Neg,
            TokenKind::Operator(Operator::Add) => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.advance();
        self.enter()?;
        let operand = self.unary()?;
        self.depth -= 1;
        self.push(Node::Unary { op, operand })
    }

    fn postfix(&mut self) -> Result<NodeId> {
        let mut operand = self.primary()?;
        while self.current.kind == TokenKind::Operator(Operator::Percent) {
            self.advance();
            operand = self.push(Node::Unary {
                op: UnaryOp::Percent,
                operand,
            })?;
        }
        Ok(operand)
    }

    fn primary(&mut self) -> Result<NodeId> {
        let token = self.current.clone();
        match token.kind {
            TokenKind::Number(n) => self.leaf(Node::Number(n)),
            TokenKind::String(s) => self.leaf(Node::Text(s)),
            TokenKind::Bool(b) => self.leaf(Node::Bool(b)),
            TokenKind::ErrorLiteral(e) => self.leaf(Node::Error(e)),
            TokenKind::CellRef(r) | TokenKind::Range(r) => self.leaf(Node::Reference(r)),
            TokenKind::Name(n) => self.leaf(Node::Name(n)),
            TokenKind::LParen => {
                self.advance();
                self.enter()?;
                let inner = self.expression(0)?;
                self.expect_rparen()?;
                self.depth -= 1;
                Ok(inner)
            }
            TokenKind::Function(name) => {
                self.advance();
                if self.current.kind != TokenKind::LParen {
                    return Err(self.syntax_error(format!("expected '(' after {name}")));
                }
                self.advance();
                self.enter()?;
                let args = self.arguments()?;
                self.depth -= 1;
                self.push(Node::Call { name, args })
            }
            TokenKind::Error(message) => Err(Error::formula_syntax(message, token.span.start)),
            TokenKind::Eof => Err(self.syntax_error("unexpected end of formula")),
            other => Err(self.syntax_error(format!("unexpected {}", other.name()))),
        }
    }

    /// Parses call arguments after the opening parenthesis. Omitted
    /// arguments become `Missing` nodes.
    fn arguments(&mut self) -> Result<Vec<NodeId>> {
        let mut args = Vec::new();
        if self.current.kind == TokenKind::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            let arg = if matches!(self.current.kind, TokenKind::Comma | TokenKind::RParen) {
                self.push(Node::Missing)?
            } else {
                self.expression(0)?
            };
            args.push(arg);
            match self.current.kind {
                TokenKind::Comma => self.advance(),
                TokenKind::RParen => {
                    self.advance();
                    return Ok(args);
                }
                _ => {
                    let message = format!("expected ',' or ')', found {}", self.current.kind.name());
                    return Err(self.syntax_error(message));
                }
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn leaf(&mut self, node: Node) -> Result<NodeId> {
        self.advance();
        self.push(node)
    }

    fn push(&mut self, node: Node) -> Result<NodeId> {
        if self.ast.len() >= self.max_nodes {
            return Err(self.limit_error());
        }
        Ok(self.ast.push(node))
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_nodes {
            return Err(self.limit_error());
        }
        self.depth += 1;
        Ok(())
    }

    fn expect_rparen(&mut self) -> Result<()> {
        if self.current.kind == TokenKind::RParen {
            self.advance();
            Ok(())
        } else {
            let message = format!("expected ')', found {}", self.current.kind.name());
            Err(self.syntax_error(message))
        }
    }

    fn syntax_error(&self, message: impl Into<String>) -> Error {
        Error::formula_syntax(message, self.current.span.start)
    }

    fn limit_error(&self) -> Error {
        Error::new(ErrorKind::NodeLimitExceeded {
            limit: self.max_nodes,
        })
    }
}
