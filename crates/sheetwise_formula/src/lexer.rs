//! Lexer for spreadsheet formulas.
//!
//! The lexer converts formula text into a stream of tokens. Identifier-like
//! runs are scanned whole and then classified, so `SUM(`, `A1:B9`,
//! `Products!A:D` and `TAX_RATE` each come out as a single token.

use crate::references::Reference;
use crate::token::{Operator, Span, Token, TokenKind};

/// Error literals recognized after `#`.
const ERROR_LITERALS: &[&str] = &[
    "#DIV/0!", "#N/A", "#NAME?", "#NULL!", "#NUM!", "#REF!", "#VALUE!", "#SPILL!", "#CALC!",
];

/// Lexer for formula text.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Current byte offset in source.
    position: usize,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer. A leading `=` is skipped.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let trimmed = source.trim_start();
        let offset = source.len() - trimmed.len();
        let position = if trimmed.starts_with('=') {
            offset + 1
        } else {
            offset
        };
        Self { source, position }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.position;
        let Some(c) = self.peek_char() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ',' | ';' => self.single(TokenKind::Comma),
            '"' => self.scan_string(),
            '\'' => self.scan_quoted_reference(),
            '#' => self.scan_error_literal(),
            '+' => self.single(TokenKind::Operator(Operator::Add)),
            '-' => self.single(TokenKind::Operator(Operator::Sub)),
            '*' => self.single(TokenKind::Operator(Operator::Mul)),
            '/' => self.single(TokenKind::Operator(Operator::Div)),
            '^' => self.single(TokenKind::Operator(Operator::Pow)),
            '&' => self.single(TokenKind::Operator(Operator::Concat)),
            '%' => self.single(TokenKind::Operator(Operator::Percent)),
            '=' => self.single(TokenKind::Operator(Operator::Eq)),
            '<' => {
                self.advance();
                match self.peek_char() {
                    Some('=') => self.single(TokenKind::Operator(Operator::Le)),
                    Some('>') => self.single(TokenKind::Operator(Operator::Ne)),
                    _ => TokenKind::Operator(Operator::Lt),
                }
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.single(TokenKind::Operator(Operator::Ge))
                } else {
                    TokenKind::Operator(Operator::Gt)
                }
            }
            c if c.is_ascii_digit() || (c == '.' && self.next_is_digit()) => self.scan_number(),
            c if is_word_char(c) => self.scan_word(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(kind, Span::new(start, self.position))
    }

    /// Tokenizes the whole formula. The last token is always `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn rest(&self) -> &'src str {
        self.source.get(self.position..).unwrap_or("")
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn next_is_digit(&self) -> bool {
        self.rest().chars().nth(1).is_some_and(|c| c.is_ascii_digit())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.position += c.len_utf8();
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Scans `"..."` with `""` as an escaped quote.
    fn scan_string(&mut self) -> TokenKind {
        self.advance();
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            self.advance();
            if c == '"' {
                if self.peek_char() == Some('"') {
                    self.advance();
                    text.push('"');
                    continue;
                }
                return TokenKind::String(text);
            }
            text.push(c);
        }
        TokenKind::Error("unterminated string".to_string())
    }

    /// Scans `'Sheet Name'!A1` as one reference token.
    fn scan_quoted_reference(&mut self) -> TokenKind {
        let start = self.position;
        self.advance();
        loop {
            match self.peek_char() {
                None => return TokenKind::Error("unterminated sheet name".to_string()),
                Some('\'') => {
                    self.advance();
                    if self.peek_char() == Some('\'') {
                        self.advance();
                        continue;
                    }
                    break;
                }
                Some(_) => self.advance(),
            }
        }
        if self.peek_char() != Some('!') {
            return TokenKind::Error("expected '!' after sheet name".to_string());
        }
        self.advance();
        while self.peek_char().is_some_and(is_reference_char) {
            self.advance();
        }
        let text = &self.source[start..self.position];
        classify_reference(text)
            .unwrap_or_else(|| TokenKind::Error(format!("invalid reference: {text}")))
    }

    fn scan_error_literal(&mut self) -> TokenKind {
        let rest = self.rest();
        let upper = rest.to_ascii_uppercase();
        for literal in ERROR_LITERALS {
            if upper.starts_with(literal) {
                self.position += literal.len();
                return TokenKind::ErrorLiteral((*literal).to_string());
            }
        }
        self.advance();
        TokenKind::Error("unknown error literal".to_string())
    }

    /// Scans a number, or a whole-row range such as `1:3`.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek_char() == Some(':') {
            let checkpoint = self.position;
            self.advance();
            if self.peek_char() == Some('$') {
                self.advance();
            }
            let digits = self.position;
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            if self.position > digits {
                let text = &self.source[start..self.position];
                if let Some(reference) = Reference::parse(text) {
                    return TokenKind::Range(reference);
                }
            }
            self.position = checkpoint;
        }
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let checkpoint = self.position;
            self.advance();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                self.position = checkpoint;
            }
        }
        let text = &self.source[start..self.position];
        text.parse::<f64>().map_or_else(
            |_| TokenKind::Error(format!("invalid number: {text}")),
            TokenKind::Number,
        )
    }

    /// Scans an identifier-like run and classifies it.
    fn scan_word(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(is_reference_char) {
            self.advance();
        }
        let text = &self.source[start..self.position];

        if self.peek_char() == Some('(') && !text.contains(['!', ':']) {
            return TokenKind::Function(text.to_ascii_uppercase());
        }
        if let Some(kind) = classify_reference(text) {
            return kind;
        }
        match text.to_ascii_uppercase().as_str() {
            "TRUE" => TokenKind::Bool(true),
            "FALSE" => TokenKind::Bool(false),
            _ if text.contains(['!', ':']) => TokenKind::Error(format!("invalid reference: {text}")),
            _ => TokenKind::Name(text.to_string()),
        }
    }
}

fn classify_reference(text: &str) -> Option<TokenKind> {
    let reference = Reference::parse(text)?;
    Some(if reference.is_range() {
        TokenKind::Range(reference)
    } else {
        TokenKind::CellRef(reference)
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_reference_char(c: char) -> bool {
    is_word_char(c) || matches!(c, '.' | '!' | ':')
}
