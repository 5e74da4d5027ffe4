//! Parser machinery: token cursor, keyword/symbol expectations and error
//! construction. Statement parsers never guess; a failed expectation
//! produces a `ParseError` carrying position, expected-token set and the
//! offending source line.

use crate::error::AppError;
use crate::ident::{Ident, ObjectName};
use crate::parser::ast::Setting;
use crate::parser::lexer::{Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    pub file: &'a str,
    source: &'a str,
}

impl<'a> Parser<'a> {
    /// Build a cursor over `tokens`, comments already filtered out by the
    /// statement splitter.
    pub fn new(tokens: Vec<Token>, file: &'a str, source: &'a str) -> Self {
        Parser { tokens, pos: 0, file, source }
    }

    pub fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| self.tokens.last().expect("token stream ends with Eof"))
    }

    pub fn peek_at(&self, n: usize) -> &Token {
        self.tokens
            .get(self.pos + n)
            .unwrap_or_else(|| self.tokens.last().expect("token stream ends with Eof"))
    }

    pub fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Checkpoint for the rare spots that need bounded backtracking
    /// (opaque engine parameters).
    pub fn save(&self) -> usize {
        self.pos
    }

    pub fn restore(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Error at the current token with the given expectation set.
    pub fn error(&self, expected: &[&str]) -> AppError {
        let tok = self.peek();
        AppError::Parse {
            file: self.file.to_string(),
            line: tok.line,
            column: tok.column,
            expected: expected.iter().map(|s| s.to_string()).collect(),
            found: tok.describe(),
            context: self
                .source
                .lines()
                .nth(tok.line.saturating_sub(1))
                .unwrap_or("")
                .trim_end()
                .to_string(),
        }
    }

    // -- keywords -----------------------------------------------------------

    pub fn check_keyword(&self, kw: &str) -> bool {
        self.peek().is_keyword(kw)
    }

    /// True when the next tokens spell the keyword sequence, e.g.
    /// `["IF", "NOT", "EXISTS"]`.
    pub fn check_keywords(&self, kws: &[&str]) -> bool {
        kws.iter().enumerate().all(|(i, kw)| self.peek_at(i).is_keyword(kw))
    }

    pub fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn eat_keywords(&mut self, kws: &[&str]) -> bool {
        if self.check_keywords(kws) {
            for _ in kws {
                self.advance();
            }
            true
        } else {
            false
        }
    }

    pub fn expect_keyword(&mut self, kw: &str) -> Result<(), AppError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.error(&[kw]))
        }
    }

    pub fn expect_keywords(&mut self, kws: &[&str]) -> Result<(), AppError> {
        for kw in kws {
            self.expect_keyword(kw)?;
        }
        Ok(())
    }

    // -- symbols ------------------------------------------------------------

    pub fn check_symbol(&self, sym: &str) -> bool {
        self.peek().is_symbol(sym)
    }

    pub fn eat_symbol(&mut self, sym: &str) -> bool {
        if self.check_symbol(sym) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect_symbol(&mut self, sym: &str) -> Result<(), AppError> {
        if self.eat_symbol(sym) {
            Ok(())
        } else {
            Err(self.error(&[&format!("'{sym}'")]))
        }
    }

    // -- common fragments ---------------------------------------------------

    /// Any identifier token; keywords double as identifiers in name
    /// position, the way the server accepts them.
    pub fn parse_ident(&mut self) -> Result<Ident, AppError> {
        match self.peek().kind {
            TokenKind::Ident => {
                let t = self.advance();
                Ok(Ident::plain(t.text))
            }
            TokenKind::QuotedIdent => {
                let t = self.advance();
                Ok(Ident::quoted(t.text))
            }
            _ => Err(self.error(&["an identifier"])),
        }
    }

    /// `name` or `db.name`.
    pub fn parse_object_name(&mut self) -> Result<ObjectName, AppError> {
        let first = self.parse_ident()?;
        if self.eat_symbol(".") {
            let second = self.parse_ident()?;
            Ok(ObjectName::qualified(first, second))
        } else {
            Ok(ObjectName::bare(first))
        }
    }

    /// `ON CLUSTER <name>` when present.
    pub fn parse_on_cluster(&mut self) -> Result<Option<Ident>, AppError> {
        if self.eat_keywords(&["ON", "CLUSTER"]) {
            Ok(Some(self.parse_ident()?))
        } else {
            Ok(None)
        }
    }

    pub fn parse_string(&mut self) -> Result<String, AppError> {
        if self.peek().kind == TokenKind::StringLit {
            Ok(self.advance().text)
        } else {
            Err(self.error(&["a string literal"]))
        }
    }

    pub fn parse_u64(&mut self) -> Result<u64, AppError> {
        if self.peek().kind == TokenKind::Number {
            let tok = self.advance();
            tok.text.parse::<u64>().map_err(|_| {
                AppError::Parse {
                    file: self.file.to_string(),
                    line: tok.line,
                    column: tok.column,
                    expected: vec!["an unsigned integer".into()],
                    found: tok.text.clone(),
                    context: String::new(),
                }
            })
        } else {
            Err(self.error(&["an unsigned integer"]))
        }
    }

    /// `COMMENT '<text>'` when present.
    pub fn parse_opt_comment(&mut self) -> Result<Option<String>, AppError> {
        if self.eat_keyword("COMMENT") {
            Ok(Some(self.parse_string()?))
        } else {
            Ok(None)
        }
    }

    /// Comma-separated identifier list.
    pub fn parse_ident_list(&mut self) -> Result<Vec<Ident>, AppError> {
        let mut out = vec![self.parse_ident()?];
        while self.eat_symbol(",") {
            out.push(self.parse_ident()?);
        }
        Ok(out)
    }

    /// `name = value [, ...]` used by SETTINGS clauses.
    pub fn parse_settings_list(&mut self) -> Result<Vec<Setting>, AppError> {
        let mut out = Vec::new();
        loop {
            let name = self.parse_ident()?;
            self.expect_symbol("=")?;
            let value = crate::parser::expr::parse_expr(self)?;
            out.push(Setting { name, value });
            if !self.eat_symbol(",") {
                break;
            }
        }
        Ok(out)
    }
}
