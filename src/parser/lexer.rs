//! Tokenizer for the DDL dialect. Produces position-tagged tokens with
//! comments kept in-stream; the statement splitter decides comment
//! attachment from line adjacency, so every token records its line, column
//! and whether a blank line preceded it.

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    QuotedIdent,
    StringLit,
    Number,
    Symbol,
    LineComment,
    BlockComment,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Ident/keyword spelling, unescaped literal value, symbol text or
    /// comment body (without delimiters).
    pub text: String,
    pub line: usize,
    pub column: usize,
    /// At least one blank line separated this token from the previous one.
    pub blank_before: bool,
}

impl Token {
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(kw)
    }

    pub fn is_symbol(&self, sym: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == sym
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Human-readable form for error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::StringLit => format!("'{}'", self.text),
            _ => self.text.clone(),
        }
    }
}

struct Lexer<'a> {
    src: &'a [u8],
    file: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

/// Tokenize `input`, reporting failures against `file`.
pub fn lex(input: &str, file: &str) -> Result<Vec<Token>, AppError> {
    let mut lx = Lexer { src: input.as_bytes(), file, pos: 0, line: 1, column: 1 };
    let mut out: Vec<Token> = Vec::new();
    let mut prev_end_line = 1usize;
    loop {
        lx.skip_ws();
        let blank_before = lx.line > prev_end_line + 1 && !out.is_empty();
        let (start_line, start_col) = (lx.line, lx.column);
        if lx.pos >= lx.src.len() {
            out.push(Token { kind: TokenKind::Eof, text: String::new(), line: start_line, column: start_col, blank_before });
            return Ok(out);
        }
        let tok = lx.next_token(blank_before)?;
        prev_end_line = lx.line;
        out.push(tok);
    }
}

impl<'a> Lexer<'a> {
    fn bump(&mut self) -> u8 {
        let b = self.src[self.pos];
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        b
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn error(&self, expected: &str, found: String) -> AppError {
        AppError::Parse {
            file: self.file.to_string(),
            line: self.line,
            column: self.column,
            expected: vec![expected.to_string()],
            found,
            context: self.current_line(),
        }
    }

    fn current_line(&self) -> String {
        let text = std::str::from_utf8(self.src).unwrap_or_default();
        text.lines().nth(self.line.saturating_sub(1)).unwrap_or("").trim_end().to_string()
    }

    fn next_token(&mut self, blank_before: bool) -> Result<Token, AppError> {
        let (line, column) = (self.line, self.column);
        let b = self.peek().unwrap();

        // Comments
        if b == b'-' && self.peek2() == Some(b'-') {
            self.bump();
            self.bump();
            let mut body = String::new();
            while let Some(c) = self.peek() {
                if c == b'\n' {
                    break;
                }
                body.push(self.bump() as char);
            }
            return Ok(Token { kind: TokenKind::LineComment, text: body.trim().to_string(), line, column, blank_before });
        }
        if b == b'/' && self.peek2() == Some(b'*') {
            self.bump();
            self.bump();
            let mut body = String::new();
            let mut depth = 1usize;
            loop {
                match self.peek() {
                    None => return Err(self.error("'*/'", "end of input".into())),
                    Some(b'/') if self.peek2() == Some(b'*') => {
                        depth += 1;
                        body.push(self.bump() as char);
                        body.push(self.bump() as char);
                    }
                    Some(b'*') if self.peek2() == Some(b'/') => {
                        self.bump();
                        self.bump();
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                        body.push('*');
                        body.push('/');
                    }
                    Some(_) => body.push(self.bump() as char),
                }
            }
            return Ok(Token { kind: TokenKind::BlockComment, text: body.trim().to_string(), line, column, blank_before });
        }

        // String literal
        if b == b'\'' {
            self.bump();
            let mut value = String::new();
            loop {
                match self.peek() {
                    None => return Err(self.error("closing '''", "end of input".into())),
                    Some(b'\\') => {
                        self.bump();
                        match self.peek() {
                            None => return Err(self.error("escape character", "end of input".into())),
                            Some(c) => {
                                self.bump();
                                value.push(match c {
                                    b'n' => '\n',
                                    b't' => '\t',
                                    b'r' => '\r',
                                    b'0' => '\0',
                                    other => other as char,
                                });
                            }
                        }
                    }
                    Some(b'\'') => {
                        self.bump();
                        // '' escapes a single quote
                        if self.peek() == Some(b'\'') {
                            self.bump();
                            value.push('\'');
                        } else {
                            break;
                        }
                    }
                    Some(_) => {
                        let c = self.bump();
                        value.push(c as char);
                    }
                }
            }
            return Ok(Token { kind: TokenKind::StringLit, text: value, line, column, blank_before });
        }

        // Backtick-quoted identifier
        if b == b'`' {
            self.bump();
            let mut value = String::new();
            loop {
                match self.peek() {
                    None => return Err(self.error("closing '`'", "end of input".into())),
                    Some(b'\\') => {
                        self.bump();
                        match self.peek() {
                            None => return Err(self.error("escape character", "end of input".into())),
                            Some(c) => {
                                self.bump();
                                value.push(c as char);
                            }
                        }
                    }
                    Some(b'`') => {
                        self.bump();
                        break;
                    }
                    Some(_) => {
                        let c = self.bump();
                        value.push(c as char);
                    }
                }
            }
            return Ok(Token { kind: TokenKind::QuotedIdent, text: value, line, column, blank_before });
        }

        // Number: digits, hex, decimals, exponents. Spelling preserved.
        if b.is_ascii_digit() || (b == b'.' && self.peek2().map(|c| c.is_ascii_digit()).unwrap_or(false)) {
            let mut text = String::new();
            if b == b'0' && matches!(self.peek2(), Some(b'x') | Some(b'X')) {
                text.push(self.bump() as char);
                text.push(self.bump() as char);
                while let Some(c) = self.peek() {
                    if c.is_ascii_hexdigit() {
                        text.push(self.bump() as char);
                    } else {
                        break;
                    }
                }
            } else {
                let mut seen_dot = false;
                let mut seen_exp = false;
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(self.bump() as char);
                    } else if c == b'.' && !seen_dot && !seen_exp {
                        // Not a decimal point if it starts a `..` or a qualified name tail
                        if self.peek2().map(|n| n.is_ascii_digit()).unwrap_or(false) {
                            seen_dot = true;
                            text.push(self.bump() as char);
                        } else {
                            break;
                        }
                    } else if (c == b'e' || c == b'E') && !seen_exp {
                        let next = self.src.get(self.pos + 1).copied();
                        let after = self.src.get(self.pos + 2).copied();
                        let exp_ok = match next {
                            Some(d) if d.is_ascii_digit() => true,
                            Some(b'+') | Some(b'-') => after.map(|d| d.is_ascii_digit()).unwrap_or(false),
                            _ => false,
                        };
                        if !exp_ok {
                            break;
                        }
                        seen_exp = true;
                        text.push(self.bump() as char);
                        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                            text.push(self.bump() as char);
                        }
                    } else {
                        break;
                    }
                }
            }
            return Ok(Token { kind: TokenKind::Number, text, line, column, blank_before });
        }

        // Identifier / keyword
        if b.is_ascii_alphabetic() || b == b'_' {
            let mut text = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_alphanumeric() || c == b'_' {
                    text.push(self.bump() as char);
                } else {
                    break;
                }
            }
            return Ok(Token { kind: TokenKind::Ident, text, line, column, blank_before });
        }

        // Symbols, longest match first
        const TWO: &[&str] = &["->", "::", "<=", ">=", "!=", "<>", "==", "||"];
        if let Some(next) = self.peek2() {
            let pair = [b, next];
            let pair = std::str::from_utf8(&pair).unwrap_or("");
            if TWO.contains(&pair) {
                self.bump();
                self.bump();
                return Ok(Token { kind: TokenKind::Symbol, text: pair.to_string(), line, column, blank_before });
            }
        }
        const ONE: &[u8] = b"()[]{},.;=<>+-*/%?:";
        if ONE.contains(&b) {
            self.bump();
            return Ok(Token { kind: TokenKind::Symbol, text: (b as char).to_string(), line, column, blank_before });
        }

        Err(self.error("a token", format!("{}", b as char)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(TokenKind, String)> {
        lex(input, "test.sql")
            .expect("lex failed")
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn lexes_create_table_head() {
        let toks = kinds("CREATE TABLE a.t (id UInt64)");
        assert_eq!(toks[0], (TokenKind::Ident, "CREATE".into()));
        assert_eq!(toks[1], (TokenKind::Ident, "TABLE".into()));
        assert_eq!(toks[2], (TokenKind::Ident, "a".into()));
        assert_eq!(toks[3], (TokenKind::Symbol, ".".into()));
        assert!(toks.iter().any(|(k, t)| *k == TokenKind::Ident && t == "UInt64"));
    }

    #[test]
    fn string_escapes_and_doubling() {
        let toks = kinds(r"SELECT 'it''s', 'a\'b', 'line\nbreak'");
        let strings: Vec<&String> = toks.iter().filter(|(k, _)| *k == TokenKind::StringLit).map(|(_, t)| t).collect();
        assert_eq!(strings, [&"it's".to_string(), &"a'b".to_string(), &"line\nbreak".to_string()]);
    }

    #[test]
    fn backtick_identifiers_preserve_inner_spelling() {
        let toks = kinds("`weird name`");
        assert_eq!(toks[0], (TokenKind::QuotedIdent, "weird name".into()));
    }

    #[test]
    fn nested_block_comments() {
        let toks = kinds("/* outer /* inner */ tail */ SELECT");
        assert_eq!(toks[0].0, TokenKind::BlockComment);
        assert!(toks[0].1.contains("inner"));
        assert_eq!(toks[1], (TokenKind::Ident, "SELECT".into()));
    }

    #[test]
    fn comment_like_text_inside_string_is_not_a_comment() {
        let toks = kinds("'-- not a comment'");
        assert_eq!(toks[0], (TokenKind::StringLit, "-- not a comment".into()));
    }

    #[test]
    fn blank_line_tracking() {
        let toks = lex("a\n\nb\nc", "t.sql").expect("lex");
        assert!(!toks[0].blank_before);
        assert!(toks[1].blank_before, "b follows a blank line");
        assert!(!toks[2].blank_before, "c is adjacent to b");
    }

    #[test]
    fn positions_are_one_based() {
        let toks = lex("CREATE\n  TABLE", "t.sql").expect("lex");
        assert_eq!((toks[0].line, toks[0].column), (1, 1));
        assert_eq!((toks[1].line, toks[1].column), (2, 3));
    }

    #[test]
    fn dotted_names_do_not_eat_numbers() {
        let toks = kinds("db1.t2");
        assert_eq!(toks[0], (TokenKind::Ident, "db1".into()));
        assert_eq!(toks[1], (TokenKind::Symbol, ".".into()));
        assert_eq!(toks[2], (TokenKind::Ident, "t2".into()));
    }

    #[test]
    fn numbers_keep_spelling() {
        let toks = kinds("0.5 1e9 0xFF 10");
        let nums: Vec<&String> = toks.iter().filter(|(k, _)| *k == TokenKind::Number).map(|(_, t)| t).collect();
        assert_eq!(nums, [&"0.5".to_string(), &"1e9".to_string(), &"0xFF".to_string(), &"10".to_string()]);
    }

    #[test]
    fn unterminated_string_reports_position() {
        let err = lex("SELECT 'oops", "bad.sql").expect_err("should fail");
        let text = err.to_string();
        assert!(text.contains("bad.sql"), "file missing: {text}");
        assert!(text.contains("end of input"), "found missing: {text}");
    }
}
