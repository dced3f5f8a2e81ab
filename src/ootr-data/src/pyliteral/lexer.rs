//! Tokenizer for Python source files
//!
//! The engine's data tables live in ordinary Python modules, so the whole
//! file has to be tokenized even though only a few assignments are read.
//! Newlines are only reported outside of brackets, which is all the parser
//! needs to find statement boundaries.

use super::{ParseError, Position};

/// String literal flavor, from its prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrFlavor {
    Plain,
    Bytes,
    Formatted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Name(String),
    /// Numeric literal, kept as written
    Number(String),
    Str { value: String, flavor: StrFlavor },
    Op(&'static str),
    Open(char),
    Close(char),
    Newline,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    pub position: Position,
}

const THREE_CHAR_OPS: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];

const TWO_CHAR_OPS: &[&str] = &[
    "==", "!=", "<=", ">=", "->", ":=", "**", "//", "<<", ">>", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "@=",
];

const ONE_CHAR_OPS: &[&str] = &[
    "+", "-", "*", "/", "%", "&", "|", "^", "~", "<", ">", "=", ".", ",", ":", ";", "@", "!",
];

const STRING_PREFIXES: &[&str] = &["r", "u", "b", "f", "br", "rb", "fr", "rf"];

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    line_start: usize,
    depth: usize,
    pending_newline: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            line_start: 0,
            depth: 0,
            pending_newline: false,
        }
    }

    /// Tokenize the whole input, ending with a single `Eof`
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    fn position_at(&self, offset: usize) -> Position {
        // Only valid for offsets on the current line
        Position {
            line: self.line,
            column: self.input[self.line_start..offset].chars().count() + 1,
        }
    }

    fn position(&self) -> Position {
        self.position_at(self.pos)
    }

    fn token(&self, kind: TokenKind, start: usize, position: Position) -> Token {
        Token {
            kind,
            start,
            end: self.pos,
            position,
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\x0c') => {
                    self.bump();
                }
                Some('\\') if matches!(self.peek_nth(1), Some('\n' | '\r')) => {
                    self.bump();
                    self.skip_line_break();
                }
                Some('#') => {
                    while !matches!(self.peek(), None | Some('\n' | '\r')) {
                        self.bump();
                    }
                }
                Some('\n' | '\r') => {
                    let start = self.pos;
                    let position = self.position();
                    self.skip_line_break();
                    if self.depth == 0 && self.pending_newline {
                        self.pending_newline = false;
                        return Ok(Token {
                            kind: TokenKind::Newline,
                            start,
                            end: start,
                            position,
                        });
                    }
                }
                None => {
                    let position = self.position();
                    return Ok(self.token(TokenKind::Eof, self.pos, position));
                }
                Some(c) => {
                    let token = self.lex_token(c)?;
                    self.pending_newline = true;
                    return Ok(token);
                }
            }
        }
    }

    fn skip_line_break(&mut self) {
        if self.peek() == Some('\r') {
            self.pos += 1;
            if self.peek() != Some('\n') {
                // Bare carriage return
                self.line += 1;
                self.line_start = self.pos;
                return;
            }
        }
        self.bump();
    }

    fn lex_token(&mut self, c: char) -> Result<Token, ParseError> {
        let start = self.pos;
        let position = self.position();

        if c.is_alphabetic() || c == '_' {
            return self.lex_name_or_prefixed_string(start, position);
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_nth(1).is_some_and(|n| n.is_ascii_digit())) {
            self.lex_number();
            let text = self.input[start..self.pos].to_string();
            return Ok(self.token(TokenKind::Number(text), start, position));
        }

        if c == '\'' || c == '"' {
            return self.lex_string(start, position, StrFlavor::Plain, false);
        }

        match c {
            '(' | '[' | '{' => {
                self.bump();
                self.depth += 1;
                return Ok(self.token(TokenKind::Open(c), start, position));
            }
            ')' | ']' | '}' => {
                self.bump();
                self.depth = self.depth.saturating_sub(1);
                return Ok(self.token(TokenKind::Close(c), start, position));
            }
            _ => {}
        }

        let rest = &self.input[self.pos..];
        let op = THREE_CHAR_OPS
            .iter()
            .chain(TWO_CHAR_OPS)
            .chain(ONE_CHAR_OPS)
            .find(|op| rest.starts_with(**op));

        match op {
            Some(op) => {
                self.pos += op.len();
                Ok(self.token(TokenKind::Op(*op), start, position))
            }
            None => Err(ParseError::UnexpectedChar { position, found: c }),
        }
    }

    fn lex_name_or_prefixed_string(
        &mut self,
        start: usize,
        position: Position,
    ) -> Result<Token, ParseError> {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }
        let input = self.input;
        let name = &input[start..self.pos];

        if matches!(self.peek(), Some('\'' | '"')) {
            let lower = name.to_ascii_lowercase();
            if STRING_PREFIXES.contains(&lower.as_str()) {
                let raw = lower.contains('r');
                let flavor = if lower.contains('b') {
                    StrFlavor::Bytes
                } else if lower.contains('f') {
                    StrFlavor::Formatted
                } else {
                    StrFlavor::Plain
                };
                return self.lex_string(start, position, flavor, raw);
            }
        }

        let kind = TokenKind::Name(name.to_string());
        Ok(self.token(kind, start, position))
    }

    fn lex_number(&mut self) {
        let is_digit_or_sep = |c: char| c.is_ascii_hexdigit() || c == '_';

        if self.peek() == Some('0') && matches!(self.peek_nth(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            self.bump();
            self.bump();
            while self.peek().is_some_and(is_digit_or_sep) {
                self.bump();
            }
            return;
        }

        self.eat_decimal_digits();
        if self.peek() == Some('.') {
            self.bump();
            self.eat_decimal_digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_nth(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
                if signed {
                    self.bump();
                }
                self.eat_decimal_digits();
            }
        }
        if matches!(self.peek(), Some('j' | 'J')) {
            self.bump();
        }
    }

    fn eat_decimal_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }

    fn lex_string(
        &mut self,
        start: usize,
        position: Position,
        flavor: StrFlavor,
        raw: bool,
    ) -> Result<Token, ParseError> {
        let Some(quote) = self.bump() else {
            return Err(ParseError::UnterminatedString { position });
        };
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut value = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(ParseError::UnterminatedString { position });
            };

            if c == quote {
                if !triple {
                    break;
                }
                if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                    self.bump();
                    self.bump();
                    break;
                }
                value.push(c);
                continue;
            }

            match c {
                '\n' | '\r' if !triple => {
                    return Err(ParseError::UnterminatedString { position });
                }
                '\r' => {
                    if self.peek() != Some('\n') {
                        self.line += 1;
                        self.line_start = self.pos;
                    }
                    value.push(c);
                }
                '\\' if raw => {
                    value.push(c);
                    if let Some(next) = self.bump() {
                        value.push(next);
                    }
                }
                '\\' => self.lex_escape(&mut value, flavor)?,
                _ => value.push(c),
            }
        }

        Ok(self.token(TokenKind::Str { value, flavor }, start, position))
    }

    fn lex_escape(&mut self, value: &mut String, flavor: StrFlavor) -> Result<(), ParseError> {
        let position = self.position();
        let Some(c) = self.bump() else {
            return Err(ParseError::UnterminatedString { position });
        };

        match c {
            '\n' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                } else {
                    self.line += 1;
                    self.line_start = self.pos;
                }
            }
            '\\' | '\'' | '"' => value.push(c),
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'a' => value.push('\x07'),
            'b' => value.push('\x08'),
            'f' => value.push('\x0c'),
            'v' => value.push('\x0b'),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                value.push(self.escaped_char(code, position)?);
            }
            'x' => {
                let code = self.hex_digits(2, position)?;
                value.push(self.escaped_char(code, position)?);
            }
            'u' if flavor != StrFlavor::Bytes => {
                let code = self.hex_digits(4, position)?;
                value.push(self.escaped_char(code, position)?);
            }
            'U' if flavor != StrFlavor::Bytes => {
                let code = self.hex_digits(8, position)?;
                value.push(self.escaped_char(code, position)?);
            }
            other => {
                // Unknown escapes are kept verbatim, \N{...} included
                value.push('\\');
                value.push(other);
            }
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize, position: Position) -> Result<u32, ParseError> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self
                .peek()
                .and_then(|d| d.to_digit(16))
                .ok_or(ParseError::InvalidEscape { position })?;
            code = code * 16 + digit;
            self.bump();
        }
        Ok(code)
    }

    fn escaped_char(&self, code: u32, position: Position) -> Result<char, ParseError> {
        char::from_u32(code).ok_or(ParseError::InvalidEscape { position })
    }
}
