//! Expression parser over the token stream

use super::lexer::{Lexer, StrFlavor, Token, TokenKind};
use super::{ParseError, Position};
use crate::value::{Dict, Value};

/// Parse a single expression that makes up the whole input
pub fn parse_expression(source: &str) -> Result<Value, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser::new(source, &tokens, 0);
    parser.skip_newlines();
    let value = parser.expression()?;
    parser.skip_newlines();
    if parser.peek().kind != TokenKind::Eof {
        return Err(parser.unexpected("end of input"));
    }
    Ok(value)
}

/// Evaluate the right-hand side of a module-level `name = ...` statement
///
/// Annotated assignments (`name: T = ...`) are accepted. Assignments nested
/// in functions or classes are ignored. When a name is assigned more than once
/// the last assignment is used, as it is the one the module ends up with.
pub fn find_assignment(source: &str, name: &str) -> Result<Option<Value>, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let Some(rhs) = last_assignment(&tokens, name) else {
        return Ok(None);
    };

    let mut parser = Parser::new(source, &tokens, rhs);
    let value = parser.expression()?;
    if !matches!(
        parser.peek().kind,
        TokenKind::Newline | TokenKind::Eof | TokenKind::Op(";")
    ) {
        return Err(parser.unexpected("end of statement"));
    }
    Ok(Some(value))
}

/// Index of the first right-hand side token of the last top-level assignment
fn last_assignment(tokens: &[Token], name: &str) -> Option<usize> {
    let mut found = None;

    for (i, token) in tokens.iter().enumerate() {
        let at_statement_start = i == 0 || tokens[i - 1].kind == TokenKind::Newline;
        if !at_statement_start || token.position.column != 1 {
            continue;
        }
        if !matches!(&token.kind, TokenKind::Name(n) if n == name) {
            continue;
        }

        match tokens.get(i + 1).map(|t| &t.kind) {
            Some(TokenKind::Op("=")) => found = Some(i + 2),
            Some(TokenKind::Op(":")) => {
                let eq = tokens[i + 2..]
                    .iter()
                    .take_while(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Eof))
                    .position(|t| t.kind == TokenKind::Op("="));
                if let Some(offset) = eq {
                    found = Some(i + 3 + offset);
                }
            }
            _ => {}
        }
    }

    found
}

/// Builtins whose calls evaluate to literals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Float,
    Mapping,
}

impl Builtin {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "float" => Some(Builtin::Float),
            "dict" | "OrderedDict" | "collections.OrderedDict" => Some(Builtin::Mapping),
            _ => None,
        }
    }

    /// `None` when the arguments are not literal enough to evaluate
    fn apply(self, args: Vec<Argument>) -> Result<Option<Value>, ParseError> {
        if args.iter().any(|a| a.starred) {
            return Ok(None);
        }
        match self {
            Builtin::Float => Ok(float_call(&args)),
            Builtin::Mapping => mapping_call(args),
        }
    }
}

fn float_call(args: &[Argument]) -> Option<Value> {
    match args {
        [] => Some(Value::Float(0.0)),
        [Argument {
            name: None, value, ..
        }] => match value {
            Value::Str(s) => parse_float_text(s),
            Value::Int(n) => Some(Value::Float(*n as f64)),
            Value::Float(_) | Value::Uncapped => Some(value.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn parse_float_text(s: &str) -> Option<Value> {
    let text = s.trim().to_ascii_lowercase().replace('_', "");
    match text.as_str() {
        "inf" | "+inf" | "infinity" | "+infinity" => Some(Value::Uncapped),
        "-inf" | "-infinity" => Some(Value::Float(f64::NEG_INFINITY)),
        "nan" | "+nan" | "-nan" => Some(Value::Float(f64::NAN)),
        _ => text.parse::<f64>().ok().map(Value::from_f64),
    }
}

fn mapping_call(args: Vec<Argument>) -> Result<Option<Value>, ParseError> {
    let (positional, keywords): (Vec<_>, Vec<_>) = args.into_iter().partition(|a| a.name.is_none());

    let mut dict = match positional.as_slice() {
        [] => Dict::new(),
        [Argument {
            value: Value::Dict(d),
            ..
        }] => d.clone(),
        [Argument {
            value: Value::Tuple(pairs) | Value::List(pairs),
            position,
            ..
        }] => {
            let mut dict = Dict::new();
            for pair in pairs {
                let Some([key, value]) = pair.as_sequence() else {
                    return Ok(None);
                };
                let Value::Str(key) = key else {
                    return Err(ParseError::NonStringKey {
                        position: *position,
                        found: key.kind(),
                    });
                };
                dict.insert(key.clone(), value.clone());
            }
            dict
        }
        _ => return Ok(None),
    };

    for keyword in keywords {
        if let Some(name) = keyword.name {
            dict.insert(name, keyword.value);
        }
    }

    Ok(Some(Value::Dict(dict)))
}

#[derive(Debug)]
struct Argument {
    name: Option<String>,
    value: Value,
    starred: bool,
    position: Position,
}

struct Parser<'s, 't> {
    source: &'s str,
    tokens: &'t [Token],
    pos: usize,
}

impl<'s, 't> Parser<'s, 't> {
    fn new(source: &'s str, tokens: &'t [Token], pos: usize) -> Self {
        Self {
            source,
            tokens,
            pos,
        }
    }

    fn peek(&self) -> &'t Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &'t Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if matches!(self.peek().kind, TokenKind::Op(o) if o == op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_close(&mut self, bracket: char) -> bool {
        if self.peek().kind == TokenKind::Close(bracket) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &'static str, expected: &'static str) -> Result<(), ParseError> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_close(&mut self, bracket: char, expected: &'static str) -> Result<(), ParseError> {
        if self.eat_close(bracket) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let token = self.peek();
        let found = match &token.kind {
            TokenKind::Name(n) => format!("name `{n}`"),
            TokenKind::Number(text) => format!("number `{text}`"),
            TokenKind::Str { .. } => "string literal".to_string(),
            TokenKind::Op(op) => format!("`{op}`"),
            TokenKind::Open(c) | TokenKind::Close(c) => format!("`{c}`"),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        };
        ParseError::Unexpected {
            position: token.position,
            expected,
            found,
        }
    }

    /// Source text from token `from` up to the last consumed token
    fn text(&self, from: usize) -> String {
        if self.pos <= from {
            return String::new();
        }
        let start = self.tokens[from].start;
        let end = self.tokens[self.pos - 1].end;
        self.source[start..end].to_string()
    }

    fn at_expression_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Op("," | ":" | "=" | ";")
                | TokenKind::Close(_)
                | TokenKind::Newline
                | TokenKind::Eof
        )
    }

    fn expression(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        if matches!(&self.peek().kind, TokenKind::Name(n) if n == "lambda") {
            return self.lambda(start);
        }

        let value = self.unary()?;
        if self.at_expression_end() {
            return Ok(value);
        }

        // Operators, conditionals, comprehensions: keep the source text
        while !self.at_expression_end() {
            if matches!(self.peek().kind, TokenKind::Open(_)) {
                self.skip_group()?;
            } else {
                self.advance();
            }
        }
        Ok(Value::Opaque(self.text(start)))
    }

    /// `lambda params: body`, whose parameter list may hold `,` and `=`
    fn lambda(&mut self, start: usize) -> Result<Value, ParseError> {
        self.advance();
        while !self.eat_op(":") {
            match self.peek().kind {
                TokenKind::Open(_) => self.skip_group()?,
                TokenKind::Newline | TokenKind::Eof | TokenKind::Close(_) => {
                    return Err(self.unexpected("`:`"))
                }
                _ => self.advance(),
            }
        }
        self.expression()?;
        Ok(Value::Opaque(self.text(start)))
    }

    /// The bracket at the cursor holds a comprehension
    fn comprehension_ahead(&self) -> bool {
        let mut depth = 0usize;
        for token in &self.tokens[self.pos..] {
            match &token.kind {
                TokenKind::Open(_) => depth += 1,
                TokenKind::Close(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return false;
                    }
                }
                TokenKind::Name(n) if depth == 1 && n == "for" => return true,
                TokenKind::Eof => return false,
                _ => {}
            }
        }
        false
    }

    /// Keep a whole bracketed comprehension as source text
    fn comprehension(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        self.skip_group()?;
        Ok(Value::Opaque(self.text(start)))
    }

    fn skip_group(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Open(_) => depth += 1,
                TokenKind::Close(_) => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                TokenKind::Eof => return Err(self.unexpected("closing bracket")),
                _ => {}
            }
            self.advance();
        }
    }

    fn unary(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        match self.peek().kind {
            TokenKind::Op(op @ ("-" | "+")) => {
                self.advance();
                let operand = self.unary()?;
                let value = match (op, operand) {
                    ("+", v @ (Value::Int(_) | Value::Float(_) | Value::Uncapped)) => v,
                    ("-", Value::Int(n)) => match n.checked_neg() {
                        Some(n) => Value::Int(n),
                        None => Value::Opaque(self.text(start)),
                    },
                    ("-", Value::Float(f)) => Value::Float(-f),
                    ("-", Value::Uncapped) => Value::Float(f64::NEG_INFINITY),
                    _ => Value::Opaque(self.text(start)),
                };
                Ok(value)
            }
            TokenKind::Op("~") => {
                self.advance();
                self.unary()?;
                Ok(Value::Opaque(self.text(start)))
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        if let TokenKind::Name(name) = &self.peek().kind {
            self.advance();
            return self.name_expression(start, name);
        }
        let value = self.atom()?;
        self.trailing(start, value)
    }

    /// Any attribute access, call or subscript after a literal makes it opaque
    fn trailing(&mut self, start: usize, value: Value) -> Result<Value, ParseError> {
        if self.skip_postfix_chain()? {
            Ok(Value::Opaque(self.text(start)))
        } else {
            Ok(value)
        }
    }

    fn skip_postfix_chain(&mut self) -> Result<bool, ParseError> {
        let mut skipped = false;
        loop {
            match self.peek().kind {
                TokenKind::Op(".") => {
                    self.advance();
                    if !matches!(self.peek().kind, TokenKind::Name(_)) {
                        return Err(self.unexpected("attribute name"));
                    }
                    self.advance();
                }
                TokenKind::Open('(' | '[') => self.skip_group()?,
                _ => return Ok(skipped),
            }
            skipped = true;
        }
    }

    fn name_expression(&mut self, start: usize, name: &str) -> Result<Value, ParseError> {
        let constant = match name {
            "True" => Some(Value::Bool(true)),
            "False" => Some(Value::Bool(false)),
            "None" => Some(Value::None),
            _ => None,
        };
        if let Some(value) = constant {
            return self.trailing(start, value);
        }

        let mut path = name.to_string();
        while self.peek().kind == TokenKind::Op(".") {
            let TokenKind::Name(segment) = &self.peek_at(1).kind else {
                break;
            };
            path.push('.');
            path.push_str(segment);
            self.advance();
            self.advance();
        }

        if self.peek().kind == TokenKind::Open('(') {
            if let Some(builtin) = Builtin::from_path(&path) {
                self.advance();
                let args = self.call_arguments()?;
                let value = match builtin.apply(args)? {
                    Some(value) => value,
                    None => Value::Opaque(self.text(start)),
                };
                return self.trailing(start, value);
            }
        }

        self.skip_postfix_chain()?;
        Ok(Value::Opaque(self.text(start)))
    }

    /// Arguments of a call whose `(` was consumed, through the closing `)`
    fn call_arguments(&mut self) -> Result<Vec<Argument>, ParseError> {
        let mut args = Vec::new();
        loop {
            if self.eat_close(')') {
                return Ok(args);
            }

            let position = self.peek().position;
            let starred = matches!(self.peek().kind, TokenKind::Op("*" | "**"));
            if starred {
                self.advance();
            }

            let name = match (&self.peek().kind, &self.peek_at(1).kind) {
                (TokenKind::Name(n), TokenKind::Op("=")) if !starred => {
                    self.advance();
                    self.advance();
                    Some(n.clone())
                }
                _ => None,
            };

            let value = self.expression()?;
            args.push(Argument {
                name,
                value,
                starred,
                position,
            });

            if !self.eat_op(",") {
                self.expect_close(')', "`)`")?;
                return Ok(args);
            }
        }
    }

    fn atom(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        match &self.peek().kind {
            TokenKind::Number(text) => {
                self.advance();
                Ok(number_value(text))
            }
            TokenKind::Str { .. } => Ok(self.strings(start)),
            TokenKind::Open('(') => self.parenthesized(),
            TokenKind::Open('[') => self.list(),
            TokenKind::Open('{') => self.braces(),
            TokenKind::Op("...") => {
                self.advance();
                Ok(Value::Opaque(self.text(start)))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Adjacent string literals concatenate
    fn strings(&mut self, start: usize) -> Value {
        let mut joined = String::new();
        let mut literal = true;
        while let TokenKind::Str { value, flavor } = &self.peek().kind {
            literal &= *flavor == StrFlavor::Plain;
            joined.push_str(value);
            self.advance();
        }
        if literal {
            Value::Str(joined)
        } else {
            Value::Opaque(self.text(start))
        }
    }

    fn parenthesized(&mut self) -> Result<Value, ParseError> {
        if self.comprehension_ahead() {
            return self.comprehension();
        }
        self.advance();
        if self.eat_close(')') {
            return Ok(Value::Tuple(Vec::new()));
        }

        let first = self.expression()?;
        if self.eat_close(')') {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat_op(",") {
            if self.eat_close(')') {
                return Ok(Value::Tuple(items));
            }
            items.push(self.expression()?);
        }
        self.expect_close(')', "`)` or `,`")?;
        Ok(Value::Tuple(items))
    }

    fn list(&mut self) -> Result<Value, ParseError> {
        if self.comprehension_ahead() {
            return self.comprehension();
        }
        self.advance();
        let mut items = Vec::new();
        loop {
            if self.eat_close(']') {
                break;
            }
            items.push(self.expression()?);
            if !self.eat_op(",") {
                self.expect_close(']', "`]` or `,`")?;
                break;
            }
        }
        Ok(Value::List(items))
    }

    fn braces(&mut self) -> Result<Value, ParseError> {
        if self.comprehension_ahead() {
            return self.comprehension();
        }
        let start = self.pos;
        self.advance();
        if self.eat_close('}') {
            return Ok(Value::Dict(Dict::new()));
        }

        let key_position = self.peek().position;
        let first = self.expression()?;
        if self.eat_op(":") {
            return self.dict_entries(key_position, first);
        }

        // Sets have no JSON form
        while self.eat_op(",") {
            if self.eat_close('}') {
                return Ok(Value::Opaque(self.text(start)));
            }
            self.expression()?;
        }
        self.expect_close('}', "`}` or `,`")?;
        Ok(Value::Opaque(self.text(start)))
    }

    /// Remaining dict entries after the first key and its `:`
    fn dict_entries(&mut self, first_position: Position, first_key: Value) -> Result<Value, ParseError> {
        let mut dict = Dict::new();
        let mut key_position = first_position;
        let mut key = first_key;

        loop {
            let value = self.expression()?;
            let name = match key {
                Value::Str(name) => name,
                other => {
                    return Err(ParseError::NonStringKey {
                        position: key_position,
                        found: other.kind(),
                    })
                }
            };
            dict.insert(name, value);

            if !self.eat_op(",") {
                self.expect_close('}', "`}` or `,`")?;
                break;
            }
            if self.eat_close('}') {
                break;
            }

            key_position = self.peek().position;
            key = self.expression()?;
            self.expect_op(":", "`:`")?;
        }

        Ok(Value::Dict(dict))
    }
}

fn number_value(text: &str) -> Value {
    let digits: String = text
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();

    let radix = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| digits.strip_prefix(prefix).map(|rest| (rest, radix)));

    let parsed = if let Some((rest, radix)) = radix {
        i64::from_str_radix(rest, radix).ok().map(Value::Int)
    } else if digits.ends_with('j') {
        None
    } else if digits.contains(['.', 'e']) {
        digits.parse::<f64>().ok().map(Value::from_f64)
    } else {
        digits.parse::<i64>().ok().map(Value::Int)
    };

    parsed.unwrap_or_else(|| Value::Opaque(text.to_string()))
}
