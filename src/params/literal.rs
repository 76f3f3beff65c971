//! Recursive-descent parser for loosely formatted object literals.
//!
//! Accepts a superset of JSON objects: keys may be bare identifiers or
//! single-quoted, strings may use either quote style, and a trailing comma is
//! tolerated before `}` and `]`.
//!
//! ```text
//! object := '{' (member (',' member)* ','?)? '}'
//! member := key ':' value
//! key    := identifier | string
//! value  := string | object | array | number | 'true' | 'false' | 'null'
//! array  := '[' (value (',' value)* ','?)? ']'
//! ```

use serde_json::{
    Map,
    Number,
    Value,
};
use thiserror::Error;

/// Deepest allowed nesting of objects and arrays.
const MAX_DEPTH: usize = 128;

/// Why a literal was rejected, with the byte offset where parsing stopped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at offset {offset}")]
pub(crate) struct LiteralError {
    pub(crate) offset: usize,
    pub(crate) message: String,
}

/// Parses `input` as exactly one object literal (surrounding whitespace allowed).
pub(crate) fn parse_object_literal(input: &str) -> Result<Map<String, Value>, LiteralError> {
    let mut parser = Parser { source: input, offset: 0, depth: 0 };

    parser.skip_whitespace();
    let object = parser.nested(Parser::object)?;
    parser.skip_whitespace();

    match parser.peek() {
        None => Ok(object),
        Some(c) => Err(parser.error(format!("unexpected trailing character '{c}'"))),
    }
}

/// Cursor over the literal being parsed.
struct Parser<'a> {
    /// Full input text
    source: &'a str,
    /// Byte offset of the next unread character
    offset: usize,
    /// Objects and arrays currently open
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.source.get(self.offset..).and_then(|rest| rest.chars().next())
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError { offset: self.offset, message: message.into() }
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, LiteralError>,
    ) -> Result<T, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nesting deeper than {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn object(&mut self) -> Result<Map<String, Value>, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(map);
            }

            let key = self.key()?;
            self.skip_whitespace();
            self.expect(':')?;
            self.skip_whitespace();
            let value = self.value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(map),
                Some(c) => {
                    return Err(self.error(format!("expected ',' or '}}', found '{c}'")));
                }
                None => return Err(self.error("unterminated object")),
            }
        }
    }

    fn array(&mut self) -> Result<Vec<Value>, LiteralError> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(items);
            }

            items.push(self.value()?);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => {}
                Some(']') => return Ok(items),
                Some(c) => return Err(self.error(format!("expected ',' or ']', found '{c}'"))),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn key(&mut self) -> Result<String, LiteralError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.string(quote),
            Some(c) if is_identifier_char(c) => Ok(self.identifier().to_string()),
            Some(c) => Err(self.error(format!("expected a key, found '{c}'"))),
            None => Err(self.error("expected a key, found end of input")),
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.string(quote).map(Value::String),
            Some('{') => self.nested(Self::object).map(Value::Object),
            Some('[') => self.nested(Self::array).map(Value::Array),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if is_identifier_char(c) => {
                let start = self.offset;
                match self.identifier() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    other => Err(LiteralError {
                        offset: start,
                        message: format!("unquoted value '{other}'"),
                    }),
                }
            }
            Some(c) => Err(self.error(format!("expected a value, found '{c}'"))),
            None => Err(self.error("expected a value, found end of input")),
        }
    }

    fn identifier(&mut self) -> &str {
        let start = self.offset;
        while self.peek().is_some_and(is_identifier_char) {
            self.bump();
        }
        self.source.get(start..self.offset).unwrap_or_default()
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.offset;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')) {
            self.bump();
        }
        let text = self.source.get(start..self.offset).unwrap_or_default();

        text.parse::<Number>().map(Value::Number).map_err(|_| LiteralError {
            offset: start,
            message: format!("invalid number '{text}'"),
        })
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        self.expect(quote)?;
        let mut out = String::new();

        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn escape(&mut self) -> Result<char, LiteralError> {
        match self.bump() {
            Some(c @ ('\\' | '"' | '\'' | '/')) => Ok(c),
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('b') => Ok('\u{8}'),
            Some('f') => Ok('\u{c}'),
            Some('u') => {
                let start = self.offset;
                let digits: String = (0..4).filter_map(|_| self.bump()).collect();
                u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32).ok_or(LiteralError {
                    offset: start,
                    message: format!("invalid unicode escape '\\u{digits}'"),
                })
            }
            Some(c) => Err(self.error(format!("unknown escape '\\{c}'"))),
            None => Err(self.error("unterminated escape")),
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
