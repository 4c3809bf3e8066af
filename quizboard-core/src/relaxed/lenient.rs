//! Lenient parser for near-JSON text.
//!
//! Accepts the sloppy object-literal syntax models tend to emit when they
//! "almost" produce JSON: unquoted keys, single-quoted strings, trailing
//! commas, `//` and `/* */` comments, `undefined`, and a leading `+` on
//! numbers. Nothing is ever evaluated; the input is only parsed.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Maximum nesting depth accepted before giving up.
const MAX_DEPTH: usize = 128;

/// Error from lenient parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("lenient parse error at byte {position}: {message}")]
pub struct LenientError {
    pub position: usize,
    pub message: String,
}

/// Parse a near-JSON document into a `serde_json::Value`.
pub fn parse(input: &str) -> Result<Value, LenientError> {
    let mut parser = Parser { src: input, pos: 0 };
    let value = parser.parse_value(0)?;
    parser.skip_trivia()?;
    // A stray statement terminator is harmless
    if parser.peek() == Some(';') {
        parser.bump();
        parser.skip_trivia()?;
    }
    if parser.pos < parser.src.len() {
        return Err(parser.error("unexpected trailing content"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> LenientError {
        LenientError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LenientError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), LenientError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    self.pos += 2;
                    match self.src[self.pos..].find("*/") {
                        Some(end) => self.pos += end + 2,
                        None => return Err(self.error("unterminated block comment")),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, LenientError> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.parse_object(depth),
            Some('[') => self.parse_array(depth),
            Some(q @ ('"' | '\'')) => Ok(Value::String(self.parse_string(q)?)),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_identifier_start(c) => self.parse_keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_object(&mut self, depth: usize) -> Result<Value, LenientError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                None => return Err(self.error("unterminated object")),
                _ => {}
            }

            let key = self.parse_key()?;
            self.skip_trivia()?;
            self.expect(':')?;
            let value = self.parse_value(depth + 1)?;
            map.insert(key, value);

            self.skip_trivia()?;
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(map)),
                Some(c) => return Err(self.error(format!("expected ',' or '}}', found '{c}'"))),
                None => return Err(self.error("unterminated object")),
            }
        }
    }

    fn parse_key(&mut self) -> Result<String, LenientError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => self.parse_string(q),
            Some(c) if is_identifier_start(c) || c.is_ascii_digit() => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if is_identifier_part(c) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(self.src[start..self.pos].to_string())
            }
            Some(c) => Err(self.error(format!("invalid object key start '{c}'"))),
            None => Err(self.error("unexpected end of input in object key")),
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value, LenientError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(items));
                }
                None => return Err(self.error("unterminated array")),
                _ => {}
            }

            items.push(self.parse_value(depth + 1)?);

            self.skip_trivia()?;
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(Value::Array(items)),
                Some(c) => return Err(self.error(format!("expected ',' or ']', found '{c}'"))),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, LenientError> {
        self.expect(quote)?;
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("unterminated string"));
            };
            match c {
                c if c == quote => return Ok(out),
                '\\' => {
                    let Some(escaped) = self.bump() else {
                        return Err(self.error("unterminated escape"));
                    };
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'b' => out.push('\u{0008}'),
                        'f' => out.push('\u{000C}'),
                        '0' => out.push('\0'),
                        'u' => out.push(self.parse_unicode_escape()?),
                        // Line continuation
                        '\n' => {}
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn parse_hex4(&mut self) -> Result<u32, LenientError> {
        let end = self.pos + 4;
        let digits = self
            .src
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated unicode escape"))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.error(format!("invalid unicode escape '{digits}'")));
        }
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| self.error(format!("invalid unicode escape '{digits}'")))?;
        self.pos = end;
        Ok(code)
    }

    fn parse_unicode_escape(&mut self) -> Result<char, LenientError> {
        let high = self.parse_hex4()?;
        if (0xD800..0xDC00).contains(&high) && self.src[self.pos..].starts_with("\\u") {
            let save = self.pos;
            self.pos += 2;
            let low = self.parse_hex4()?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code).ok_or_else(|| self.error("invalid surrogate pair"));
            }
            self.pos = save;
        }
        Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn parse_number(&mut self) -> Result<Value, LenientError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };

        if self.src[self.pos..].starts_with("0x") || self.src[self.pos..].starts_with("0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.bump();
            }
            let magnitude = i64::from_str_radix(&self.src[digits_start..self.pos], 16)
                .map_err(|_| self.error("invalid hex literal"))?;
            return Ok(Value::Number(Number::from(if negative {
                -magnitude
            } else {
                magnitude
            })));
        }

        if self.src[self.pos..].starts_with("Infinity") {
            return Err(self.error("non-finite numbers are not representable"));
        }

        let digits_start = self.pos;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.bump();
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }

        let literal = &self.src[digits_start..self.pos];
        if literal.is_empty() || literal == "." {
            self.pos = start;
            return Err(self.error("invalid number"));
        }

        if !is_float {
            if let Ok(magnitude) = literal.parse::<i64>() {
                return Ok(Value::Number(Number::from(if negative {
                    -magnitude
                } else {
                    magnitude
                })));
            }
        }

        let magnitude: f64 = literal
            .parse()
            .map_err(|_| self.error(format!("invalid number '{literal}'")))?;
        let number = if negative { -magnitude } else { magnitude };
        Number::from_f64(number)
            .map(Value::Number)
            .ok_or_else(|| self.error("non-finite number"))
    }

    fn parse_keyword(&mut self) -> Result<Value, LenientError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_identifier_part(c) {
                self.bump();
            } else {
                break;
            }
        }
        match &self.src[start..self.pos] {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" | "undefined" => Ok(Value::Null),
            other => {
                let message = format!("unknown identifier '{other}'");
                self.pos = start;
                Err(self.error(message))
            }
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
