// src/expression.rs
//! Text notation for expected values: JSON extended with operator calls.
//!
//! ```text
//! {"id": NotNil(), "tags": Bag("a", "b"), "age": Between(18, 99)}
//! ```
//!
//! Objects become maps with string keys and arrays become slices, as for
//! JSON got values. Operators are built through a [`Registry`] and located
//! at `<expected>:<line>`.

use crate::errors::Result;
use crate::functions::Registry;
use crate::parser::Parser;
use crate::value::Value;

pub fn parse_expected(input: &str, registry: &Registry) -> Result<Value> {
    let mut p = EParser::new(input, registry);
    let value = p.parse_value()?;
    p.parser.skip_ws();
    if !p.parser.eof() {
        return Err(p.parser.error("trailing input"));
    }
    Ok(value)
}

struct EParser<'a> {
    parser: Parser<'a>,
    registry: &'a Registry,
}

impl<'a> EParser<'a> {
    fn new(s: &'a str, registry: &'a Registry) -> Self {
        Self {
            parser: Parser::new(s),
            registry,
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.parser.skip_ws();
        match self.parser.peek_char() {
            Some('"' | '\'') => Ok(Value::Str(self.parser.parse_quoted_string()?)),
            Some('[') => self.parse_array(),
            Some('{') => self.parse_object(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parser.parse_number_literal(),
            Some(c) if c == '_' || c.is_ascii_alphabetic() => self.parse_word(),
            Some(c) => Err(self.parser.error(format!("unexpected '{c}'"))),
            None => Err(self.parser.error("unexpected end of input")),
        }
    }

    /// Comma separated values up to `close`; a trailing comma is accepted.
    fn parse_list(&mut self, close: char) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        loop {
            self.parser.skip_ws();
            if self.parser.consume_char(close) {
                return Ok(out);
            }
            out.push(self.parse_value()?);
            self.parser.skip_ws();
            if !self.parser.consume_char(',') {
                self.parser.expect(close)?;
                return Ok(out);
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.parser.expect('[')?;
        Ok(Value::slice(self.parse_list(']')?))
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.parser.expect('{')?;
        let mut entries: Vec<(Value, Value)> = Vec::new();
        loop {
            self.parser.skip_ws();
            if self.parser.consume_char('}') {
                break;
            }
            let key = self.parser.parse_quoted_string()?;
            if entries.iter().any(|(k, _)| k.as_str() == Some(key.as_str())) {
                return Err(self.parser.error(format!("duplicate key {key:?}")));
            }
            self.parser.skip_ws();
            self.parser.expect(':')?;
            let value = self.parse_value()?;
            entries.push((Value::Str(key), value));
            self.parser.skip_ws();
            if !self.parser.consume_char(',') {
                self.parser.expect('}')?;
                break;
            }
        }
        Ok(Value::map(entries))
    }

    /// `null`, `true`, `false` or an operator call.
    fn parse_word(&mut self) -> Result<Value> {
        let line = self.parser.line();
        let word = self.parser.parse_identifier()?;
        match word.as_str() {
            "null" => return Ok(Value::Nil),
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            _ => {}
        }
        self.parser.skip_ws();
        self.parser.expect('(')?;
        let args = self.parse_list(')')?;
        self.registry.build(&word, args, line)
    }
}
