// src/parser.rs
use crate::errors::{Result, UsageError};
use crate::value::Value;

/// Character cursor over an expected-value document.
pub struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// 1-based line of the cursor.
    pub fn line(&self) -> u32 {
        let newlines = self.s[..self.i].matches('\n').count();
        u32::try_from(newlines + 1).unwrap_or(u32::MAX)
    }

    fn column(&self) -> usize {
        let line_start = self.s[..self.i].rfind('\n').map_or(0, |p| p + 1);
        self.s[line_start..self.i].chars().count() + 1
    }

    /// Parse error located at the cursor.
    pub fn error(&self, msg: impl AsRef<str>) -> UsageError {
        UsageError::Parse(format!(
            "{} at line {}, column {}",
            msg.as_ref(),
            self.line(),
            self.column()
        ))
    }

    fn bump(&mut self, c: char) {
        self.i += c.len_utf8();
    }

    pub fn parse_identifier(&mut self) -> Result<String> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_ascii_alphanumeric() {
                self.bump(c);
            } else {
                break;
            }
        }
        if self.i == start {
            return Err(self.error("identifier expected"));
        }
        Ok(self.s[start..self.i].to_string())
    }

    fn skip_digits(&mut self) -> usize {
        let start = self.i;
        while let Some(c) = self.peek_char().filter(char::is_ascii_digit) {
            self.bump(c);
        }
        self.i - start
    }

    /// JSON number. Integers become `i64`, or `u64` when too large for it;
    /// anything with a fraction or an exponent becomes `f64`.
    pub fn parse_number_literal(&mut self) -> Result<Value> {
        let start = self.i;
        self.consume_char('-');
        if self.skip_digits() == 0 {
            return Err(self.error("number expected"));
        }
        let mut float = false;
        if self.consume_char('.') {
            float = true;
            if self.skip_digits() == 0 {
                return Err(self.error("digit expected after '.'"));
            }
        }
        if self.consume_char('e') || self.consume_char('E') {
            float = true;
            if !self.consume_char('+') {
                self.consume_char('-');
            }
            if self.skip_digits() == 0 {
                return Err(self.error("digit expected in exponent"));
            }
        }
        let s = &self.s[start..self.i];
        if float {
            return s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.error(format!("bad float {s}")));
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Value::Int(n));
        }
        s.parse::<u64>()
            .map(Value::Uint)
            .map_err(|_| self.error(format!("integer {s} out of range")))
    }

    /// `"..."` or `'...'` with JSON escapes, `\'` and `\uXXXX` included.
    pub fn parse_quoted_string(&mut self) -> Result<String> {
        let quote = match self.peek_char() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected quoted string")),
        };
        self.bump(quote);
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.bump(c);
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let Some(nc) = self.peek_char() else {
                break;
            };
            self.bump(nc);
            match nc {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                '/' => out.push('/'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                '\'' => out.push('\''),
                'u' => out.push(self.parse_unicode_escape()?),
                _ => return Err(self.error(format!("unknown escape \\{nc}"))),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let hex = self
            .s
            .get(self.i..self.i + 4)
            .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("bad \\u escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("bad \\u escape"))?;
        self.i += 4;
        Ok(code)
    }

    /// Body of `\uXXXX`, with surrogate pairs.
    fn parse_unicode_escape(&mut self) -> Result<char> {
        let high = self.parse_hex4()?;
        let code = if (0xD800..0xDC00).contains(&high) {
            if !(self.consume_char('\\') && self.consume_char('u')) {
                return Err(self.error("lone surrogate in \\u escape"));
            }
            let low = self.parse_hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(self.error("bad surrogate pair in \\u escape"));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code).ok_or_else(|| self.error("bad \\u escape"))
    }

    pub fn expect(&mut self, c: char) -> Result<()> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.bump(c);
            true
        } else {
            false
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    /// Skips whitespace and `//` line comments.
    pub fn skip_ws(&mut self) {
        loop {
            while let Some(c) = self.peek_char().filter(|c| c.is_whitespace()) {
                self.bump(c);
            }
            if !self.s[self.i..].starts_with("//") {
                return;
            }
            self.i = self.s[self.i..].find('\n').map_or(self.s.len(), |p| self.i + p);
        }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn number(s: &str) -> Value {
        Parser::new(s).parse_number_literal().unwrap()
    }

    #[test]
    fn numbers() {
        assert!(matches!(number("42"), Value::Int(42)));
        assert!(matches!(number("-7"), Value::Int(-7)));
        assert!(matches!(number("18446744073709551615"), Value::Uint(u64::MAX)));
        assert!(matches!(number("1.5"), Value::Float(f) if f == 1.5));
        assert!(matches!(number("2e3"), Value::Float(f) if f == 2000.0));
        assert!(Parser::new("-").parse_number_literal().is_err());
        assert!(Parser::new("1.").parse_number_literal().is_err());
    }

    #[test]
    fn strings() {
        let s = Parser::new(r#""a\"b\né😀""#).parse_quoted_string().unwrap();
        assert_eq!(s, "a\"b\né😀");
        let s = Parser::new(r"'it\'s'").parse_quoted_string().unwrap();
        assert_eq!(s, "it's");
        assert!(Parser::new(r#""open"#).parse_quoted_string().is_err());
    }

    #[test]
    fn tracks_lines_and_comments() {
        let mut p = Parser::new("  // note\n\n  x");
        p.skip_ws();
        assert_eq!(p.line(), 3);
        assert_eq!(p.parse_identifier().unwrap(), "x");
        assert!(p.eof());

        let mut p = Parser::new("\n  ?");
        p.skip_ws();
        assert_eq!(
            p.parse_identifier().unwrap_err().to_string(),
            "parse error: identifier expected at line 2, column 3"
        );
    }
}
