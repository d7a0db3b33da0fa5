use std::fmt;

use regex::Regex;

use super::{bad_kind, unboxed};
use crate::context::Context;
use crate::diagnostic::{Error, MatchResult};
use crate::engine::deep_equal;
use crate::errors::{Result, UsageError};
use crate::location::Location;
use crate::operator::Operator;
use crate::render;
use crate::value::Value;

/// Regexp match, optionally checking capture groups.
pub struct Re {
    regex: Regex,
    captures: Option<Value>,
    location: Location,
}

impl Re {
    /// `captures` must be a sequence or an operator; it is compared against
    /// the groups of the first match as a `Vec<any>` of strings (nil for a
    /// group that did not participate).
    pub fn new(pattern: &str, captures: Option<Value>, location: Location) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| UsageError::Regex {
            pattern: pattern.to_string(),
            source,
        })?;
        if let Some(c) = &captures {
            if c.items().is_none() && c.as_operator().is_none() {
                return Err(UsageError::bad_argument(
                    "ReCaptures",
                    "REGEXP, CAPTURES",
                    format!("CAPTURES must be a slice, an array or an operator, not {}", c.type_name()),
                ));
            }
        }
        Ok(Self {
            regex,
            captures,
            location,
        })
    }

    fn slashed(&self) -> String {
        format!("/{}/", self.regex.as_str())
    }
}

impl fmt::Display for Re {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.captures {
            None => f.write_str(&self.slashed()),
            Some(c) => f.write_str(&render::call("Re", &[self.slashed(), render::to_string(c)])),
        }
    }
}

impl Operator for Re {
    fn name(&self) -> &'static str {
        "Re"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        let Some(s) = unboxed(got).as_str() else {
            return bad_kind(ctx, got, "String");
        };
        let no_match = || {
            ctx.mismatch(|| {
                Error::new("does not match regexp")
                    .got_value(got)
                    .expected_raw(self.slashed())
            })
        };
        let Some(expected) = &self.captures else {
            return if self.regex.is_match(s) { Ok(()) } else { no_match() };
        };
        let Some(caps) = self.regex.captures(s) else {
            return no_match();
        };
        let groups = Value::slice(
            caps.iter()
                .skip(1)
                .map(|m| m.map_or(Value::Nil, |m| Value::from(m.as_str()))),
        );
        deep_equal(&ctx.add_function_call("captures"), &groups, expected)
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

/// Substring of a string, or element of a sequence or map values.
pub struct Contains {
    needle: Value,
    location: Location,
}

impl Contains {
    pub fn new(needle: Value, location: Location) -> Self {
        Self { needle, location }
    }

    fn holds(&self, ctx: &Context, items: impl IntoIterator<Item = Value>) -> bool {
        items
            .into_iter()
            .any(|item| deep_equal(&ctx.detached_boolean(), &item, &self.needle).is_ok())
    }

    fn check(&self, ctx: &Context, got: &Value) -> Option<bool> {
        match unboxed(got) {
            Value::Str(s) => Some(match &self.needle {
                Value::Str(n) => s.contains(n.as_str()),
                // an operator is tried on each char
                Value::Op(_) => self.holds(ctx, s.chars().map(|c| Value::from(c.to_string()))),
                _ => false,
            }),
            Value::Map(_) => {
                let entries = unboxed(got).entries()?;
                Some(self.holds(ctx, entries.iter().map(|(_, v)| v.clone())))
            }
            Value::Ptr(Some(cell)) => {
                let inner = cell.try_borrow().ok()?;
                self.check(ctx, &inner)
            }
            other => other
                .items()
                .map(|items| self.holds(ctx, items.iter().cloned())),
        }
    }
}

impl fmt::Display for Contains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::call("Contains", &[render::to_string(&self.needle)]))
    }
}

impl Operator for Contains {
    fn name(&self) -> &'static str {
        "Contains"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        match self.check(ctx, got) {
            Some(true) => Ok(()),
            Some(false) => ctx.mismatch(|| {
                Error::new("does not contain")
                    .got_value(got)
                    .expected_raw(self.to_string())
            }),
            None => bad_kind(ctx, unboxed(got), "String, slice, array, map or pointer to one"),
        }
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

/// `HasPrefix` and `HasSuffix`.
pub struct Affix {
    prefix: bool,
    affix: String,
    location: Location,
}

impl Affix {
    pub fn prefix(prefix: &str, location: Location) -> Self {
        Self {
            prefix: true,
            affix: prefix.to_string(),
            location,
        }
    }

    pub fn suffix(suffix: &str, location: Location) -> Self {
        Self {
            prefix: false,
            affix: suffix.to_string(),
            location,
        }
    }
}

impl fmt::Display for Affix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.name(), self.affix)
    }
}

impl Operator for Affix {
    fn name(&self) -> &'static str {
        if self.prefix {
            "HasPrefix"
        } else {
            "HasSuffix"
        }
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        let Some(s) = unboxed(got).as_str() else {
            return bad_kind(ctx, got, "String");
        };
        let ok = if self.prefix {
            s.starts_with(&self.affix)
        } else {
            s.ends_with(&self.affix)
        };
        if ok {
            return Ok(());
        }
        ctx.mismatch(|| {
            let what = if self.prefix { "has not prefix" } else { "has not suffix" };
            Error::new(what).got_value(got).expected_raw(self.to_string())
        })
    }

    fn location(&self) -> &Location {
        &self.location
    }
}
