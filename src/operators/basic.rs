use std::fmt;

use super::unboxed;
use crate::context::Context;
use crate::diagnostic::{Error, MatchResult};
use crate::location::Location;
use crate::operator::Operator;
use crate::value::Value;

pub struct Ignore {
    location: Location,
}

impl Ignore {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl fmt::Display for Ignore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ignore()")
    }
}

impl Operator for Ignore {
    fn name(&self) -> &'static str {
        "Ignore"
    }

    fn match_value(&self, _ctx: &Context, _got: &Value) -> MatchResult {
        Ok(())
    }

    fn handles_invalid(&self) -> bool {
        true
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

/// Untyped nil, or any nil-able kind holding nil.
pub struct Nil {
    location: Location,
}

impl Nil {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl fmt::Display for Nil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("nil")
    }
}

impl Operator for Nil {
    fn name(&self) -> &'static str {
        "Nil"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        if unboxed(got).is_nil() {
            return Ok(());
        }
        ctx.mismatch(|| Error::new("non-nil").got_value(got).expected_raw("nil"))
    }

    fn handles_invalid(&self) -> bool {
        true
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

pub struct NotNil {
    location: Location,
}

impl NotNil {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl fmt::Display for NotNil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("not nil")
    }
}

impl Operator for NotNil {
    fn name(&self) -> &'static str {
        "NotNil"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        if !unboxed(got).is_nil() {
            return Ok(());
        }
        ctx.mismatch(|| Error::new("nil value").got_value(got).expected_raw("not nil"))
    }

    fn handles_invalid(&self) -> bool {
        true
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::engine::{check_with, matches};
    use crate::operators::{ignore, nil, not_nil};
    use crate::{Config, Value};

    #[test]
    fn ignore_accepts_everything() {
        for got in [Value::Nil, Value::from(1), Value::nil_ptr(), Value::slice([1, 2])] {
            assert!(matches(&got, &ignore()));
        }
    }

    #[test]
    fn nil_accepts_typed_nils() {
        assert!(matches(&Value::Nil, &nil()));
        assert!(matches(&Value::nil_ptr(), &nil()));
        assert!(matches(&Value::nil_slice(), &nil()));
        assert!(matches(&Value::boxed(Value::nil_map()), &nil()));
        assert!(!matches(&Value::from(0), &nil()));
        assert!(!matches(&Value::slice(Vec::<Value>::new()), &nil()));
    }

    #[test]
    fn not_nil_reports_nil() {
        assert!(matches(&Value::from(""), &not_nil()));
        let config = Config::default().with_max_errors(1);
        let err = check_with(&config, &Value::nil_ptr(), &not_nil()).unwrap_err();
        assert_eq!(err.message, "nil value");
        assert_eq!(err.expected.as_deref(), Some("not nil"));
        assert_eq!(err.location.as_ref().map(|l| l.func.as_ref()), Some("NotNil"));
    }
}
