use std::fmt;

use crate::context::Context;
use crate::diagnostic::{Error, MatchResult};
use crate::engine::deep_equal;
use crate::location::Location;
use crate::operator::Operator;
use crate::render;
use crate::value::Value;

fn render_call(f: &mut fmt::Formatter<'_>, name: &str, items: &[Value]) -> fmt::Result {
    f.write_str(&render::call(name, &render::each(items)))
}

/// Index of the first item `got` matches, probing in yes/no mode.
fn first_match(ctx: &Context, got: &Value, items: &[Value]) -> Option<usize> {
    items
        .iter()
        .position(|item| deep_equal(&ctx.detached_boolean(), got, item).is_ok())
}

pub struct AllOf {
    items: Vec<Value>,
    location: Location,
}

impl AllOf {
    pub fn new(items: Vec<Value>, location: Location) -> Self {
        Self { items, location }
    }
}

impl fmt::Display for AllOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_call(f, "All", &self.items)
    }
}

impl Operator for AllOf {
    fn name(&self) -> &'static str {
        "All"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        let total = self.items.len();
        for (i, item) in self.items.iter().enumerate() {
            if ctx.is_boolean() {
                deep_equal(ctx, got, item)?;
                continue;
            }
            if let Err(origin) = deep_equal(&ctx.without_accumulation(), got, item) {
                return ctx.mismatch(|| {
                    Error::new(format!("compared (part {} of {total})", i + 1))
                        .got_value(got)
                        .expected_value(item)
                        .origin(origin)
                });
            }
        }
        Ok(())
    }

    fn handles_invalid(&self) -> bool {
        true
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

pub struct AnyOf {
    items: Vec<Value>,
    location: Location,
}

impl AnyOf {
    pub fn new(items: Vec<Value>, location: Location) -> Self {
        Self { items, location }
    }
}

impl fmt::Display for AnyOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_call(f, "Any", &self.items)
    }
}

impl Operator for AnyOf {
    fn name(&self) -> &'static str {
        "Any"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        if first_match(ctx, got, &self.items).is_some() {
            return Ok(());
        }
        ctx.mismatch(|| {
            Error::new("comparing with Any")
                .got_value(got)
                .expected_raw(self.to_string())
        })
    }

    fn handles_invalid(&self) -> bool {
        true
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

pub struct NoneOf {
    items: Vec<Value>,
    location: Location,
}

impl NoneOf {
    pub fn new(items: Vec<Value>, location: Location) -> Self {
        Self { items, location }
    }
}

impl fmt::Display for NoneOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_call(f, "None", &self.items)
    }
}

impl Operator for NoneOf {
    fn name(&self) -> &'static str {
        "None"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        let Some(i) = first_match(ctx, got, &self.items) else {
            return Ok(());
        };
        ctx.mismatch(|| {
            Error::new(format!(
                "comparing with None (part {} of {} is OK)",
                i + 1,
                self.items.len()
            ))
            .got_value(got)
            .expected_raw(self.to_string())
        })
    }

    fn handles_invalid(&self) -> bool {
        true
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

pub struct Not {
    item: Value,
    location: Location,
}

impl Not {
    pub fn new(item: Value, location: Location) -> Self {
        Self { item, location }
    }
}

impl fmt::Display for Not {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_call(f, "Not", std::slice::from_ref(&self.item))
    }
}

impl Operator for Not {
    fn name(&self) -> &'static str {
        "Not"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        if deep_equal(&ctx.detached_boolean(), got, &self.item).is_err() {
            return Ok(());
        }
        ctx.mismatch(|| {
            Error::new("comparing with Not")
                .got_value(got)
                .expected_raw(self.to_string())
        })
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
    use crate::operators::{all, any, between, gt, lt, nil, none, not};
    use crate::{Config, Value};

    fn first_error() -> Config {
        Config::default().with_max_errors(1)
    }

    #[test]
    fn all_needs_every_item() {
        assert!(matches(&Value::from(3), &all([gt(1), lt(5)])));
        assert!(!matches(&Value::from(6), &all([gt(1), lt(5)])));
        assert!(matches(&Value::from(3), &all(Vec::<Value>::new())));
    }

    #[test]
    fn all_wraps_the_failing_part() {
        let err = check_with(&first_error(), &Value::from(6), &all([gt(1), lt(5)])).unwrap_err();
        assert_eq!(err.message, "compared (part 2 of 2)");
        assert_eq!(err.got.as_deref(), Some("6"));
        assert_eq!(err.expected.as_deref(), Some("< 5"));
        let origin = err.origin.as_deref().unwrap();
        assert_eq!(origin.message, "values differ");
        assert_eq!(origin.path, "DATA");
        assert!(err.to_string().contains("Originates from following error:"));
    }

    #[test]
    fn any_and_none() {
        assert!(matches(&Value::from("b"), &any(["a", "b"])));
        assert!(!matches(&Value::from("c"), &any(["a", "b"])));
        assert!(!matches(&Value::from(1), &any(Vec::<Value>::new())));
        assert!(matches(&Value::Nil, &any([nil()])));

        assert!(matches(&Value::from(7), &none([between(1, 5), Value::from(9)])));
        let err = check_with(&first_error(), &Value::from(9), &none([between(1, 5), Value::from(9)]))
            .unwrap_err();
        assert_eq!(err.message, "comparing with None (part 2 of 2 is OK)");
        assert_eq!(err.expected.as_deref(), Some("None(1 ≤ got ≤ 5, 9)"));
    }

    #[test]
    fn not_inverts() {
        assert!(matches(&Value::from(1), &not(2)));
        assert!(!matches(&Value::from(2), &not(2)));
        assert!(matches(&Value::from(1), &not(nil())));
        let err = check_with(&first_error(), &Value::from(2), &not(2)).unwrap_err();
        assert_eq!(err.message, "comparing with Not");
        assert_eq!(err.expected.as_deref(), Some("Not(2)"));
    }
}
