use std::fmt;

use super::{bad_kind, unboxed, with_items};
use crate::context::Context;
use crate::diagnostic::{Error, MatchResult, Summary};
use crate::engine::deep_equal;
use crate::errors::{Result, UsageError};
use crate::location::Location;
use crate::operator::Operator;
use crate::render;
use crate::value::{key_eq, Value};

/// Length of a string, sequence or map, following pointers.
fn length_of(got: &Value) -> Option<usize> {
    match unboxed(got) {
        Value::Ptr(Some(cell)) => cell.try_borrow().ok().and_then(|inner| length_of(&inner)),
        other => other.len(),
    }
}

pub struct Len {
    expected: Value,
    location: Location,
}

impl Len {
    /// `expected` is a non-negative integer or an operator.
    pub fn new(expected: Value, location: Location) -> Result<Self> {
        let expected = match expected {
            Value::Int(n) if n >= 0 => Value::Int(n),
            Value::Uint(n) => i64::try_from(n).map(Value::Int).map_err(|_| {
                UsageError::bad_argument("Len", "INT|OPERATOR", format!("{n} is out of range"))
            })?,
            op @ Value::Op(_) => op,
            other => {
                return Err(UsageError::bad_argument(
                    "Len",
                    "INT|OPERATOR",
                    format!("expected a non-negative integer or an operator, not {}", render::to_string(&other)),
                ))
            }
        };
        Ok(Self { expected, location })
    }
}

impl fmt::Display for Len {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expected {
            Value::Op(op) => write!(f, "len: {op}"),
            n => write!(f, "len={}", render::to_string(n)),
        }
    }
}

impl Operator for Len {
    fn name(&self) -> &'static str {
        "Len"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        let Some(n) = length_of(got) else {
            return bad_kind(ctx, unboxed(got), "String, slice, array or map");
        };
        let n = Value::Int(i64::try_from(n).unwrap_or(i64::MAX));
        deep_equal(&ctx.add_function_call("len"), &n, &self.expected)
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

/// Nil, or a zero-length string, sequence or map, following pointers.
fn is_empty(got: &Value) -> bool {
    match unboxed(got) {
        Value::Ptr(Some(cell)) => cell.try_borrow().map(|inner| is_empty(&inner)).unwrap_or(false),
        v if v.is_nil() => true,
        v => v.len() == Some(0),
    }
}

pub struct Empty {
    location: Location,
}

impl Empty {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl fmt::Display for Empty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("empty")
    }
}

impl Operator for Empty {
    fn name(&self) -> &'static str {
        "Empty"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        if is_empty(got) {
            return Ok(());
        }
        ctx.mismatch(|| Error::new("not empty").got_value(got).expected_raw("empty"))
    }

    fn handles_invalid(&self) -> bool {
        true
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

pub struct NotEmpty {
    location: Location,
}

impl NotEmpty {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl fmt::Display for NotEmpty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("not empty")
    }
}

impl Operator for NotEmpty {
    fn name(&self) -> &'static str {
        "NotEmpty"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        // scalars have no notion of emptiness
        if length_of(got).is_some() && !is_empty(got) {
            return Ok(());
        }
        ctx.mismatch(|| Error::new("empty").got_value(got).expected_raw("not empty"))
    }

    fn handles_invalid(&self) -> bool {
        true
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

/// Every element matches the same expected value.
pub struct ArrayEach {
    expected: Value,
    location: Location,
}

impl ArrayEach {
    pub fn new(expected: Value, location: Location) -> Self {
        Self { expected, location }
    }
}

impl fmt::Display for ArrayEach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::call("ArrayEach", &[render::to_string(&self.expected)]))
    }
}

impl Operator for ArrayEach {
    fn name(&self) -> &'static str {
        "ArrayEach"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        with_items(ctx, got, |ctx, items| {
            for (i, item) in items.iter().enumerate() {
                deep_equal(&ctx.add_index(i), item, &self.expected)?;
            }
            Ok(())
        })
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPolicy {
    All,
    /// Got keys must all be expected; expected keys may be missing.
    Sub,
    /// Expected keys must all be present; got may hold more.
    Super,
}

/// Per-key map matching with a tolerance for missing or extra keys.
pub struct MapOf {
    name: &'static str,
    policy: MapPolicy,
    entries: Vec<(Value, Value)>,
    location: Location,
}

impl MapOf {
    /// Keys are plain values; operators are only allowed as values.
    pub fn new(
        name: &'static str,
        policy: MapPolicy,
        entries: Vec<(Value, Value)>,
        location: Location,
    ) -> Result<Self> {
        if let Some((k, _)) = entries.iter().find(|(k, _)| k.as_operator().is_some()) {
            return Err(UsageError::bad_argument(
                name,
                "MAP",
                format!("operator {} cannot be used as a key", render::to_string(k)),
            ));
        }
        Ok(Self {
            name,
            policy,
            entries,
            location,
        })
    }
}

impl fmt::Display for MapOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self
            .entries
            .iter()
            .map(|(k, v)| format!("{}: {}", render::to_string(k), render::to_string(v)))
            .collect();
        f.write_str(&render::call(self.name, &args))
    }
}

impl Operator for MapOf {
    fn name(&self) -> &'static str {
        self.name
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        let Some(got_entries) = unboxed(got).entries() else {
            return bad_kind(ctx, unboxed(got), "map");
        };

        let mut seen = vec![false; got_entries.len()];
        let mut missing = Vec::new();
        for (key, expected) in &self.entries {
            match got_entries.iter().position(|(k, _)| key_eq(k, key)) {
                Some(i) => {
                    seen[i] = true;
                    deep_equal(&ctx.add_map_key(key), &got_entries[i].1, expected)?;
                }
                None => missing.push(key),
            }
        }
        let extra: Vec<&Value> = got_entries
            .iter()
            .zip(seen.iter())
            .filter(|(_, &s)| !s)
            .map(|((k, _), _)| k)
            .collect();

        let (missing, extra) = match self.policy {
            MapPolicy::All => (missing, extra),
            MapPolicy::Sub => (Vec::new(), extra),
            MapPolicy::Super => (missing, Vec::new()),
        };
        if missing.is_empty() && extra.is_empty() {
            return Ok(());
        }
        ctx.mismatch(|| {
            let keys = |ks: Vec<&Value>| -> Vec<String> { ks.into_iter().map(render::to_string).collect() };
            Error::new(format!("comparing map keys of %% with {}", self.name))
                .summary(Summary::diff("keys", keys(missing), keys(extra), true))
        })
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

/// Named struct whose listed fields match; unlisted fields are ignored.
pub struct SuperStructOf {
    name: String,
    fields: Vec<(String, Value)>,
    location: Location,
}

impl SuperStructOf {
    pub fn new(name: &str, fields: Vec<(String, Value)>, location: Location) -> Self {
        Self {
            name: name.to_string(),
            fields,
            location,
        }
    }
}

impl fmt::Display for SuperStructOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut args = vec![self.name.clone()];
        args.extend(
            self.fields
                .iter()
                .map(|(n, v)| format!("{n}: {}", render::to_string(v))),
        );
        f.write_str(&render::call("SuperStructOf", &args))
    }
}

impl Operator for SuperStructOf {
    fn name(&self) -> &'static str {
        "SuperStructOf"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        let Value::Struct(s) = unboxed(got) else {
            return bad_kind(ctx, unboxed(got), &format!("struct {}", self.name));
        };
        if s.name != self.name {
            return ctx.mismatch(|| {
                Error::new("type mismatch")
                    .got_raw(s.name.clone())
                    .expected_raw(self.name.clone())
            });
        }
        for (field, expected) in &self.fields {
            match s.field(field) {
                Some(v) => deep_equal(&ctx.add_field(field), v, expected)?,
                None => ctx.mismatch(|| {
                    Error::new("field not found")
                        .got_raw(s.signature())
                        .expected_raw(format!("field {field}"))
                })?,
            }
        }
        Ok(())
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::engine::{check_with, matches};
    use crate::operators::{
        array_each, between, empty, gt, len, map_of, not_empty, sub_map_of, super_map_of,
        super_struct_of,
    };
    use crate::{Config, Value};

    fn first_error() -> Config {
        Config::default().with_max_errors(1)
    }

    #[test]
    fn len_of_everything_sized() {
        assert!(matches(&Value::from("héhé"), &len(4)));
        assert!(matches(&Value::slice([1, 2, 3]), &len(3)));
        assert!(matches(&Value::map([("a", 1)]), &len(between(1, 3))));
        assert!(matches(&Value::nil_slice(), &len(0)));
        assert!(matches(&Value::ptr(Value::slice([1])), &len(1u8)));

        let err = check_with(&first_error(), &Value::slice([1, 2]), &len(3)).unwrap_err();
        assert_eq!(err.path, "len(DATA)");
        assert_eq!(err.got.as_deref(), Some("2"));
        assert_eq!(err.expected.as_deref(), Some("3"));

        let err = check_with(&first_error(), &Value::from(1), &len(3)).unwrap_err();
        assert_eq!(err.message, "bad kind");
    }

    #[test]
    #[should_panic(expected = "usage: Len(INT|OPERATOR)")]
    fn len_rejects_negative() {
        len(-1);
    }

    #[test]
    fn emptiness() {
        assert!(matches(&Value::Nil, &empty()));
        assert!(matches(&Value::from(""), &empty()));
        assert!(matches(&Value::ptr(Value::slice(Vec::<Value>::new())), &empty()));
        assert!(!matches(&Value::slice([1]), &empty()));

        assert!(matches(&Value::slice([1]), &not_empty()));
        assert!(!matches(&Value::Nil, &not_empty()));
        assert!(!matches(&Value::nil_map(), &not_empty()));
        assert!(!matches(&Value::from(3), &not_empty()));
    }

    #[test]
    fn array_each_reports_element_paths() {
        assert!(matches(&Value::slice([2, 3]), &array_each(gt(1))));
        let err = check_with(&first_error(), &Value::slice([2, 0, 3]), &array_each(gt(1))).unwrap_err();
        assert_eq!(err.path, "DATA[1]");
        let err = check_with(&first_error(), &Value::ptr(Value::slice([0])), &array_each(gt(1)))
            .unwrap_err();
        assert_eq!(err.path, "(*DATA)[0]");
    }

    #[test]
    fn map_policies() {
        let got = Value::map([("a", 1), ("b", 2)]);
        assert!(matches(&got, &map_of([("a", gt(0)), ("b", Value::from(2))])));
        assert!(matches(&got, &super_map_of([("a", 1)])));
        assert!(!matches(&got, &map_of([("a", 1)])));
        assert!(matches(&got, &sub_map_of([("a", 1), ("b", 2), ("c", 3)])));
        assert!(!matches(&got, &sub_map_of([("a", 1)])));

        let err = check_with(&first_error(), &got, &super_map_of([("a", 1), ("z", 0)])).unwrap_err();
        assert_eq!(err.headline(), "comparing map keys of DATA with SuperMapOf");
        assert_eq!(err.summary.unwrap().to_string(), r#"Missing keys: "z""#);

        let err = check_with(&first_error(), &got, &map_of([("a", 2), ("b", 2)])).unwrap_err();
        assert_eq!(err.path, r#"DATA["a"]"#);
    }

    #[test]
    fn super_struct_ignores_other_fields() {
        let got = Value::structure("Person", [("name", Value::from("Bob")), ("age", Value::from(42))]);
        assert!(matches(&got, &super_struct_of("Person", [("age", gt(40))])));
        assert!(!matches(&got, &super_struct_of("Animal", [("age", gt(40))])));

        let err = check_with(&first_error(), &got, &super_struct_of("Person", [("age", gt(50))]))
            .unwrap_err();
        assert_eq!(err.path, "DATA.age");

        let err = check_with(&first_error(), &got, &super_struct_of("Person", [("size", gt(1))]))
            .unwrap_err();
        assert_eq!(err.message, "field not found");
    }
}
