//! Built-in operators.
//!
//! Each operator type has a fallible `new` taking an explicit `Location`
//! (used by the expected-value notation) and a constructor function here
//! that captures the caller's location and panics on misuse.

mod basic;
mod logic;
mod range;
mod set;
mod shape;
mod smuggle;
mod string;

pub use basic::{Ignore, Nil, NotNil};
pub use logic::{AllOf, AnyOf, NoneOf, Not};
pub use range::{Bounds, Range};
pub use set::{SetBag, SetPolicy};
pub use shape::{ArrayEach, Empty, Len, MapOf, MapPolicy, NotEmpty, SuperStructOf};
pub use smuggle::{Code, Predicate, Smuggle, Transform};
pub use string::{Affix, Contains, Re};

use crate::context::Context;
use crate::diagnostic::{Error, MatchResult, Summary};
use crate::errors::Result;
use crate::location::Location;
use crate::value::Value;

const SEQUENCE_KINDS: &str = "slice, array or pointer to one";

#[track_caller]
fn or_panic<T>(built: Result<T>) -> T {
    match built {
        Ok(v) => v,
        Err(err) => panic!("{err}"),
    }
}

fn collect<I, T>(items: I) -> Vec<Value>
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    items.into_iter().map(Into::into).collect()
}

/// Strips interface boxes.
pub(crate) fn unboxed(got: &Value) -> &Value {
    match got {
        Value::Any(Some(inner)) => unboxed(inner),
        _ => got,
    }
}

pub(crate) fn bad_kind(ctx: &Context, got: &Value, expected: &str) -> MatchResult {
    ctx.mismatch(|| {
        Error::new("bad kind")
            .got_raw(got.type_name())
            .expected_raw(expected)
    })
}

/// Runs `f` on the elements of an array or slice, following one pointer.
/// `f` receives the context to use for per-element paths.
pub(crate) fn with_items(
    ctx: &Context,
    got: &Value,
    f: impl FnOnce(&Context, &[Value]) -> MatchResult,
) -> MatchResult {
    let got = unboxed(got);
    match got {
        Value::Ptr(None) => ctx.mismatch(|| {
            Error::new("nil pointer")
                .got_raw(format!("{}(nil)", got.type_name()))
                .expected_raw("non-nil pointer to slice or array")
        }),
        Value::Ptr(Some(cell)) => match cell.try_borrow() {
            Ok(inner) => match inner.items() {
                Some(items) => f(&ctx.add_deref(), items),
                None => bad_kind(ctx, got, SEQUENCE_KINDS),
            },
            Err(_) => ctx.mismatch(|| {
                Error::new("cannot compare").summary(Summary::text("pointee is mutably borrowed"))
            }),
        },
        _ => match got.items() {
            Some(items) => f(ctx, items),
            None => bad_kind(ctx, got, SEQUENCE_KINDS),
        },
    }
}

/// Matches anything, including nil.
#[track_caller]
pub fn ignore() -> Value {
    Value::op(Ignore::new(Location::caller("Ignore")))
}

#[track_caller]
pub fn nil() -> Value {
    Value::op(Nil::new(Location::caller("Nil")))
}

#[track_caller]
pub fn not_nil() -> Value {
    Value::op(NotNil::new(Location::caller("NotNil")))
}

/// `lo ≤ got ≤ hi`.
#[track_caller]
pub fn between(lo: impl Into<Value>, hi: impl Into<Value>) -> Value {
    between_bounds(lo, hi, Bounds::InIn)
}

#[track_caller]
pub fn between_bounds(lo: impl Into<Value>, hi: impl Into<Value>, bounds: Bounds) -> Value {
    let loc = Location::caller("Between");
    Value::op(or_panic(Range::between(lo.into(), hi.into(), bounds, loc)))
}

#[track_caller]
pub fn gt(v: impl Into<Value>) -> Value {
    Value::op(or_panic(Range::gt(v.into(), Location::caller("Gt"))))
}

#[track_caller]
pub fn gte(v: impl Into<Value>) -> Value {
    Value::op(or_panic(Range::gte(v.into(), Location::caller("Gte"))))
}

#[track_caller]
pub fn lt(v: impl Into<Value>) -> Value {
    Value::op(or_panic(Range::lt(v.into(), Location::caller("Lt"))))
}

#[track_caller]
pub fn lte(v: impl Into<Value>) -> Value {
    Value::op(or_panic(Range::lte(v.into(), Location::caller("Lte"))))
}

/// Every item must match.
#[track_caller]
pub fn all<I, T>(items: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Value::op(AllOf::new(collect(items), Location::caller("All")))
}

/// At least one item must match.
#[track_caller]
pub fn any<I, T>(items: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Value::op(AnyOf::new(collect(items), Location::caller("Any")))
}

/// No item may match.
#[track_caller]
pub fn none<I, T>(items: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Value::op(NoneOf::new(collect(items), Location::caller("None")))
}

#[track_caller]
pub fn not(item: impl Into<Value>) -> Value {
    Value::op(Not::new(item.into(), Location::caller("Not")))
}

macro_rules! set_constructors {
    ($($(#[$doc:meta])* $fn_name:ident => $name:literal, $policy:ident, $dedup:literal;)*) => {
        $(
            $(#[$doc])*
            #[track_caller]
            pub fn $fn_name<I, T>(items: I) -> Value
            where
                I: IntoIterator<Item = T>,
                T: Into<Value>,
            {
                let loc = Location::caller($name);
                Value::op(SetBag::new($name, SetPolicy::$policy, $dedup, collect(items), loc))
            }
        )*
    };
}

set_constructors! {
    /// Same items as got, duplicates ignored.
    set => "Set", All, true;
    /// Every got item is one of these.
    sub_set_of => "SubSetOf", Sub, true;
    /// Got holds at least these items.
    super_set_of => "SuperSetOf", Super, true;
    /// None of these items are in got.
    not_any => "NotAny", None, true;
    /// Same items as got, duplicates counted.
    bag => "Bag", All, false;
    sub_bag_of => "SubBagOf", Sub, false;
    super_bag_of => "SuperBagOf", Super, false;
}

/// String matching `pattern`.
#[track_caller]
pub fn re(pattern: &str) -> Value {
    Value::op(or_panic(Re::new(pattern, None, Location::caller("Re"))))
}

/// String matching `pattern` whose capture groups match `captures`.
#[track_caller]
pub fn re_captures(pattern: &str, captures: impl Into<Value>) -> Value {
    let loc = Location::caller("Re");
    Value::op(or_panic(Re::new(pattern, Some(captures.into()), loc)))
}

#[track_caller]
pub fn contains(needle: impl Into<Value>) -> Value {
    Value::op(Contains::new(needle.into(), Location::caller("Contains")))
}

#[track_caller]
pub fn has_prefix(prefix: &str) -> Value {
    Value::op(Affix::prefix(prefix, Location::caller("HasPrefix")))
}

#[track_caller]
pub fn has_suffix(suffix: &str) -> Value {
    Value::op(Affix::suffix(suffix, Location::caller("HasSuffix")))
}

/// Length equal to an integer or matching an operator.
#[track_caller]
pub fn len(expected: impl Into<Value>) -> Value {
    Value::op(or_panic(Len::new(expected.into(), Location::caller("Len"))))
}

#[track_caller]
pub fn empty() -> Value {
    Value::op(Empty::new(Location::caller("Empty")))
}

#[track_caller]
pub fn not_empty() -> Value {
    Value::op(NotEmpty::new(Location::caller("NotEmpty")))
}

#[track_caller]
pub fn array_each(expected: impl Into<Value>) -> Value {
    Value::op(ArrayEach::new(expected.into(), Location::caller("ArrayEach")))
}

macro_rules! map_constructors {
    ($($(#[$doc:meta])* $fn_name:ident => $name:literal, $policy:ident;)*) => {
        $(
            $(#[$doc])*
            #[track_caller]
            pub fn $fn_name<I, K, V>(entries: I) -> Value
            where
                I: IntoIterator<Item = (K, V)>,
                K: Into<Value>,
                V: Into<Value>,
            {
                let loc = Location::caller($name);
                let entries = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
                Value::op(or_panic(MapOf::new($name, MapPolicy::$policy, entries, loc)))
            }
        )*
    };
}

map_constructors! {
    /// Exactly these keys, values matched per key.
    map_of => "MapOf", All;
    /// Got keys are a subset of these.
    sub_map_of => "SubMapOf", Sub;
    /// Got has at least these keys.
    super_map_of => "SuperMapOf", Super;
}

/// Struct named `name` whose listed fields match; other fields are ignored.
#[track_caller]
pub fn super_struct_of<I, N>(name: &str, fields: I) -> Value
where
    I: IntoIterator<Item = (N, Value)>,
    N: Into<String>,
{
    let loc = Location::caller("SuperStructOf");
    let fields = fields.into_iter().map(|(n, v)| (n.into(), v)).collect();
    Value::op(SuperStructOf::new(name, fields, loc))
}

/// Compares `transform(got)` against `expected`.
#[track_caller]
pub fn smuggle(
    label: &str,
    transform: impl Fn(&Value) -> std::result::Result<Value, String> + 'static,
    expected: impl Into<Value>,
) -> Value {
    let loc = Location::caller("Smuggle");
    Value::op(Smuggle::new(label, std::rc::Rc::new(transform), expected.into(), loc))
}

/// Custom predicate.
#[track_caller]
pub fn code(label: &str, predicate: impl Fn(&Value) -> bool + 'static) -> Value {
    let loc = Location::caller("Code");
    let predicate: Predicate = std::rc::Rc::new(move |v: &Value| {
        if predicate(v) {
            Ok(())
        } else {
            Err(String::new())
        }
    });
    Value::op(Code::new(label, predicate, loc))
}

/// Custom predicate explaining its failures.
#[track_caller]
pub fn code_explained(
    label: &str,
    predicate: impl Fn(&Value) -> std::result::Result<(), String> + 'static,
) -> Value {
    let loc = Location::caller("Code");
    Value::op(Code::new(label, std::rc::Rc::new(predicate), loc))
}
