//! Dynamic value model walked by the engine.
//!
//! `Value` mirrors the kinds a reflective runtime exposes: scalars, fixed
//! arrays, nil-able slices and maps, shared pointers (the only way to build
//! a cycle), boxed interface values, named structs, callables and opaque
//! values the engine cannot read back. Operators sit in the same enum so an
//! expected tree can mix plain values and matchers freely.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::operator::Operator;
use crate::render;

/// Callable stored in a `Value::Func`.
pub type Func = Rc<dyn Fn(&Value) -> Value>;

#[derive(Clone)]
pub enum Value {
    /// Untyped nil: the "invalid" value.
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    /// Fixed-size array; its length is part of its type.
    Array(Vec<Value>),
    /// `None` is a nil slice, distinct from an empty one.
    Slice(Option<Rc<Vec<Value>>>),
    /// `None` is a nil map. Entries keep insertion order.
    Map(Option<Rc<Vec<(Value, Value)>>>),
    Ptr(Option<Rc<RefCell<Value>>>),
    /// Boxed interface value; `None` is a nil interface.
    Any(Option<Box<Value>>),
    Struct(Rc<Struct>),
    Func(Option<Func>),
    /// A value of the named type whose content cannot be introspected.
    Opaque(Rc<str>),
    Op(Rc<dyn Operator>),
}

/// Named record with fields in declaration order.
#[derive(Clone)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<(String, Value)>,
}

impl Struct {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// `Name{a, b}`: the shape used to report struct type mismatches.
    pub fn signature(&self) -> String {
        let names: Vec<&str> = self.fields.iter().map(|(n, _)| n.as_str()).collect();
        format!("{}{{{}}}", self.name, names.join(", "))
    }

    pub(crate) fn same_shape(&self, other: &Struct) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|((a, _), (b, _))| a == b)
    }
}

impl Value {
    pub fn slice<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Slice(Some(Rc::new(items.into_iter().map(Into::into).collect())))
    }

    pub fn nil_slice() -> Self {
        Value::Slice(None)
    }

    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(Some(Rc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )))
    }

    pub fn nil_map() -> Self {
        Value::Map(None)
    }

    pub fn ptr(v: impl Into<Value>) -> Self {
        Value::Ptr(Some(Rc::new(RefCell::new(v.into()))))
    }

    pub fn nil_ptr() -> Self {
        Value::Ptr(None)
    }

    /// Wraps `v` in an interface box.
    pub fn boxed(v: impl Into<Value>) -> Self {
        Value::Any(Some(Box::new(v.into())))
    }

    pub fn nil_any() -> Self {
        Value::Any(None)
    }

    pub fn structure<I, N>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (N, Value)>,
        N: Into<String>,
    {
        Value::Struct(Rc::new(Struct {
            name: name.into(),
            fields: fields.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }))
    }

    pub fn func(f: impl Fn(&Value) -> Value + 'static) -> Self {
        Value::Func(Some(Rc::new(f)))
    }

    pub fn opaque(type_name: &str) -> Self {
        Value::Opaque(Rc::from(type_name))
    }

    pub fn op(op: impl Operator + 'static) -> Self {
        Value::Op(Rc::new(op))
    }

    /// The untyped nil.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_nil_interface(&self) -> bool {
        matches!(self, Value::Any(None))
    }

    /// Untyped nil or any nil-able kind holding nil.
    pub fn is_nil(&self) -> bool {
        matches!(
            self,
            Value::Nil
                | Value::Any(None)
                | Value::Ptr(None)
                | Value::Slice(None)
                | Value::Map(None)
                | Value::Func(None)
        )
    }

    pub fn as_operator(&self) -> Option<&Rc<dyn Operator>> {
        match self {
            Value::Op(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of an array or slice; a nil slice has none.
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            Value::Slice(Some(items)) => Some(items),
            Value::Slice(None) => Some(&[]),
            _ => None,
        }
    }

    pub fn entries(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(Some(entries)) => Some(entries),
            Value::Map(None) => Some(&[]),
            _ => None,
        }
    }

    /// Length of a string (in chars), array, slice or map.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Map(_) => self.entries().map(<[_]>::len),
            _ => self.items().map(<[_]>::len),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Uint(_) | Value::Float(_) | Value::Str(_)
        )
    }

    /// Rendered concrete type name.
    pub fn type_name(&self) -> Cow<'static, str> {
        match self {
            Value::Nil => Cow::Borrowed("nil"),
            Value::Bool(_) => Cow::Borrowed("bool"),
            Value::Int(_) => Cow::Borrowed("i64"),
            Value::Uint(_) => Cow::Borrowed("u64"),
            Value::Float(_) => Cow::Borrowed("f64"),
            Value::Str(_) => Cow::Borrowed("String"),
            Value::Array(items) => Cow::Owned(format!("[any; {}]", items.len())),
            Value::Slice(_) => Cow::Borrowed("Vec<any>"),
            Value::Map(_) => Cow::Borrowed("Map<any, any>"),
            Value::Ptr(_) => Cow::Borrowed("Ptr<any>"),
            Value::Any(_) => Cow::Borrowed("any"),
            Value::Struct(s) => Cow::Owned(s.name.clone()),
            Value::Func(_) => Cow::Borrowed("fn"),
            Value::Opaque(name) => Cow::Owned(name.to_string()),
            Value::Op(op) => Cow::Borrowed(op.name()),
        }
    }

    /// Same concrete type, without rendering any name.
    pub fn same_type(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.len() == b.len(),
            (Value::Struct(a), Value::Struct(b)) => a.name == b.name,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            (Value::Op(a), Value::Op(b)) => a.name() == b.name(),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// Equality used to look keys up in a map.
pub(crate) fn key_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Uint(x), Value::Uint(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| key_eq(a, b))
        }
        (Value::Struct(x), Value::Struct(y)) => {
            Rc::ptr_eq(x, y)
                || (x.name == y.name
                    && x.same_shape(y)
                    && x.fields
                        .iter()
                        .zip(y.fields.iter())
                        .all(|((_, a), (_, b))| key_eq(a, b)))
        }
        (Value::Ptr(Some(x)), Value::Ptr(Some(y))) => Rc::ptr_eq(x, y),
        (Value::Ptr(None), Value::Ptr(None)) => true,
        (Value::Any(Some(x)), Value::Any(Some(y))) => key_eq(x, y),
        (Value::Any(None), Value::Any(None)) => true,
        _ => false,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::to_string(self))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::to_string(self))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_int {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::$variant(n as $target)
            }
        })*
    };
}

from_int!(Int as i64: i8, i16, i32, i64, isize);
from_int!(Uint as u64: u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Slice(Some(Rc::new(items)))
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::slice(items),
            serde_json::Value::Object(map) => {
                Value::map(map.into_iter().map(|(k, v)| (Value::Str(k), Value::from(v))))
            }
        }
    }
}
