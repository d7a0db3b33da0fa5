use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, UsageError};
use crate::location::Location;
use crate::value::Value;

/// File name reported for operators built from the text notation.
pub const EXPECTED_FILE: &str = "<expected>";

/// Builds an operator from arguments parsed out of the text notation.
pub trait OperatorFactory: Send + Sync {
    fn name(&self) -> &'static str;
    fn arity(&self) -> RangeInclusive<usize>;
    fn build(&self, args: Vec<Value>, location: Location) -> Result<Value>;
}

/// Thread-safe operator registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn OperatorFactory>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for factory in builtins::all() {
            registry.register(factory);
        }
        registry
    }

    /// Adds `f`, replacing any factory of the same name.
    pub fn register<F: OperatorFactory + 'static>(&mut self, f: F) {
        let mut_map = Arc::make_mut(&mut self.inner);
        mut_map.insert(f.name(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn OperatorFactory>> {
        self.inner.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.inner.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Builds operator `name` called at `line` of an expected document.
    pub fn build(&self, name: &str, args: Vec<Value>, line: u32) -> Result<Value> {
        let factory = self
            .get(name)
            .ok_or_else(|| UsageError::UnknownOperator(name.to_string()))?;
        let arity = factory.arity();
        if !arity.contains(&args.len()) {
            let expected = match (*arity.start(), *arity.end()) {
                (lo, hi) if lo == hi => lo.to_string(),
                (lo, usize::MAX) => format!("at least {lo}"),
                (lo, hi) => format!("{lo} to {hi}"),
            };
            return Err(UsageError::Arity {
                op: name.to_string(),
                expected,
                got: args.len(),
            });
        }
        debug!(operator = name, line, args = args.len(), "building operator");
        factory.build(args, Location::new(factory.name(), EXPECTED_FILE, line))
    }
}

pub mod builtins {
    use super::*;
    use crate::operators::{
        AllOf, AnyOf, ArrayEach, Bounds, Contains, Empty, Ignore, Len, MapOf, MapPolicy, Nil,
        NoneOf, Not, NotEmpty, NotNil, Range, Re, SetBag, SetPolicy, Affix,
    };
    use crate::render;

    type BuildFn = fn(Vec<Value>, Location) -> Result<Value>;

    /// Factory backed by a plain function.
    pub struct Builtin {
        name: &'static str,
        arity: RangeInclusive<usize>,
        build: BuildFn,
    }

    impl OperatorFactory for Builtin {
        fn name(&self) -> &'static str {
            self.name
        }

        fn arity(&self) -> RangeInclusive<usize> {
            self.arity.clone()
        }

        fn build(&self, args: Vec<Value>, location: Location) -> Result<Value> {
            (self.build)(args, location)
        }
    }

    const MANY: usize = usize::MAX;

    fn builtin(name: &'static str, arity: RangeInclusive<usize>, build: BuildFn) -> Builtin {
        Builtin { name, arity, build }
    }

    /// Operators reachable from the text notation. Those taking closures
    /// (`Smuggle`, `Code`) or naming Rust types (`SuperStructOf`) are not.
    pub fn all() -> Vec<Builtin> {
        vec![
            builtin("Ignore", 0..=0, |_, loc| Ok(Value::op(Ignore::new(loc)))),
            builtin("Nil", 0..=0, |_, loc| Ok(Value::op(Nil::new(loc)))),
            builtin("NotNil", 0..=0, |_, loc| Ok(Value::op(NotNil::new(loc)))),
            builtin("Empty", 0..=0, |_, loc| Ok(Value::op(Empty::new(loc)))),
            builtin("NotEmpty", 0..=0, |_, loc| Ok(Value::op(NotEmpty::new(loc)))),
            builtin("Between", 2..=3, between),
            builtin("Gt", 1..=1, |a, loc| Ok(Value::op(Range::gt(single(a), loc)?))),
            builtin("Gte", 1..=1, |a, loc| Ok(Value::op(Range::gte(single(a), loc)?))),
            builtin("Lt", 1..=1, |a, loc| Ok(Value::op(Range::lt(single(a), loc)?))),
            builtin("Lte", 1..=1, |a, loc| Ok(Value::op(Range::lte(single(a), loc)?))),
            builtin("All", 1..=MANY, |a, loc| Ok(Value::op(AllOf::new(a, loc)))),
            builtin("Any", 1..=MANY, |a, loc| Ok(Value::op(AnyOf::new(a, loc)))),
            builtin("None", 1..=MANY, |a, loc| Ok(Value::op(NoneOf::new(a, loc)))),
            builtin("Not", 1..=1, |a, loc| Ok(Value::op(Not::new(single(a), loc)))),
            builtin("Set", 0..=MANY, |a, loc| set("Set", SetPolicy::All, true, a, loc)),
            builtin("SubSetOf", 0..=MANY, |a, loc| set("SubSetOf", SetPolicy::Sub, true, a, loc)),
            builtin("SuperSetOf", 0..=MANY, |a, loc| {
                set("SuperSetOf", SetPolicy::Super, true, a, loc)
            }),
            builtin("NotAny", 0..=MANY, |a, loc| set("NotAny", SetPolicy::None, true, a, loc)),
            builtin("Bag", 0..=MANY, |a, loc| set("Bag", SetPolicy::All, false, a, loc)),
            builtin("SubBagOf", 0..=MANY, |a, loc| set("SubBagOf", SetPolicy::Sub, false, a, loc)),
            builtin("SuperBagOf", 0..=MANY, |a, loc| {
                set("SuperBagOf", SetPolicy::Super, false, a, loc)
            }),
            builtin("Re", 1..=2, re),
            builtin("Contains", 1..=1, |a, loc| Ok(Value::op(Contains::new(single(a), loc)))),
            builtin("HasPrefix", 1..=1, |a, loc| {
                let s = string_arg("HasPrefix", "STRING", &single(a))?;
                Ok(Value::op(Affix::prefix(&s, loc)))
            }),
            builtin("HasSuffix", 1..=1, |a, loc| {
                let s = string_arg("HasSuffix", "STRING", &single(a))?;
                Ok(Value::op(Affix::suffix(&s, loc)))
            }),
            builtin("Len", 1..=1, |a, loc| Ok(Value::op(Len::new(single(a), loc)?))),
            builtin("ArrayEach", 1..=1, |a, loc| Ok(Value::op(ArrayEach::new(single(a), loc)))),
            builtin("MapOf", 1..=1, |a, loc| map("MapOf", MapPolicy::All, a, loc)),
            builtin("SubMapOf", 1..=1, |a, loc| map("SubMapOf", MapPolicy::Sub, a, loc)),
            builtin("SuperMapOf", 1..=1, |a, loc| map("SuperMapOf", MapPolicy::Super, a, loc)),
        ]
    }

    /// First argument; arity was checked by the registry.
    fn single(args: Vec<Value>) -> Value {
        args.into_iter().next().unwrap_or(Value::Nil)
    }

    fn string_arg(op: &'static str, params: &'static str, v: &Value) -> Result<String> {
        v.as_str().map(str::to_string).ok_or_else(|| {
            UsageError::bad_argument(op, params, format!("expected a string, not {}", render::to_string(v)))
        })
    }

    fn between(args: Vec<Value>, loc: Location) -> Result<Value> {
        let mut args = args.into_iter();
        let lo = args.next().unwrap_or(Value::Nil);
        let hi = args.next().unwrap_or(Value::Nil);
        let bounds = match args.next() {
            None => Bounds::InIn,
            Some(b) => {
                let s = string_arg("Between", "FROM, TO[, BOUNDS]", &b)?;
                Bounds::parse(&s).ok_or_else(|| {
                    UsageError::bad_argument(
                        "Between",
                        "FROM, TO[, BOUNDS]",
                        format!("BOUNDS must be one of \"[]\", \"[[\", \"]]\" or \"][\", not {s:?}"),
                    )
                })?
            }
        };
        Ok(Value::op(Range::between(lo, hi, bounds, loc)?))
    }

    fn set(
        name: &'static str,
        policy: SetPolicy,
        dedup: bool,
        args: Vec<Value>,
        loc: Location,
    ) -> Result<Value> {
        Ok(Value::op(SetBag::new(name, policy, dedup, args, loc)))
    }

    fn re(args: Vec<Value>, loc: Location) -> Result<Value> {
        let mut args = args.into_iter();
        let pattern = string_arg("Re", "REGEXP[, CAPTURES]", &args.next().unwrap_or(Value::Nil))?;
        Ok(Value::op(Re::new(&pattern, args.next(), loc)?))
    }

    fn map(name: &'static str, policy: MapPolicy, args: Vec<Value>, loc: Location) -> Result<Value> {
        let arg = single(args);
        let Some(entries) = arg.entries() else {
            return Err(UsageError::bad_argument(
                name,
                "MAP",
                format!("expected a map, not {}", render::to_string(&arg)),
            ));
        };
        Ok(Value::op(MapOf::new(name, policy, entries.to_vec(), loc)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Always;

    impl OperatorFactory for Always {
        fn name(&self) -> &'static str {
            "Always"
        }

        fn arity(&self) -> RangeInclusive<usize> {
            0..=0
        }

        fn build(&self, _args: Vec<Value>, location: Location) -> Result<Value> {
            Ok(Value::op(crate::operators::Ignore::new(location)))
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = Registry::with_builtins();
        for name in ["Bag", "Between", "Ignore", "MapOf", "Re", "SuperSetOf"] {
            assert!(registry.get(name).is_some(), "{name} missing");
        }
        assert!(registry.get("Smuggle").is_none());
    }

    #[test]
    fn custom_factories_extend_a_clone_only() {
        let base = Registry::with_builtins();
        let mut extended = base.clone();
        extended.register(Always);
        assert!(extended.get("Always").is_some());
        assert!(base.get("Always").is_none());
        assert_eq!(extended.names().len(), base.names().len() + 1);
    }

    #[test]
    fn arity_is_checked() {
        let registry = Registry::with_builtins();
        let err = registry.build("Between", vec![Value::from(1)], 1).err().unwrap();
        assert_eq!(err.to_string(), "Between() expects 2 to 3 argument(s), got 1");
        let err = registry.build("All", vec![], 1).err().unwrap();
        assert_eq!(err.to_string(), "All() expects at least 1 argument(s), got 0");
        let err = registry.build("Frobnicate", vec![], 1).err().unwrap();
        assert_eq!(err.to_string(), "unknown operator Frobnicate()");
    }

    #[test]
    fn between_bounds_argument() {
        let registry = Registry::with_builtins();
        let op = registry
            .build("Between", vec![Value::from(1), Value::from(5), Value::from("[[")], 4)
            .unwrap();
        assert_eq!(op.to_string(), "1 ≤ got < 5");
        assert!(registry
            .build("Between", vec![Value::from(1), Value::from(5), Value::from("??")], 4)
            .is_err());
    }
}
