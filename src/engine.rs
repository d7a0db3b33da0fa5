use std::rc::Rc;

use tracing::{debug, trace};

use crate::comparison::scalars_equal;
use crate::config::Config;
use crate::context::{Context, VisitKey};
use crate::diagnostic::{Error, MatchResult, Summary};
use crate::operator::Operator;
use crate::render;
use crate::value::{key_eq, Struct, Value};

// =========================
// Public API
// =========================

/// Whether `got` matches `expected`; builds no diagnostic.
pub fn matches(got: &Value, expected: &Value) -> bool {
    deep_equal(&Context::boolean(), got, expected).is_ok()
}

/// Compares with the default configuration, explaining any mismatch.
pub fn check(got: &Value, expected: &Value) -> MatchResult {
    check_with(&Config::default(), got, expected)
}

/// Compares under `config`. With an error budget above one, the returned
/// error is the head of a chain linked through `next`.
pub fn check_with(config: &Config, got: &Value, expected: &Value) -> MatchResult {
    let ctx = Context::new(config);
    let result = ctx.finish(deep_equal(&ctx, got, expected));
    debug!(
        matched = result.is_ok(),
        errors = result.as_ref().err().map_or(0, |e| e.iter().count()),
        "comparison finished"
    );
    result
}

/// Structural equality where both sides may hold operators; operators are
/// only equal to themselves.
pub(crate) fn equal_lax(a: &Value, b: &Value) -> bool {
    deep_equal(&Context::lax_boolean(), a, b).is_ok()
}

// =========================
// Engine
// =========================

/// Recursive comparison of `got` against `expected` under `ctx`.
///
/// # Panics
///
/// When `got` holds an operator outside of the internal lax mode: operators
/// only belong on the expected side.
pub fn deep_equal(ctx: &Context, got: &Value, expected: &Value) -> MatchResult {
    if let Some(max) = ctx.max_depth() {
        if ctx.depth() > max {
            return ctx.mismatch(|| {
                Error::new("maximum comparison depth exceeded")
                    .summary(Summary::text(format!("depth limit is {max}")))
            });
        }
    }

    if let Value::Op(op) = got {
        if !ctx.got_may_hold_operators() {
            panic!(
                "found operator {op} in got value at {}: operators are only allowed in expected",
                ctx.path()
            );
        }
        return match expected {
            Value::Op(e) if same_operator(op, e) => Ok(()),
            _ => ctx.mismatch(|| Error::new("values differ").got_value(got).expected_value(expected)),
        };
    }
    if let Value::Op(_) = expected {
        if ctx.got_may_hold_operators() {
            // a plain value is never the same item as an operator
            return ctx.mismatch(|| Error::new("values differ").got_value(got).expected_value(expected));
        }
    }

    if got.is_invalid() || expected.is_invalid() {
        return compare_invalid(ctx, got, expected);
    }

    if let Value::Op(op) = expected {
        return dispatch(ctx, op, got);
    }

    if !got.same_type(expected) {
        if let Value::Any(Some(inner)) = got {
            trace!(depth = ctx.depth(), "unwrapping boxed got value");
            return deep_equal(ctx, inner, expected);
        }
        return ctx.mismatch(|| {
            Error::new("type mismatch")
                .got_raw(got.type_name())
                .expected_raw(expected.type_name())
        });
    }

    if let Some(key) = visit_key(got, expected) {
        if !ctx.first_visit(key) {
            trace!(depth = ctx.depth(), "pair already under comparison, assuming equal");
            return Ok(());
        }
    }

    compare_same_type(ctx, got, expected)
}

fn same_operator(a: &Rc<dyn Operator>, b: &Rc<dyn Operator>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

fn dispatch(ctx: &Context, op: &Rc<dyn Operator>, got: &Value) -> MatchResult {
    trace!(operator = op.name(), depth = ctx.depth(), "delegating to operator");
    if ctx.is_boolean() {
        return op.match_value(ctx, got);
    }
    op.match_value(&ctx.under_operator(op.location()), got)
}

fn compare_invalid(ctx: &Context, got: &Value, expected: &Value) -> MatchResult {
    if got.is_invalid() && expected.is_invalid() {
        return Ok(());
    }
    if got.is_invalid() {
        match expected {
            Value::Op(op) if op.handles_invalid() => return dispatch(ctx, op, got),
            Value::Any(None) => return Ok(()),
            _ => {}
        }
        return ctx.mismatch(|| Error::new("values differ").got_raw("nil").expected_value(expected));
    }
    if got.is_nil_interface() {
        return Ok(());
    }
    ctx.mismatch(|| {
        let err = Error::new("values differ").expected_raw("nil");
        if got.is_nil() {
            // typed nil: show the type, it is what differs
            err.got_raw(format!("{}(nil)", got.type_name()))
        } else {
            err.got_value(got)
        }
    })
}

/// Identity pair for the reference-bearing kinds.
fn visit_key(got: &Value, expected: &Value) -> Option<VisitKey> {
    match (got, expected) {
        (Value::Slice(Some(a)), Value::Slice(Some(b))) => {
            Some(VisitKey::new(Rc::as_ptr(a) as usize, Rc::as_ptr(b) as usize, 1))
        }
        (Value::Map(Some(a)), Value::Map(Some(b))) => {
            Some(VisitKey::new(Rc::as_ptr(a) as usize, Rc::as_ptr(b) as usize, 2))
        }
        (Value::Ptr(Some(a)), Value::Ptr(Some(b))) => {
            Some(VisitKey::new(Rc::as_ptr(a) as usize, Rc::as_ptr(b) as usize, 3))
        }
        _ => None,
    }
}

fn compare_same_type(ctx: &Context, got: &Value, expected: &Value) -> MatchResult {
    match (got, expected) {
        (Value::Array(g), Value::Array(e)) => {
            for (i, (g, e)) in g.iter().zip(e.iter()).enumerate() {
                deep_equal(&ctx.add_index(i), g, e)?;
            }
            Ok(())
        }
        (Value::Slice(g), Value::Slice(e)) => match (g, e) {
            (None, None) => Ok(()),
            (Some(g), Some(e)) if Rc::ptr_eq(g, e) => Ok(()),
            (Some(g), Some(e)) => compare_sequences(ctx, g, e),
            _ => nil_mismatch(ctx, "nil slice", g.is_none()),
        },
        (Value::Map(g), Value::Map(e)) => match (g, e) {
            (None, None) => Ok(()),
            (Some(g), Some(e)) if Rc::ptr_eq(g, e) => Ok(()),
            (Some(g), Some(e)) => compare_maps(ctx, g, e),
            _ => nil_mismatch(ctx, "nil map", g.is_none()),
        },
        (Value::Ptr(g), Value::Ptr(e)) => match (g, e) {
            (None, None) => Ok(()),
            (Some(g), Some(e)) if Rc::ptr_eq(g, e) => Ok(()),
            (Some(g), Some(e)) => {
                let (Ok(g), Ok(e)) = (g.try_borrow(), e.try_borrow()) else {
                    return ctx.mismatch(|| {
                        Error::new("cannot compare")
                            .summary(Summary::text("pointee is mutably borrowed"))
                    });
                };
                deep_equal(&ctx.add_deref(), &g, &e)
            }
            _ => nil_mismatch(ctx, "nil pointer", g.is_none()),
        },
        (Value::Any(g), Value::Any(e)) => match (g, e) {
            (None, None) => Ok(()),
            (Some(g), Some(e)) => deep_equal(ctx, g, e),
            _ => nil_mismatch(ctx, "nil interface", g.is_none()),
        },
        (Value::Struct(g), Value::Struct(e)) => compare_structs(ctx, g, e),
        (Value::Func(g), Value::Func(e)) => {
            if g.is_none() && e.is_none() {
                Ok(())
            } else {
                ctx.mismatch(|| {
                    Error::new("functions mismatch").summary(Summary::text("<can not be compared>"))
                })
            }
        }
        (Value::Opaque(name), Value::Opaque(_)) => ctx.mismatch(|| {
            Error::new("cannot compare")
                .summary(Summary::text(format!("unreadable value of type {name}")))
        }),
        _ if scalars_equal(got, expected) => Ok(()),
        _ => ctx.mismatch(|| Error::new("values differ").got_value(got).expected_value(expected)),
    }
}

fn nil_mismatch(ctx: &Context, message: &'static str, got_is_nil: bool) -> MatchResult {
    let (got, expected) = if got_is_nil {
        ("nil", "not nil")
    } else {
        ("not nil", "nil")
    };
    ctx.mismatch(|| Error::new(message).got_raw(got).expected_raw(expected))
}

/// Element-wise over the common prefix, then missing/extra from the first
/// index beyond it.
fn compare_sequences(ctx: &Context, got: &[Value], expected: &[Value]) -> MatchResult {
    for (i, (g, e)) in got.iter().zip(expected.iter()).enumerate() {
        deep_equal(&ctx.add_index(i), g, e)?;
    }
    if got.len() == expected.len() {
        return Ok(());
    }
    let common = got.len().min(expected.len());
    ctx.mismatch(|| {
        Error::new(format!("comparing slices, from index #{common}")).summary(Summary::diff(
            "items",
            render::each(&expected[common..]),
            render::each(&got[common..]),
            false,
        ))
    })
}

fn compare_structs(ctx: &Context, got: &Rc<Struct>, expected: &Rc<Struct>) -> MatchResult {
    if Rc::ptr_eq(got, expected) {
        return Ok(());
    }
    if !got.same_shape(expected) {
        return ctx.mismatch(|| {
            Error::new("type mismatch")
                .got_raw(got.signature())
                .expected_raw(expected.signature())
        });
    }
    for ((name, g), (_, e)) in got.fields.iter().zip(expected.fields.iter()) {
        deep_equal(&ctx.add_field(name), g, e)?;
    }
    Ok(())
}

fn compare_maps(ctx: &Context, got: &[(Value, Value)], expected: &[(Value, Value)]) -> MatchResult {
    let mut found = vec![false; got.len()];
    let mut missing = Vec::new();
    for (key, e) in expected {
        match got.iter().position(|(k, _)| key_eq(k, key)) {
            Some(i) => {
                found[i] = true;
                deep_equal(&ctx.add_map_key(key), &got[i].1, e)?;
            }
            None => missing.push(key),
        }
    }
    if missing.is_empty() && found.iter().all(|f| *f) {
        return Ok(());
    }
    ctx.mismatch(|| {
        let extra = got
            .iter()
            .zip(found.iter())
            .filter(|(_, found)| !**found)
            .map(|((k, _), _)| render::to_string(k))
            .collect();
        let missing = missing.iter().map(|k| render::to_string(k)).collect();
        Error::new("comparing map").summary(Summary::diff("keys", missing, extra, true))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn diag(got: &Value, expected: &Value) -> Error {
        check_with(&Config::default().with_max_errors(1), got, expected).unwrap_err()
    }

    #[test]
    fn scalars() {
        assert!(matches(&Value::from(1), &Value::from(1)));
        assert!(!matches(&Value::from(1), &Value::from(2)));
        let err = diag(&Value::from(6), &Value::from("6"));
        assert_eq!(err.message, "type mismatch");
        assert_eq!(err.got.as_deref(), Some("i64"));
        assert_eq!(err.expected.as_deref(), Some("String"));
    }

    #[test]
    fn nested_path() {
        let got = Value::map([("a", Value::map([("b", Value::slice([1, 2, 3]))]))]);
        let expected = Value::map([("a", Value::map([("b", Value::slice([1, 2, 4]))]))]);
        let err = diag(&got, &expected);
        assert_eq!(
            err.to_string(),
            "DATA[\"a\"][\"b\"][2]: values differ\n\t     got: 3\n\texpected: 4"
        );
    }

    #[test]
    fn slice_length_reports_from_index() {
        let err = diag(&Value::slice([1, 2, 3, 4]), &Value::slice([1, 2]));
        assert_eq!(err.message, "comparing slices, from index #2");
        assert_eq!(err.to_string(), "DATA: comparing slices, from index #2\n\tExtra items: (3, 4)");
        let err = diag(&Value::slice([1]), &Value::slice([Value::from(1), Value::from("x")]));
        assert_eq!(err.to_string(), "DATA: comparing slices, from index #1\n\tMissing items: \"x\"");
    }

    #[test]
    fn nil_versus_empty() {
        let err = diag(&Value::nil_slice(), &Value::slice(Vec::<Value>::new()));
        assert_eq!(err.message, "nil slice");
        assert_eq!(err.got.as_deref(), Some("nil"));
        assert_eq!(err.expected.as_deref(), Some("not nil"));
        assert!(matches(&Value::nil_map(), &Value::nil_map()));
        assert!(!matches(&Value::map([(1, 1)]), &Value::nil_map()));
    }

    #[test]
    fn untyped_nil() {
        assert!(matches(&Value::Nil, &Value::Nil));
        assert!(matches(&Value::nil_any(), &Value::Nil));
        assert!(matches(&Value::Nil, &Value::nil_any()));
        let err = diag(&Value::nil_ptr(), &Value::Nil);
        assert_eq!(err.message, "values differ");
        assert_eq!(err.got.as_deref(), Some("Ptr<any>(nil)"));
        assert_eq!(err.expected.as_deref(), Some("nil"));
        let err = diag(&Value::Nil, &Value::from(3));
        assert_eq!(err.got.as_deref(), Some("nil"));
    }

    #[test]
    fn boxed_got_is_unwrapped() {
        assert!(matches(&Value::boxed(5), &Value::from(5)));
        assert!(matches(&Value::boxed(5), &Value::boxed(5)));
        assert!(!matches(&Value::from(5), &Value::boxed(5)));
    }

    #[test]
    fn pointers() {
        let p = Value::ptr(3);
        assert!(matches(&p, &p.clone()));
        assert!(matches(&Value::ptr(3), &Value::ptr(3)));
        let err = diag(&Value::ptr(3), &Value::ptr(4));
        assert_eq!(err.path, "*DATA");
        let s = |n: i64| Value::ptr(Value::structure("S", [("n", Value::from(n))]));
        assert_eq!(diag(&s(1), &s(2)).path, "DATA.n");
    }

    #[test]
    fn structs() {
        let a = Value::structure("P", [("x", Value::from(1)), ("y", Value::from(2))]);
        let b = Value::structure("P", [("x", Value::from(1)), ("y", Value::from(3))]);
        assert_eq!(diag(&a, &b).path, "DATA.y");
        let c = Value::structure("P", [("x", Value::from(1))]);
        let err = diag(&a, &c);
        assert_eq!(err.message, "type mismatch");
        assert_eq!(err.got.as_deref(), Some("P{x, y}"));
    }

    #[test]
    fn functions_and_opaques() {
        assert!(matches(&Value::Func(None), &Value::Func(None)));
        let f = Value::func(|v| v.clone());
        let err = diag(&f, &f.clone());
        assert_eq!(err.to_string(), "DATA: functions mismatch\n\t<can not be compared>");
        let err = diag(&Value::opaque("Mutex"), &Value::opaque("Mutex"));
        assert_eq!(err.message, "cannot compare");
    }

    #[test]
    fn depth_limit() {
        let deep = || Value::slice([Value::slice([Value::slice([1])])]);
        let cfg = Config::default().with_max_errors(1).with_max_depth(1);
        let err = check_with(&cfg, &deep(), &deep()).unwrap_err();
        assert_eq!(err.message, "maximum comparison depth exceeded");
        assert_eq!(err.path, "DATA[0][0]");
    }

    #[test]
    #[should_panic(expected = "operators are only allowed in expected")]
    fn operator_on_got_side_panics() {
        let op = crate::operators::ignore();
        let _ = check(&op, &Value::from(1));
    }

    #[test]
    fn lax_mode_compares_operators_by_identity() {
        let op = crate::operators::ignore();
        assert!(equal_lax(&op, &op.clone()));
        assert!(!equal_lax(&op, &crate::operators::ignore()));
        assert!(!equal_lax(&op, &Value::from(1)));
    }

    #[test]
    fn lax_mode_never_dispatches_to_expected_operator() {
        let gt0 = crate::operators::gt(0);
        assert!(!equal_lax(&Value::from(1), &gt0));
        assert!(!equal_lax(&Value::Nil, &crate::operators::nil()));
        assert!(!equal_lax(&Value::slice([1]), &Value::slice([gt0.clone()])));
        assert!(equal_lax(&Value::slice([gt0.clone()]), &Value::slice([gt0])));
    }
}
