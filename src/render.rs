//! Value stringification used in diagnostics.

use std::collections::HashSet;
use std::rc::Rc;

use itertools::Itertools;

use crate::value::Value;

/// Above this width a composite rendering switches to one item per line.
const INLINE_WIDTH: usize = 80;

/// Renders `v` on a single line when possible. Pointer cycles render as
/// `<cycle>` instead of recursing forever.
pub fn to_string(v: &Value) -> String {
    let mut seen = HashSet::new();
    let mut out = String::new();
    write_value(&mut out, v, &mut seen);
    out
}

fn write_value(out: &mut String, v: &Value, seen: &mut HashSet<usize>) {
    match v {
        Value::Nil => out.push_str("nil"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Uint(n) => out.push_str(&n.to_string()),
        Value::Float(f) => out.push_str(&format!("{f:?}")),
        Value::Str(s) => out.push_str(&format!("{s:?}")),
        Value::Array(items) => write_items(out, "[", items, "]", seen),
        Value::Slice(Some(items)) => write_items(out, "[", items, "]", seen),
        Value::Map(Some(entries)) => {
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, k, seen);
                out.push_str(": ");
                write_value(out, v, seen);
            }
            out.push('}');
        }
        Value::Ptr(Some(cell)) => {
            let addr = Rc::as_ptr(cell) as usize;
            if !seen.insert(addr) {
                out.push_str("<cycle>");
                return;
            }
            out.push('&');
            match cell.try_borrow() {
                Ok(inner) => write_value(out, &inner, seen),
                Err(_) => out.push_str("<borrowed>"),
            }
            seen.remove(&addr);
        }
        Value::Any(Some(inner)) => write_value(out, inner, seen),
        Value::Struct(s) => {
            out.push_str(&s.name);
            out.push('{');
            for (i, (name, v)) in s.fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(name);
                out.push_str(": ");
                write_value(out, v, seen);
            }
            out.push('}');
        }
        Value::Func(Some(_)) => out.push_str("fn(..)"),
        Value::Opaque(name) => {
            out.push_str("<opaque ");
            out.push_str(name);
            out.push('>');
        }
        Value::Op(op) => out.push_str(&op.to_string()),
        Value::Slice(None) | Value::Map(None) | Value::Ptr(None) | Value::Any(None) | Value::Func(None) => {
            out.push_str("nil")
        }
    }
}

fn write_items(out: &mut String, open: &str, items: &[Value], close: &str, seen: &mut HashSet<usize>) {
    out.push_str(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_value(out, item, seen);
    }
    out.push_str(close);
}

/// True when a rendering spans several lines, so composites must switch to
/// block layout.
pub fn is_multiline(s: &str) -> bool {
    s.contains('\n')
}

/// Prefixes every line after the first with `prefix`.
pub fn indent(s: &str, prefix: &str) -> String {
    s.replace('\n', &format!("\n{prefix}"))
}

/// `Name(a, b)` inline, or one argument per line when an argument is
/// multi-line or the whole call would be too wide.
pub fn call(name: &str, args: &[String]) -> String {
    let inline = format!("{name}({})", args.iter().join(", "));
    if args.iter().any(|a| is_multiline(a)) || inline.len() > INLINE_WIDTH {
        let body = args.iter().map(|a| format!("  {}", indent(a, "  "))).join(",\n");
        format!("{name}(\n{body}\n)")
    } else {
        inline
    }
}

/// `x` for a single item, `(x, y)` or a block for several.
pub fn list(items: &[String]) -> String {
    match items {
        [one] => one.clone(),
        _ => {
            let inline = format!("({})", items.iter().join(", "));
            if items.iter().any(|i| is_multiline(i)) || inline.len() > INLINE_WIDTH {
                let body = items.iter().map(|i| format!("  {}", indent(i, "  "))).join(",\n");
                format!("(\n{body}\n)")
            } else {
                inline
            }
        }
    }
}

/// Renders each value, one string per item.
pub fn each(values: &[Value]) -> Vec<String> {
    values.iter().map(to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scalars_and_containers() {
        let v = Value::map([
            ("a", Value::slice([1, 2])),
            ("b", Value::from("x\"y")),
            ("c", Value::from(1.0)),
        ]);
        assert_eq!(to_string(&v), r#"{"a": [1, 2], "b": "x\"y", "c": 1.0}"#);
        assert_eq!(to_string(&Value::nil_slice()), "nil");
        assert_eq!(
            to_string(&Value::structure("P", [("x", Value::ptr(3))])),
            "P{x: &3}"
        );
    }

    #[test]
    fn cycles_are_cut() {
        let p = Value::nil_ptr();
        let cell = Rc::new(std::cell::RefCell::new(Value::Nil));
        let node = Value::structure("Node", [("next", Value::Ptr(Some(cell.clone())))]);
        *cell.borrow_mut() = node;
        assert_eq!(to_string(&Value::Ptr(Some(cell))), "&Node{next: <cycle>}");
        assert_eq!(to_string(&p), "nil");
    }

    #[test]
    fn call_layout() {
        assert_eq!(call("Bag", &["1".into(), "2".into()]), "Bag(1, 2)");
        assert_eq!(
            call("All", &["Bag(\n  1\n)".into(), "2".into()]),
            "All(\n  Bag(\n    1\n  ),\n  2\n)"
        );
        assert_eq!(list(&["4".into()]), "4");
        assert_eq!(list(&["3".into(), "4".into()]), "(3, 4)");
    }
}
