use std::cmp::Ordering;

use crate::value::Value;

/// Orders two scalars of the same type. `None` for mixed types, non-scalars
/// and NaN.
pub fn cmp_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Uint(x), Value::Uint(y)) => Some(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Applies `pred_on_ord` to the ordering of `a` relative to `b`; false when
/// the two cannot be ordered.
pub fn cmp_values<F>(a: &Value, b: &Value, pred_on_ord: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    cmp_scalars(a, b).map(pred_on_ord).unwrap_or(false)
}

/// Plain value equality for scalars; NaN never equals itself.
pub fn scalars_equal(a: &Value, b: &Value) -> bool {
    cmp_values(a, b, Ordering::is_eq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_same_kind_only() {
        assert_eq!(cmp_scalars(&Value::from(1), &Value::from(2)), Some(Ordering::Less));
        assert_eq!(cmp_scalars(&Value::from("b"), &Value::from("a")), Some(Ordering::Greater));
        assert_eq!(cmp_scalars(&Value::from(1), &Value::from(1.0)), None);
        assert_eq!(cmp_scalars(&Value::from(f64::NAN), &Value::from(1.0)), None);
    }

    #[test]
    fn equality() {
        assert!(scalars_equal(&Value::from(true), &Value::from(true)));
        assert!(!scalars_equal(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(cmp_values(&Value::from(3u8), &Value::from(5u8), Ordering::is_lt));
    }
}
