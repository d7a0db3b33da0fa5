use std::cmp::Ordering;
use std::fmt;

use super::unboxed;
use crate::comparison::{cmp_scalars, cmp_values};
use crate::context::Context;
use crate::diagnostic::{Error, MatchResult};
use crate::errors::{Result, UsageError};
use crate::location::Location;
use crate::operator::Operator;
use crate::render;
use crate::value::Value;

/// Which ends of a `Between` are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounds {
    InIn,
    InOut,
    OutIn,
    OutOut,
}

impl Bounds {
    fn split(self) -> (bool, bool) {
        match self {
            Bounds::InIn => (true, true),
            Bounds::InOut => (true, false),
            Bounds::OutIn => (false, true),
            Bounds::OutOut => (false, false),
        }
    }

    fn join(lower: bool, upper: bool) -> Self {
        match (lower, upper) {
            (true, true) => Bounds::InIn,
            (true, false) => Bounds::InOut,
            (false, true) => Bounds::OutIn,
            (false, false) => Bounds::OutOut,
        }
    }

    /// Parses `[]`, `[[`, `]]` or `][`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "[]" => Some(Bounds::InIn),
            "[[" => Some(Bounds::InOut),
            "]]" => Some(Bounds::OutIn),
            "][" => Some(Bounds::OutOut),
            _ => None,
        }
    }
}

enum Bound {
    Unbounded,
    Included(Value),
    Excluded(Value),
}

impl Bound {
    fn new(v: Value, included: bool) -> Self {
        if included {
            Bound::Included(v)
        } else {
            Bound::Excluded(v)
        }
    }

    fn value(&self) -> Option<&Value> {
        match self {
            Bound::Unbounded => None,
            Bound::Included(v) | Bound::Excluded(v) => Some(v),
        }
    }

    /// `got` is on the inner side of this bound. `lower` says which side
    /// that is.
    fn admits(&self, got: &Value, lower: bool) -> bool {
        let (bound, strict) = match self {
            Bound::Unbounded => return true,
            Bound::Included(v) => (v, false),
            Bound::Excluded(v) => (v, true),
        };
        cmp_values(got, bound, |ord| match (lower, strict) {
            (true, false) => ord != Ordering::Less,
            (true, true) => ord == Ordering::Greater,
            (false, false) => ord != Ordering::Greater,
            (false, true) => ord == Ordering::Less,
        })
    }
}

/// Ordered comparison against one or two bounds of the same scalar type.
pub struct Range {
    name: &'static str,
    lower: Bound,
    upper: Bound,
    location: Location,
}

fn orderable(op: &'static str, params: &'static str, v: &Value) -> Result<()> {
    if !v.is_scalar() || matches!(v, Value::Bool(_)) || cmp_scalars(v, v).is_none() {
        return Err(UsageError::bad_argument(
            op,
            params,
            format!("{} is not an orderable value", render::to_string(v)),
        ));
    }
    Ok(())
}

impl Range {
    /// A reversed range is swapped, along with its bounds.
    pub fn between(lo: Value, hi: Value, bounds: Bounds, location: Location) -> Result<Self> {
        const PARAMS: &str = "FROM, TO[, BOUNDS]";
        orderable("Between", PARAMS, &lo)?;
        orderable("Between", PARAMS, &hi)?;
        if !lo.same_type(&hi) {
            return Err(UsageError::bad_argument(
                "Between",
                PARAMS,
                format!(
                    "FROM and TO must have the same type, got {} and {}",
                    lo.type_name(),
                    hi.type_name()
                ),
            ));
        }
        let (mut lo, mut hi) = (lo, hi);
        let (mut lo_in, mut hi_in) = bounds.split();
        if cmp_scalars(&lo, &hi) == Some(Ordering::Greater) {
            std::mem::swap(&mut lo, &mut hi);
            std::mem::swap(&mut lo_in, &mut hi_in);
        }
        Ok(Self {
            name: "Between",
            lower: Bound::new(lo, lo_in),
            upper: Bound::new(hi, hi_in),
            location,
        })
    }

    pub fn gt(v: Value, location: Location) -> Result<Self> {
        Self::lower_only("Gt", v, false, location)
    }

    pub fn gte(v: Value, location: Location) -> Result<Self> {
        Self::lower_only("Gte", v, true, location)
    }

    pub fn lt(v: Value, location: Location) -> Result<Self> {
        Self::upper_only("Lt", v, false, location)
    }

    pub fn lte(v: Value, location: Location) -> Result<Self> {
        Self::upper_only("Lte", v, true, location)
    }

    fn lower_only(name: &'static str, v: Value, included: bool, location: Location) -> Result<Self> {
        orderable(name, "VALUE", &v)?;
        Ok(Self {
            name,
            lower: Bound::new(v, included),
            upper: Bound::Unbounded,
            location,
        })
    }

    fn upper_only(name: &'static str, v: Value, included: bool, location: Location) -> Result<Self> {
        orderable(name, "VALUE", &v)?;
        Ok(Self {
            name,
            lower: Bound::Unbounded,
            upper: Bound::new(v, included),
            location,
        })
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match (&self.lower, &self.upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => None,
            (lo, hi) => Some(Bounds::join(
                matches!(lo, Bound::Included(_)),
                matches!(hi, Bound::Included(_)),
            )),
        }
    }

    fn sample(&self) -> Option<&Value> {
        self.lower.value().or_else(|| self.upper.value())
    }
}

fn sign(included: bool, lower: bool) -> &'static str {
    match (included, lower) {
        (true, true) => "≥",
        (false, true) => ">",
        (true, false) => "≤",
        (false, false) => "<",
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let incl = |b: &Bound| matches!(b, Bound::Included(_));
        match (self.lower.value(), self.upper.value()) {
            (Some(lo), Some(hi)) => {
                // "1 ≤ got ≤ 5": the lower sign reads left to right
                let lo_sign = if incl(&self.lower) { "≤" } else { "<" };
                write!(
                    f,
                    "{} {lo_sign} got {} {}",
                    render::to_string(lo),
                    sign(incl(&self.upper), false),
                    render::to_string(hi)
                )
            }
            (Some(lo), None) => write!(f, "{} {}", sign(incl(&self.lower), true), render::to_string(lo)),
            (None, Some(hi)) => write!(f, "{} {}", sign(incl(&self.upper), false), render::to_string(hi)),
            (None, None) => f.write_str(self.name),
        }
    }
}

impl Operator for Range {
    fn name(&self) -> &'static str {
        self.name
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        let got = unboxed(got);
        if let Some(sample) = self.sample().filter(|s| !got.same_type(s)) {
            return ctx.mismatch(|| {
                Error::new("type mismatch")
                    .got_raw(got.type_name())
                    .expected_raw(sample.type_name())
            });
        }
        if self.lower.admits(got, true) && self.upper.admits(got, false) {
            return Ok(());
        }
        ctx.mismatch(|| Error::new("values differ").got_value(got).expected_raw(self.to_string()))
    }

    fn location(&self) -> &Location {
        &self.location
    }
}
