use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::diagnostic::{Error, MatchResult, Summary};
use crate::engine::deep_equal;
use crate::location::Location;
use crate::operator::Operator;
use crate::render;
use crate::value::Value;

/// Turns got into the value actually compared; `Err` explains why it could
/// not.
pub type Transform = Rc<dyn Fn(&Value) -> Result<Value, String>>;

/// Custom check; `Err` carries the reason, possibly empty.
pub type Predicate = Rc<dyn Fn(&Value) -> Result<(), String>>;

pub struct Smuggle {
    label: String,
    transform: Transform,
    expected: Value,
    location: Location,
}

impl Smuggle {
    /// `label` names the transformation in paths: `label(DATA)`.
    pub fn new(label: &str, transform: Transform, expected: Value, location: Location) -> Self {
        Self {
            label: label.to_string(),
            transform,
            expected,
            location,
        }
    }
}

impl fmt::Display for Smuggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = [self.label.clone(), render::to_string(&self.expected)];
        f.write_str(&render::call("Smuggle", &args))
    }
}

impl Operator for Smuggle {
    fn name(&self) -> &'static str {
        "Smuggle"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        let smuggled = match (self.transform)(got) {
            Ok(v) => v,
            Err(reason) => {
                return ctx.mismatch(|| {
                    Error::new("ran smuggle code with %% as argument").summary(Summary::text(reason))
                })
            }
        };
        if ctx.is_boolean() {
            return deep_equal(ctx, &smuggled, &self.expected);
        }
        let inner = ctx.without_accumulation().add_function_call(&self.label);
        match deep_equal(&inner, &smuggled, &self.expected) {
            Ok(()) => Ok(()),
            Err(origin) => ctx.mismatch(|| {
                Error::new(format!("smuggled value of %% does not match ({})", self.label))
                    .got_value(&smuggled)
                    .expected_value(&self.expected)
                    .origin(origin)
            }),
        }
    }

    fn handles_invalid(&self) -> bool {
        true
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

pub struct Code {
    label: String,
    predicate: Predicate,
    location: Location,
}

impl Code {
    pub fn new(label: &str, predicate: Predicate, location: Location) -> Self {
        Self {
            label: label.to_string(),
            predicate,
            location,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({})", self.label)
    }
}

impl Operator for Code {
    fn name(&self) -> &'static str {
        "Code"
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        match (self.predicate)(got) {
            Ok(()) => Ok(()),
            Err(reason) => ctx.mismatch(|| {
                let reason = if reason.is_empty() {
                    "it failed but didn't say why".to_string()
                } else {
                    reason
                };
                Error::new("ran code with %% as argument").summary(Summary::text(reason))
            }),
        }
    }

    fn handles_invalid(&self) -> bool {
        true
    }

    fn location(&self) -> &Location {
        &self.location
    }
}
