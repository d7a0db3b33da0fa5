use std::fmt;

use crate::context::Context;
use crate::diagnostic::MatchResult;
use crate::location::Location;
use crate::value::Value;

/// A matcher placed on the expected side that replaces structural equality
/// for the subtree it occupies.
///
/// Implementations are immutable once built and must not have side effects
/// in `match_value`; one instance may be matched any number of times.
/// `Display` is the canonical rendering, also embedded by composite
/// operators.
pub trait Operator: fmt::Display {
    /// Name used in renderings, type names and locations, e.g. `Bag`.
    fn name(&self) -> &'static str;

    /// Tests `got`. Must return `Error::boolean()` (through
    /// `Context::mismatch`) rather than build detail in boolean mode.
    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult;

    /// Whether an untyped nil got is handed to `match_value` instead of
    /// failing upfront.
    fn handles_invalid(&self) -> bool {
        false
    }

    fn location(&self) -> &Location;
}
