//! Structural deep comparison with pluggable operators.
//!
//! ```
//! use deepmatch::{check, operators as op, Value};
//!
//! let got = Value::from(serde_json::json!({"id": 7, "tags": ["b", "a"]}));
//! let expected = Value::map([
//!     ("id", op::gt(0)),
//!     ("tags", op::bag(["a", "b"])),
//! ]);
//! assert!(check(&got, &expected).is_ok());
//! ```

pub mod comparison;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod engine;
pub mod errors;
pub mod expression;
pub mod functions; // operator factories for the text notation
pub mod harness;
pub mod location;
pub mod operator;
pub mod operators;
pub mod parser;
pub mod path;
pub mod render;
pub mod value;

pub use config::Config;
pub use context::Context;
pub use diagnostic::{Error, MatchResult, Summary};
pub use engine::{check, check_with, deep_equal, matches};
pub use errors::{Result, UsageError};
pub use functions::Registry;
pub use location::Location;
pub use operator::Operator;
pub use value::Value;

/// A configuration plus the operators the text notation may call.
#[derive(Clone)]
pub struct Matcher {
    config: Config,
    registry: Registry,
}

impl Matcher {
    pub fn new(config: Config, registry: Registry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parses an expected value written in the text notation.
    pub fn parse(&self, expected: &str) -> Result<Value> {
        expression::parse_expected(expected, &self.registry)
    }

    pub fn check(&self, got: &Value, expected: &Value) -> MatchResult {
        check_with(&self.config, got, expected)
    }

    /// Parses `expected` then compares; usage errors in the text surface as
    /// the outer `Err`.
    pub fn check_str(&self, got: &Value, expected: &str) -> Result<MatchResult> {
        let expected = self.parse(expected)?;
        Ok(self.check(got, &expected))
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(Config::default(), Registry::with_builtins())
    }
}

/// Convenience: parses with the built-in operators.
pub fn parse_expected(expected: &str) -> Result<Value> {
    Matcher::default().parse(expected)
}
