use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

/// Programmer mistakes: malformed operator arguments or an unreadable
/// expected-value document. Never used to report a mismatch.
#[derive(Debug, Error)]
pub enum UsageError {
    // Wrong argument shape or type given to an operator constructor
    #[error("usage: {op}({params}), {reason}")]
    BadArgument {
        op: &'static str,
        params: &'static str,
        reason: String,
    },

    // Operator called with the wrong number of arguments from the notation
    #[error("{op}() expects {expected} argument(s), got {got}")]
    Arity {
        op: String,
        expected: String,
        got: usize,
    },

    // Regexp pattern rejected by the regex engine
    #[error("invalid regexp {pattern:?}: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    // Operator name not known by the registry
    #[error("unknown operator {0}()")]
    UnknownOperator(String),

    // Syntax error in an expected-value document
    #[error("parse error: {0}")]
    Parse(String),
}

impl UsageError {
    pub(crate) fn bad_argument(
        op: &'static str,
        params: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        UsageError::BadArgument {
            op,
            params,
            reason: reason.into(),
        }
    }
}

// Type alias for results that use `UsageError` as the error type
pub type Result<T> = std::result::Result<T, UsageError>;
