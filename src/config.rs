use serde::Deserialize;
use std::sync::OnceLock;

/// Environment variable overriding the default error budget.
pub const MAX_ERRORS_ENV: &str = "DEEPMATCH_MAX_ERRORS";

const DEFAULT_MAX_ERRORS: i64 = 10;
const DEFAULT_ROOT_NAME: &str = "DATA";

/// Per-comparison settings consumed by the context constructor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mismatches collected before giving up; negative means unlimited,
    /// 0 and 1 both stop at the first one.
    pub max_errors: i64,
    /// Label of the compared value in paths.
    pub root_name: String,
    /// Report mismatches through the harness as fatal failures.
    pub failure_is_fatal: bool,
    /// Optional recursion cutoff; none by default.
    pub max_depth: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_errors: env_max_errors(),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            failure_is_fatal: false,
            max_depth: None,
        }
    }
}

impl Config {
    pub fn with_max_errors(mut self, max_errors: i64) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_root_name(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = root_name.into();
        self
    }

    pub fn with_fatal(mut self, fatal: bool) -> Self {
        self.failure_is_fatal = fatal;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Whether several mismatches are collected instead of only the first.
    pub(crate) fn accumulates(&self) -> bool {
        self.max_errors > 1 || self.max_errors < 0
    }
}

/// Read once; later changes to the environment are not observed.
fn env_max_errors() -> i64 {
    static MAX_ERRORS: OnceLock<i64> = OnceLock::new();
    *MAX_ERRORS.get_or_init(|| parse_max_errors(std::env::var(MAX_ERRORS_ENV).ok().as_deref()))
}

fn parse_max_errors(raw: Option<&str>) -> i64 {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
            tracing::warn!(value = s, "ignoring unparsable {}", MAX_ERRORS_ENV);
            DEFAULT_MAX_ERRORS
        }),
        _ => DEFAULT_MAX_ERRORS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_value_parsing() {
        assert_eq!(parse_max_errors(None), 10);
        assert_eq!(parse_max_errors(Some(" -1 ")), -1);
        assert_eq!(parse_max_errors(Some("3")), 3);
        assert_eq!(parse_max_errors(Some("lots")), 10);
        assert_eq!(parse_max_errors(Some("")), 10);
    }

    #[test]
    fn deserializes_partial_config() {
        let cfg: Config = serde_json::from_str(r#"{"max_errors": 2, "root_name": "RESP"}"#).unwrap();
        assert_eq!(cfg.max_errors, 2);
        assert_eq!(cfg.root_name, "RESP");
        assert!(!cfg.failure_is_fatal);
        assert_eq!(cfg.max_depth, None);
    }

    #[test]
    fn accumulation_threshold() {
        let cfg = Config::default();
        assert!(!cfg.clone().with_max_errors(1).accumulates());
        assert!(!cfg.clone().with_max_errors(0).accumulates());
        assert!(cfg.clone().with_max_errors(2).accumulates());
        assert!(cfg.with_max_errors(-1).accumulates());
    }
}
