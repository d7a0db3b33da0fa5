//! Adapter between comparisons and a test framework.

use crate::config::Config;
use crate::engine::check_with;
use crate::value::Value;

/// What a test framework must provide to receive failures.
pub trait Reporter {
    /// Records a failure and lets the test go on.
    fn report_failure(&self, message: &str);

    /// Records a failure that ends the test. Implementations usually panic.
    fn report_fatal_failure(&self, message: &str);

    /// Hint that the current frame is a helper and should be hidden from
    /// failure locations.
    fn mark_helper(&self) {}
}

/// Compares and reports a mismatch through `reporter`, fatally when
/// `config.failure_is_fatal`. Returns whether got matched.
///
/// The report is the rendered error, preceded by `Failed test 'NAME'` when
/// `name` is given.
pub fn cmp<R>(reporter: &R, config: &Config, got: &Value, expected: &Value, name: Option<&str>) -> bool
where
    R: Reporter + ?Sized,
{
    reporter.mark_helper();
    let Err(err) = check_with(config, got, expected) else {
        return true;
    };
    let mut message = String::new();
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        message.push_str(&format!("Failed test '{name}'\n"));
    }
    message.push_str(&err.to_string());
    if config.failure_is_fatal {
        reporter.report_fatal_failure(&message);
    } else {
        reporter.report_failure(&message);
    }
    false
}

/// Reporter for plain `#[test]` functions: failures panic with the report.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicReporter;

impl Reporter for PanicReporter {
    fn report_failure(&self, message: &str) {
        panic!("{message}");
    }

    fn report_fatal_failure(&self, message: &str) {
        panic!("{message}");
    }
}
