use std::borrow::Cow;
use std::fmt;

/// Where an operator instance was built, used only to attribute mismatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Operator name, e.g. `Bag`.
    pub func: Cow<'static, str>,
    pub file: Cow<'static, str>,
    pub line: u32,
}

impl Location {
    pub fn new(func: impl Into<Cow<'static, str>>, file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        Self {
            func: func.into(),
            file: file.into(),
            line,
        }
    }

    /// Captures the caller of the outermost `#[track_caller]` frame.
    #[track_caller]
    pub fn caller(func: &'static str) -> Self {
        let at = std::panic::Location::caller();
        Self {
            func: Cow::Borrowed(func),
            file: Cow::Borrowed(at.file()),
            line: at.line(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.func, self.file, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn build() -> Location {
        Location::caller("Bag")
    }

    #[test]
    fn caller_points_at_call_site() {
        let line = line!() + 1;
        let loc = build();
        assert_eq!(loc.func, "Bag");
        assert!(loc.file.ends_with("location.rs"));
        assert_eq!(loc.line, line);
        assert_eq!(loc.to_string(), format!("Bag at {}:{}", loc.file, line));
    }
}
