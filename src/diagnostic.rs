//! Structured mismatch report and its text rendering.

use std::borrow::Cow;
use std::fmt;

use itertools::Itertools;

use crate::config::MAX_ERRORS_ENV;
use crate::location::Location;
use crate::render;
use crate::value::Value;

/// Marker replaced by the rendered path inside a message.
pub const PATH_MARKER: &str = "%%";

/// `Ok(())` when matched.
pub type MatchResult = Result<(), Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Mismatch,
    /// Stands for "mismatched" in boolean mode; carries no detail.
    Boolean,
    /// Terminates a chain cut short by the error budget.
    TooMany,
}

/// One mismatch, possibly followed by others through `next`.
#[derive(Debug, Clone)]
pub struct Error {
    /// Rendered path at the point of failure.
    pub path: String,
    pub message: Cow<'static, str>,
    pub got: Option<String>,
    pub expected: Option<String>,
    /// Replaces the got/expected pair when set.
    pub summary: Option<Summary>,
    /// Operator that judged the mismatch.
    pub location: Option<Location>,
    /// Error raised while comparing a transformed value.
    pub origin: Option<Box<Error>>,
    pub next: Option<Box<Error>>,
    kind: Kind,
}

impl Error {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            path: String::new(),
            message: message.into(),
            got: None,
            expected: None,
            summary: None,
            location: None,
            origin: None,
            next: None,
            kind: Kind::Mismatch,
        }
    }

    /// The detail-free sentinel returned in boolean mode.
    pub fn boolean() -> Self {
        Self {
            kind: Kind::Boolean,
            ..Self::new("values differ")
        }
    }

    pub fn too_many() -> Self {
        Self {
            kind: Kind::TooMany,
            ..Self::new(format!(
                "Too many errors (use {MAX_ERRORS_ENV}=-1 to see all)"
            ))
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.kind == Kind::Boolean
    }

    pub fn is_too_many(&self) -> bool {
        self.kind == Kind::TooMany
    }

    pub fn got_value(mut self, got: &Value) -> Self {
        self.got = Some(render::to_string(got));
        self
    }

    pub fn got_raw(mut self, got: impl Into<String>) -> Self {
        self.got = Some(got.into());
        self
    }

    pub fn expected_value(mut self, expected: &Value) -> Self {
        self.expected = Some(render::to_string(expected));
        self
    }

    pub fn expected_raw(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn summary(mut self, summary: Summary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn origin(mut self, origin: Error) -> Self {
        self.origin = Some(Box::new(origin));
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Links `errors` through `next`, in order.
    pub fn chain(errors: Vec<Error>) -> Option<Error> {
        errors.into_iter().rev().fold(None, |next, mut err| {
            err.next = next.map(Box::new);
            Some(err)
        })
    }

    /// This error and every one linked after it.
    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |e| e.next.as_deref())
    }

    /// Message with the path substituted in, as it heads the rendering.
    pub fn headline(&self) -> String {
        match self.message.find(PATH_MARKER) {
            Some(pos) => format!(
                "{}{}{}",
                &self.message[..pos],
                self.path,
                &self.message[pos + PATH_MARKER.len()..]
            ),
            None => format!("{}: {}", self.path, self.message),
        }
    }

    fn render_one(&self) -> String {
        if self.is_too_many() {
            return self.message.to_string();
        }
        let mut out = self.headline();
        match &self.summary {
            Some(summary) => {
                out.push_str("\n\t");
                out.push_str(&render::indent(&summary.to_string(), "\t"));
            }
            None => {
                out.push_str("\n\t     got: ");
                out.push_str(&render::indent(self.got.as_deref().unwrap_or(""), "\t          "));
                out.push_str("\n\texpected: ");
                out.push_str(&render::indent(
                    self.expected.as_deref().unwrap_or(""),
                    "\t          ",
                ));
            }
        }
        if let Some(loc) = &self.location {
            out.push_str(&format!("\n[under operator {loc}]"));
        }
        if let Some(origin) = &self.origin {
            out.push_str("\nOriginates from following error:\n\t");
            out.push_str(&render::indent(&origin.to_string(), "\t"));
        }
        out
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iter().map(Error::render_one).join("\n"))
    }
}

impl std::error::Error for Error {}

/// Holistic explanation used instead of a got/expected pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    Text(String),
    /// `label: value` rows, labels right-aligned.
    Items(Vec<SummaryItem>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryItem {
    pub label: String,
    pub value: String,
}

impl Summary {
    pub fn text(s: impl Into<String>) -> Self {
        Summary::Text(s.into())
    }

    /// Missing/extra rows for set-like mismatches; `noun` is `items` or
    /// `keys`. Rendered values are sorted when `sort` is set.
    pub fn diff(noun: &str, mut missing: Vec<String>, mut extra: Vec<String>, sort: bool) -> Self {
        if sort {
            missing.sort();
            extra.sort();
        }
        let mut items = Vec::new();
        if !missing.is_empty() {
            items.push(SummaryItem {
                label: format!("Missing {noun}"),
                value: render::list(&missing),
            });
        }
        if !extra.is_empty() {
            items.push(SummaryItem {
                label: format!("Extra {noun}"),
                value: render::list(&extra),
            });
        }
        Summary::Items(items)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Text(s) => f.write_str(s),
            Summary::Items(items) => {
                let width = items.iter().map(|i| i.label.chars().count()).max().unwrap_or(0);
                let rows = items
                    .iter()
                    .map(|item| {
                        let pad = " ".repeat(width - item.label.chars().count());
                        let cont = " ".repeat(width + 2);
                        format!("{pad}{}: {}", item.label, render::indent(&item.value, &cont))
                    })
                    .join("\n");
                f.write_str(&rows)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(path: &str, err: Error) -> Error {
        Error { path: path.to_string(), ..err }
    }

    #[test]
    fn renders_got_expected() {
        let err = at(
            "DATA.a.b[2]",
            Error::new("values differ").got_value(&Value::from(3)).expected_value(&Value::from(4)),
        );
        assert_eq!(
            err.to_string(),
            "DATA.a.b[2]: values differ\n\t     got: 3\n\texpected: 4"
        );
    }

    #[test]
    fn renders_summary_and_path_marker() {
        let err = at(
            "DATA",
            Error::new("comparing %% as a Bag").summary(Summary::diff(
                "items",
                vec!["3".into()],
                vec!["4".into(), "5".into()],
                true,
            )),
        );
        assert_eq!(
            err.to_string(),
            "comparing DATA as a Bag\n\tMissing items: 3\n\t  Extra items: (4, 5)"
        );
    }

    #[test]
    fn renders_location_then_origin() {
        let inner = at("DATA", Error::new("values differ").got_raw("1").expected_raw("2"));
        let err = at(
            "DATA",
            Error::new("compared (part 1 of 2)")
                .got_raw("1")
                .expected_raw("All(2, 3)")
                .location(Location::new("All", "t.rs", 7))
                .origin(inner),
        );
        assert_eq!(
            err.to_string(),
            "DATA: compared (part 1 of 2)\n\t     got: 1\n\texpected: All(2, 3)\n\
             [under operator All at t.rs:7]\n\
             Originates from following error:\n\
             \tDATA: values differ\n\t\t     got: 1\n\t\texpected: 2"
        );
    }

    #[test]
    fn multiline_values_are_indented() {
        let err = at("X", Error::new("m").got_raw("a\nb").expected_raw("c"));
        assert_eq!(err.to_string(), "X: m\n\t     got: a\n\t          b\n\texpected: c");
    }

    #[test]
    fn chains_render_in_order() {
        let chain = Error::chain(vec![
            at("DATA[0]", Error::new("values differ").got_raw("1").expected_raw("2")),
            Error::too_many(),
        ])
        .unwrap();
        assert_eq!(chain.iter().count(), 2);
        assert!(chain.next.as_ref().unwrap().is_too_many());
        assert_eq!(
            chain.to_string(),
            "DATA[0]: values differ\n\t     got: 1\n\texpected: 2\n\
             Too many errors (use DEEPMATCH_MAX_ERRORS=-1 to see all)"
        );
    }
}
