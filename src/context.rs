//! Per-comparison state threaded through the recursion.
//!
//! A `Context` is never mutated in place: every recursive step derives a
//! copy with a longer path. Only the visited set and the error sink are
//! shared between a context and its derivatives, and both live exactly as
//! long as one top-level comparison.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::config::Config;
use crate::diagnostic::{Error, MatchResult};
use crate::location::Location;
use crate::path::{Path, Segment};
use crate::render;
use crate::value::Value;

/// Unordered pair of identities plus the kind they were compared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct VisitKey {
    low: usize,
    high: usize,
    kind: u8,
}

impl VisitKey {
    pub(crate) fn new(a: usize, b: usize, kind: u8) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
            kind,
        }
    }
}

#[derive(Debug)]
struct ErrorSink {
    collected: Vec<Error>,
    max: i64,
    exhausted: bool,
}

#[derive(Clone)]
pub struct Context {
    path: Path,
    depth: usize,
    visited: Rc<RefCell<HashSet<VisitKey>>>,
    sink: Option<Rc<RefCell<ErrorSink>>>,
    boolean: bool,
    lax: bool,
    max_depth: Option<usize>,
    cur_operator: Option<Location>,
}

impl Context {
    /// Diagnostic context; collects up to `max_errors` mismatches when the
    /// budget allows more than one.
    pub fn new(config: &Config) -> Self {
        let sink = config.accumulates().then(|| {
            Rc::new(RefCell::new(ErrorSink {
                collected: Vec::new(),
                max: config.max_errors,
                exhausted: false,
            }))
        });
        Self {
            path: Path::new(&config.root_name),
            depth: 0,
            visited: Rc::default(),
            sink,
            boolean: false,
            lax: false,
            max_depth: config.max_depth,
            cur_operator: None,
        }
    }

    /// Yes/no context: mismatches carry no detail and paths are not built.
    pub fn boolean() -> Self {
        Self {
            path: Path::new("DATA"),
            depth: 0,
            visited: Rc::default(),
            sink: None,
            boolean: true,
            lax: false,
            max_depth: None,
            cur_operator: None,
        }
    }

    /// Boolean context in which "got" may itself hold operators; used to
    /// de-duplicate expected items against each other.
    pub(crate) fn lax_boolean() -> Self {
        Self {
            lax: true,
            ..Self::boolean()
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.boolean
    }

    pub fn got_may_hold_operators(&self) -> bool {
        self.lax
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn current_operator(&self) -> Option<&Location> {
        self.cur_operator.as_ref()
    }

    fn derive(&self, segment: impl FnOnce() -> Segment) -> Self {
        let mut next = self.clone();
        next.depth += 1;
        if !self.boolean {
            next.path = self.path.push(segment());
        }
        next
    }

    pub fn add_field(&self, name: &str) -> Self {
        self.derive(|| Segment::Field(name.to_string()))
    }

    pub fn add_index(&self, index: usize) -> Self {
        self.derive(|| Segment::Index(index))
    }

    pub fn add_map_key(&self, key: &Value) -> Self {
        self.derive(|| Segment::MapKey(render::to_string(key)))
    }

    pub fn add_deref(&self) -> Self {
        self.derive(|| Segment::Deref)
    }

    pub fn add_function_call(&self, name: &str) -> Self {
        self.derive(|| Segment::Call(name.to_string()))
    }

    pub fn add_custom_level(&self, level: &str) -> Self {
        self.derive(|| Segment::Custom(level.to_string()))
    }

    /// Mismatches raised below without a location are attributed to `loc`.
    pub fn under_operator(&self, loc: &Location) -> Self {
        let mut next = self.clone();
        next.cur_operator = Some(loc.clone());
        next
    }

    /// Same path, but the first mismatch is returned instead of collected.
    /// Operators that wrap an inner error as `origin` compare through this.
    pub fn without_accumulation(&self) -> Self {
        let mut next = self.clone();
        next.sink = None;
        next
    }

    /// Independent yes/no context with its own visited set, so that a
    /// failed probe leaves no cycle bookkeeping behind.
    pub fn detached_boolean(&self) -> Self {
        Self {
            path: self.path.clone(),
            depth: self.depth,
            visited: Rc::default(),
            sink: None,
            boolean: true,
            lax: self.lax,
            max_depth: self.max_depth,
            cur_operator: self.cur_operator.clone(),
        }
    }

    /// Reports a mismatch at the current path. `build` only runs when detail
    /// is wanted. `Ok(())` means the error was collected and the caller
    /// should keep comparing.
    pub fn mismatch(&self, build: impl FnOnce() -> Error) -> MatchResult {
        if self.boolean {
            return Err(Error::boolean());
        }
        let mut err = build();
        err.path = self.path.to_string();
        if err.location.is_none() {
            err.location = self.cur_operator.clone();
        }
        self.collect(err)
    }

    fn collect(&self, err: Error) -> MatchResult {
        let Some(sink) = &self.sink else {
            return Err(err);
        };
        let mut sink = sink.borrow_mut();
        sink.collected.push(err);
        if sink.max >= 0 && sink.collected.len() as i64 >= sink.max {
            sink.exhausted = true;
            let mut errors = std::mem::take(&mut sink.collected);
            errors.push(Error::too_many());
            return Err(Error::chain(errors).unwrap_or_else(Error::too_many));
        }
        Ok(())
    }

    /// Records the pair; false when it was already being compared.
    pub(crate) fn first_visit(&self, key: VisitKey) -> bool {
        self.visited.borrow_mut().insert(key)
    }

    /// Folds collected mismatches into the result of a top-level call.
    pub(crate) fn finish(&self, result: MatchResult) -> MatchResult {
        let Some(sink) = &self.sink else {
            return result;
        };
        let mut sink = sink.borrow_mut();
        if sink.exhausted {
            return result;
        }
        let mut errors = std::mem::take(&mut sink.collected);
        if let Err(err) = result {
            errors.push(err);
        }
        match Error::chain(errors) {
            Some(chain) => Err(chain),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fail(ctx: &Context, n: i64) -> MatchResult {
        ctx.mismatch(|| Error::new("values differ").got_raw(n.to_string()).expected_raw("0"))
    }

    #[test]
    fn single_error_without_budget() {
        let ctx = Context::new(&Config::default().with_max_errors(1));
        let err = fail(&ctx.add_index(0), 1).unwrap_err();
        assert_eq!(err.path, "DATA[0]");
        assert!(err.next.is_none());
    }

    #[test]
    fn budget_cuts_the_chain() {
        let ctx = Context::new(&Config::default().with_max_errors(2));
        assert!(fail(&ctx.add_index(0), 1).is_ok());
        let err = fail(&ctx.add_index(1), 2).unwrap_err();
        let paths: Vec<_> = err.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec!["DATA[0]".to_string(), "DATA[1]".into(), String::new()]);
        assert!(err.iter().last().unwrap().is_too_many());
        // already folded into the returned chain
        assert!(ctx.finish(Err(err)).is_err());
    }

    #[test]
    fn unlimited_budget_collects_everything() {
        let ctx = Context::new(&Config::default().with_max_errors(-1));
        for i in 0..3 {
            assert!(fail(&ctx.add_index(i), i as i64).is_ok());
        }
        let err = ctx.finish(Ok(())).unwrap_err();
        assert_eq!(err.iter().count(), 3);
        assert!(err.iter().all(|e| !e.is_too_many()));
    }

    #[test]
    fn boolean_mode_builds_nothing() {
        let ctx = Context::boolean().add_field("x");
        let err = ctx
            .mismatch(|| panic!("detail must not be built in boolean mode"))
            .unwrap_err();
        assert!(err.is_boolean());
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn operator_location_is_backfilled() {
        let loc = Location::new("Between", "x.rs", 3);
        let ctx = Context::new(&Config::default().with_max_errors(1)).under_operator(&loc);
        let err = fail(&ctx, 1).unwrap_err();
        assert_eq!(err.location, Some(loc));
    }

    #[test]
    fn visited_pairs_are_unordered_and_shared() {
        let ctx = Context::new(&Config::default());
        assert!(ctx.first_visit(VisitKey::new(1, 2, 0)));
        assert!(!ctx.add_index(0).first_visit(VisitKey::new(2, 1, 0)));
        assert!(ctx.detached_boolean().first_visit(VisitKey::new(1, 2, 0)));
    }
}
