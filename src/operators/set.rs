//! Unordered sequence matching.
//!
//! Expected items claim got items. Sets let several got items be claimed
//! by one expected item (and ignore duplicates on both sides); bags pair
//! items one to one.

use std::fmt;

use super::with_items;
use crate::context::Context;
use crate::diagnostic::{Error, MatchResult, Summary};
use crate::engine::{deep_equal, equal_lax};
use crate::location::Location;
use crate::operator::Operator;
use crate::render;
use crate::value::Value;

/// What leftovers are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetPolicy {
    /// Neither missing nor extra items.
    All,
    /// Missing items are fine, got must not hold extra ones.
    Sub,
    /// Extra got items are fine, none may be missing.
    Super,
    /// No expected item may be found at all.
    None,
}

pub struct SetBag {
    name: &'static str,
    policy: SetPolicy,
    dedup: bool,
    items: Vec<Value>,
    location: Location,
}

fn dedup_items(items: Vec<Value>) -> Vec<Value> {
    let mut kept: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !kept.iter().any(|k| equal_lax(k, &item)) {
            kept.push(item);
        }
    }
    kept
}

fn fits(got: &Value, expected: &Value, ctx: &Context) -> bool {
    deep_equal(&ctx.detached_boolean(), got, expected).is_ok()
}

impl SetBag {
    /// With `dedup`, expected items equal to an earlier one are dropped.
    pub fn new(
        name: &'static str,
        policy: SetPolicy,
        dedup: bool,
        items: Vec<Value>,
        location: Location,
    ) -> Self {
        let items = if dedup { dedup_items(items) } else { items };
        Self {
            name,
            policy,
            dedup,
            items,
            location,
        }
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Claims got items for `expected`; false when none fits.
    fn claim(&self, ctx: &Context, got: &[Value], expected: &Value, claimed: &mut [bool]) -> bool {
        if !self.dedup {
            let slot = got
                .iter()
                .zip(claimed.iter())
                .position(|(g, &taken)| !taken && fits(g, expected, ctx));
            if let Some(i) = slot {
                claimed[i] = true;
            }
            return slot.is_some();
        }

        let mut hit = false;
        for (g, taken) in got.iter().zip(claimed.iter_mut()) {
            if !*taken && fits(g, expected, ctx) {
                *taken = true;
                hit = true;
            }
        }
        // a duplicate expected item may reuse what an earlier one claimed
        hit || got
            .iter()
            .zip(claimed.iter())
            .any(|(g, &taken)| taken && fits(g, expected, ctx))
    }

    fn compare(&self, ctx: &Context, got: &[Value]) -> MatchResult {
        let mut claimed = vec![false; got.len()];
        let mut missing = Vec::new();
        let mut found = Vec::new();
        for expected in &self.items {
            if self.claim(ctx, got, expected, &mut claimed) {
                found.push(expected);
            } else {
                missing.push(expected);
            }
        }
        let extra = got
            .iter()
            .zip(claimed.iter())
            .filter(|(_, &taken)| !taken)
            .map(|(g, _)| g);

        let (missing, extra): (Vec<&Value>, Vec<&Value>) = match self.policy {
            SetPolicy::All => (missing, extra.collect()),
            SetPolicy::Sub => (Vec::new(), extra.collect()),
            SetPolicy::Super => (missing, Vec::new()),
            SetPolicy::None => (Vec::new(), found),
        };
        if missing.is_empty() && extra.is_empty() {
            return Ok(());
        }
        ctx.mismatch(|| {
            let render_all = |vs: Vec<&Value>| -> Vec<String> {
                vs.into_iter().map(render::to_string).collect()
            };
            Error::new(format!("comparing %% as a {}", self.name)).summary(Summary::diff(
                "items",
                render_all(missing),
                render_all(extra),
                false,
            ))
        })
    }
}

impl fmt::Display for SetBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::call(self.name, &render::each(&self.items)))
    }
}

impl Operator for SetBag {
    fn name(&self) -> &'static str {
        self.name
    }

    fn match_value(&self, ctx: &Context, got: &Value) -> MatchResult {
        // reported as a whole, never at an element path
        with_items(ctx, got, |_, items| self.compare(ctx, items))
    }

    fn location(&self) -> &Location {
        &self.location
    }
}
