//! Breadcrumb identifying where a comparison takes place.

use std::fmt;
use std::rc::Rc;

/// One step below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `.name`
    Field(String),
    /// `[3]`
    Index(usize),
    /// `["key"]`, holding the already rendered key.
    MapKey(String),
    /// Pointer dereference, rendered as a leading `*`.
    Deref,
    /// `name(<path>)`, e.g. `len(DATA.items)`.
    Call(String),
    /// Appended verbatim.
    Custom(String),
}

/// Persistent path: deriving a child shares the parent's segments, so each
/// recursive step costs one allocation whatever the depth.
#[derive(Debug, Clone)]
pub struct Path {
    root: Rc<str>,
    tail: Option<Rc<Node>>,
}

#[derive(Debug)]
struct Node {
    parent: Option<Rc<Node>>,
    segment: Segment,
}

impl Path {
    pub fn new(root: &str) -> Self {
        Self {
            root: Rc::from(root),
            tail: None,
        }
    }

    pub fn push(&self, segment: Segment) -> Self {
        Self {
            root: self.root.clone(),
            tail: Some(Rc::new(Node {
                parent: self.tail.clone(),
                segment,
            })),
        }
    }

    pub fn segments(&self) -> Vec<&Segment> {
        let mut out = Vec::new();
        let mut cur = self.tail.as_deref();
        while let Some(node) = cur {
            out.push(&node.segment);
            cur = node.parent.as_deref();
        }
        out.reverse();
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.root.to_string();
        let mut stars: usize = 0;
        for segment in self.segments() {
            match segment {
                Segment::Deref => stars += 1,
                Segment::Field(name) => {
                    // field access dereferences one level implicitly
                    stars = stars.saturating_sub(1);
                    wrap_stars(&mut out, &mut stars);
                    out.push('.');
                    out.push_str(name);
                }
                Segment::Index(i) => {
                    wrap_stars(&mut out, &mut stars);
                    out.push_str(&format!("[{i}]"));
                }
                Segment::MapKey(key) => {
                    wrap_stars(&mut out, &mut stars);
                    out.push('[');
                    out.push_str(key);
                    out.push(']');
                }
                Segment::Call(name) => {
                    out = format!("{name}({}{out})", "*".repeat(stars));
                    stars = 0;
                }
                Segment::Custom(s) => {
                    wrap_stars(&mut out, &mut stars);
                    out.push_str(s);
                }
            }
        }
        if stars > 0 {
            out = format!("{}{out}", "*".repeat(stars));
        }
        f.write_str(&out)
    }
}

fn wrap_stars(out: &mut String, stars: &mut usize) {
    if *stars > 0 {
        *out = format!("({}{out})", "*".repeat(*stars));
        *stars = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_fields_and_indexes() {
        let p = Path::new("DATA")
            .push(Segment::Field("a".into()))
            .push(Segment::Field("b".into()))
            .push(Segment::Index(2));
        assert_eq!(p.to_string(), "DATA.a.b[2]");
    }

    #[test]
    fn derefs() {
        let root = Path::new("DATA");
        assert_eq!(root.push(Segment::Deref).to_string(), "*DATA");
        assert_eq!(
            root.push(Segment::Deref).push(Segment::Field("x".into())).to_string(),
            "DATA.x"
        );
        assert_eq!(
            root.push(Segment::Deref).push(Segment::Index(0)).to_string(),
            "(*DATA)[0]"
        );
        assert_eq!(
            root.push(Segment::Deref)
                .push(Segment::Deref)
                .push(Segment::Field("x".into()))
                .to_string(),
            "(*DATA).x"
        );
    }

    #[test]
    fn keys_and_calls() {
        let p = Path::new("DATA")
            .push(Segment::MapKey("\"k\"".into()))
            .push(Segment::Call("len".into()));
        assert_eq!(p.to_string(), "len(DATA[\"k\"])");
        assert_eq!(
            Path::new("ROOT").push(Segment::Custom("<x>".into())).to_string(),
            "ROOT<x>"
        );
    }

    #[test]
    fn siblings_do_not_interfere() {
        let parent = Path::new("DATA").push(Segment::Field("a".into()));
        let left = parent.push(Segment::Index(0));
        let right = parent.push(Segment::Index(1));
        assert_eq!(left.to_string(), "DATA.a[0]");
        assert_eq!(right.to_string(), "DATA.a[1]");
        assert_eq!(parent.to_string(), "DATA.a");
    }
}
