//! Paths into a tree.
//!
//! Paths print and parse in dotted form (`"posts.0.title"`), with the empty
//! string denoting the root. The wire format keys its context sidecar by
//! this form, so printing and parsing must agree for every map key.
//!
//! Keys are escaped the way JSON pointers are: `~` prints as `~0`, `.` as
//! `~1`, and the empty key as `~e`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A path from the root of a tree to one of its nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath(Vec<PathSegment>);

impl NodePath {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Parse dot notation (e.g., "user.name" or "items.0.value").
    ///
    /// Segments written as canonical numbers (`"0"`, `"17"`, not `"01"`)
    /// parse as indices; looking an index up in a map falls back to the
    /// equivalent string key.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }
        Self(path.split('.').map(PathSegment::parse).collect())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn first(&self) -> Option<&PathSegment> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    /// Child path one segment deeper.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut new = self.clone();
        new.push(segment.into());
        new
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", s.join("."))
    }
}

impl From<&str> for NodePath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

const EMPTY_KEY: &str = "~e";

/// A segment in a node path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Map key.
    Key(String),
    /// Sequence index.
    Index(usize),
}

impl PathSegment {
    /// Parse one escaped segment.
    fn parse(segment: &str) -> Self {
        if segment == EMPTY_KEY {
            return PathSegment::Key(String::new());
        }
        match segment.parse::<usize>() {
            Ok(idx) if idx.to_string() == segment => PathSegment::Index(idx),
            _ => PathSegment::Key(segment.replace("~1", ".").replace("~0", "~")),
        }
    }

    /// The segment as a map key.
    pub fn to_key(&self) -> String {
        match self {
            PathSegment::Key(k) => k.clone(),
            PathSegment::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) if k.is_empty() => f.write_str(EMPTY_KEY),
            PathSegment::Key(k) => write!(f, "{}", k.replace('~', "~0").replace('.', "~1")),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}
