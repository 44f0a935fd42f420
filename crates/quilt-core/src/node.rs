//! Tree nodes.
//!
//! A tree is built from three kinds of node:
//! - `Map`: ordered string-keyed composite
//! - `Seq`: ordered sequence composite
//! - `Leaf`: a scalar of type `S`
//!
//! Composites carry an optional [`Reference`] tag. All other metadata lives in
//! the owning tree's [`ContextTable`](crate::context::ContextTable), never in
//! the node itself.

use crate::path::{NodePath, PathSegment};
use crate::reference::Reference;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Result of a visitor callback in [`Node::visit_mut`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visit {
    /// Continue into this node's children.
    Descend,
    /// Do not visit this node's children.
    Skip,
}

/// A node of a (possibly tracked) tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node<S = Scalar> {
    /// Ordered map of child nodes.
    Map {
        reference: Option<Reference>,
        entries: IndexMap<String, Node<S>>,
    },
    /// Ordered sequence of child nodes.
    Seq {
        reference: Option<Reference>,
        items: Vec<Node<S>>,
    },
    /// Scalar value.
    Leaf(S),
}

impl<S> Node<S> {
    /// Empty untracked map.
    pub fn map() -> Self {
        Node::Map {
            reference: None,
            entries: IndexMap::new(),
        }
    }

    /// Empty untracked sequence.
    pub fn seq() -> Self {
        Node::Seq {
            reference: None,
            items: Vec::new(),
        }
    }

    pub fn leaf(value: S) -> Self {
        Node::Leaf(value)
    }

    pub fn reference(&self) -> Option<&Reference> {
        match self {
            Node::Map { reference, .. } | Node::Seq { reference, .. } => reference.as_ref(),
            Node::Leaf(_) => None,
        }
    }

    /// Replace the reference tag. No-op on leaves.
    ///
    /// This is raw access: it does not touch any context table.
    pub fn set_reference(&mut self, value: Option<Reference>) {
        match self {
            Node::Map { reference, .. } | Node::Seq { reference, .. } => *reference = value,
            Node::Leaf(_) => {}
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.reference().is_some()
    }

    pub fn is_composite(&self) -> bool {
        !matches!(self, Node::Leaf(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Node::Map { .. })
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, Node::Seq { .. })
    }

    pub fn as_leaf(&self) -> Option<&S> {
        match self {
            Node::Leaf(value) => Some(value),
            _ => None,
        }
    }

    /// Number of children (0 for leaves).
    pub fn len(&self) -> usize {
        match self {
            Node::Map { entries, .. } => entries.len(),
            Node::Seq { items, .. } => items.len(),
            Node::Leaf(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct child addressed by `segment`.
    pub fn child(&self, segment: &PathSegment) -> Option<&Node<S>> {
        match (self, segment) {
            (Node::Map { entries, .. }, PathSegment::Key(k)) => entries.get(k),
            (Node::Map { entries, .. }, PathSegment::Index(i)) => entries.get(&i.to_string()),
            (Node::Seq { items, .. }, PathSegment::Index(i)) => items.get(*i),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut Node<S>> {
        match (self, segment) {
            (Node::Map { entries, .. }, PathSegment::Key(k)) => entries.get_mut(k),
            (Node::Map { entries, .. }, PathSegment::Index(i)) => entries.get_mut(&i.to_string()),
            (Node::Seq { items, .. }, PathSegment::Index(i)) => items.get_mut(*i),
            _ => None,
        }
    }

    /// Descendant at `path` (the node itself for the root path).
    pub fn get(&self, path: &NodePath) -> Option<&Node<S>> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| node.child(segment))
    }

    pub fn get_mut(&mut self, path: &NodePath) -> Option<&mut Node<S>> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| node.child_mut(segment))
    }

    /// Direct children with the segment that addresses each of them.
    pub fn children(&self) -> Box<dyn Iterator<Item = (PathSegment, &Node<S>)> + '_> {
        match self {
            Node::Map { entries, .. } => Box::new(
                entries
                    .iter()
                    .map(|(k, v)| (PathSegment::Key(k.clone()), v)),
            ),
            Node::Seq { items, .. } => Box::new(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (PathSegment::Index(i), v)),
            ),
            Node::Leaf(_) => Box::new(std::iter::empty()),
        }
    }

    pub fn children_mut(&mut self) -> Box<dyn Iterator<Item = &mut Node<S>> + '_> {
        match self {
            Node::Map { entries, .. } => Box::new(entries.values_mut()),
            Node::Seq { items, .. } => Box::new(items.iter_mut()),
            Node::Leaf(_) => Box::new(std::iter::empty()),
        }
    }

    /// Pre-order traversal of this node and every descendant, with paths
    /// relative to this node.
    pub fn walk<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&NodePath, &'a Node<S>),
    {
        self.walk_from(&NodePath::root(), f);
    }

    fn walk_from<'a, F>(&'a self, path: &NodePath, f: &mut F)
    where
        F: FnMut(&NodePath, &'a Node<S>),
    {
        f(path, self);
        for (segment, child) in self.children() {
            child.walk_from(&path.child(segment), f);
        }
    }

    /// Pre-order mutable traversal; the callback decides whether to descend.
    pub fn visit_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Node<S>) -> Visit,
    {
        if f(self) == Visit::Descend {
            for child in self.children_mut() {
                child.visit_mut(f);
            }
        }
    }

    /// References of this node and every tracked descendant, in pre-order.
    pub fn references(&self) -> Vec<&Reference> {
        let mut found = Vec::new();
        self.walk(&mut |_, node| {
            if let Some(reference) = node.reference() {
                found.push(reference);
            }
        });
        found
    }
}

impl<S: Clone> Node<S> {
    /// Deep copy with every reference tag removed.
    pub fn stripped(&self) -> Node<S> {
        match self {
            Node::Map { entries, .. } => Node::Map {
                reference: None,
                entries: entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.stripped()))
                    .collect(),
            },
            Node::Seq { items, .. } => Node::Seq {
                reference: None,
                items: items.iter().map(Node::stripped).collect(),
            },
            Node::Leaf(value) => Node::Leaf(value.clone()),
        }
    }
}

impl<S: Serialize> Node<S> {
    /// Plain JSON rendering; reference tags are not part of it.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl<S: DeserializeOwned> Node<S> {
    /// Build an untracked node from JSON. Objects and arrays become
    /// composites, everything else is handed to `S`.
    pub fn from_json(value: Value) -> serde_json::Result<Self> {
        Ok(match value {
            Value::Object(map) => Node::Map {
                reference: None,
                entries: map
                    .into_iter()
                    .map(|(k, v)| Ok((k, Node::from_json(v)?)))
                    .collect::<serde_json::Result<_>>()?,
            },
            Value::Array(items) => Node::Seq {
                reference: None,
                items: items
                    .into_iter()
                    .map(Node::from_json)
                    .collect::<serde_json::Result<_>>()?,
            },
            other => Node::Leaf(serde_json::from_value(other)?),
        })
    }
}

impl<S: Serialize> Serialize for Node<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        match self {
            Node::Map { entries, .. } => entries.serialize(serializer),
            Node::Seq { items, .. } => items.serialize(serializer),
            Node::Leaf(value) => value.serialize(serializer),
        }
    }
}

impl<'de, S: DeserializeOwned> Deserialize<'de> for Node<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Node::from_json(value).map_err(serde::de::Error::custom)
    }
}

/// The default scalar: any non-composite JSON value.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            Scalar::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<Scalar> for Node<Scalar> {
    fn from(value: Scalar) -> Self {
        Node::Leaf(value)
    }
}

impl From<Value> for Node<Scalar> {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Node::Map {
                reference: None,
                entries: map.into_iter().map(|(k, v)| (k, Node::from(v))).collect(),
            },
            Value::Array(items) => Node::Seq {
                reference: None,
                items: items.into_iter().map(Node::from).collect(),
            },
            Value::Null => Node::Leaf(Scalar::Null),
            Value::Bool(b) => Node::Leaf(Scalar::Bool(b)),
            Value::Number(n) => Node::Leaf(match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => Scalar::Float(n.as_f64().unwrap_or_default()),
            }),
            Value::String(s) => Node::Leaf(Scalar::String(s)),
        }
    }
}
