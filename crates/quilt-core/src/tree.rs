//! A node tree together with the context table describing its tracked
//! composites.

use crate::context::{Context, ContextTable};
use crate::error::{CoreError, Result};
use crate::node::{Node, Scalar};
use crate::path::{NodePath, PathSegment};
use crate::reference::Reference;
use crate::tracked::{track, TrackConfig};
use serde_json::Value;
use std::collections::BTreeMap;

/// `{reference -> node}` for every tracked composite of a tree.
pub type ReferenceIndex<'a, S> = BTreeMap<&'a Reference, &'a Node<S>>;

/// A tree of [`Node`]s plus its metadata side table.
///
/// A tree is *tracked* when its root carries a reference. Writes through
/// [`Tree::attach`], [`Tree::set`] and [`Tree::push`] track the incoming value
/// under its attachment point whenever that point is itself tracked.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree<S = Scalar> {
    root: Node<S>,
    contexts: ContextTable,
}

impl<S> Tree<S> {
    pub fn from_parts(root: Node<S>, contexts: ContextTable) -> Self {
        Self { root, contexts }
    }

    pub fn into_parts(self) -> (Node<S>, ContextTable) {
        (self.root, self.contexts)
    }

    pub fn root(&self) -> &Node<S> {
        &self.root
    }

    /// Raw mutable access to the root. Nothing written through it is tracked.
    pub fn root_mut(&mut self) -> &mut Node<S> {
        &mut self.root
    }

    pub fn contexts(&self) -> &ContextTable {
        &self.contexts
    }

    pub fn reference(&self) -> Option<&Reference> {
        self.root.reference()
    }

    /// Context of the root node.
    pub fn context(&self) -> Option<&Context> {
        self.reference().and_then(|r| self.contexts.get(r))
    }

    pub fn origin_reference(&self) -> Option<&Reference> {
        self.context().and_then(|c| c.origin_reference.as_ref())
    }

    pub fn update_index(&self) -> Option<u64> {
        self.context().map(|c| c.update_index)
    }

    pub fn is_tracked(&self) -> bool {
        self.reference().is_some()
    }

    pub fn get(&self, path: &NodePath) -> Option<&Node<S>> {
        self.root.get(path)
    }

    /// Context of the tracked composite at `path`, if any.
    pub fn context_at(&self, path: &NodePath) -> Option<&Context> {
        self.get(path)
            .and_then(Node::reference)
            .and_then(|r| self.contexts.get(r))
    }

    /// Every tracked composite reachable from the root, including the root.
    pub fn reference_index(&self) -> ReferenceIndex<'_, S> {
        let mut index = BTreeMap::new();
        self.root.walk(&mut |_, node| {
            if let Some(reference) = node.reference() {
                index.entry(reference).or_insert(node);
            }
        });
        index
    }

    /// Fold `other` into this tree's table (see [`ContextTable::absorb`]).
    pub fn absorb_contexts(&mut self, other: &ContextTable) {
        self.contexts.absorb(other);
    }

    /// Drop contexts whose reference no longer appears in the tree.
    pub fn prune(&mut self) {
        let reachable: Vec<Reference> = self.root.references().into_iter().cloned().collect();
        self.contexts.retain_reachable(&reachable);
    }
}

impl<S: Clone> Tree<S> {
    /// Copy of the subtree at `path`, keeping references and the contexts
    /// that describe them.
    pub fn subtree(&self, path: &NodePath) -> Option<Tree<S>> {
        let node = self.get(path)?.clone();
        let mut tree = Tree::from_parts(node, self.contexts.clone());
        tree.prune();
        Some(tree)
    }

    /// Untracked deep copy.
    pub fn stripped(&self) -> Node<S> {
        self.root.stripped()
    }

    /// Store `value` under `key` in the composite at `parent`.
    ///
    /// For a sequence the key must be an index no greater than its length;
    /// an index equal to the length appends.
    pub fn attach(
        &mut self,
        parent: &NodePath,
        key: impl Into<PathSegment>,
        value: impl Into<Tree<S>>,
    ) -> Result<()> {
        self.attach_with(parent, key, value, &TrackConfig::default())
    }

    pub fn attach_with(
        &mut self,
        parent: &NodePath,
        key: impl Into<PathSegment>,
        value: impl Into<Tree<S>>,
        config: &TrackConfig,
    ) -> Result<()> {
        let key = key.into();
        let container = self
            .root
            .get_mut(parent)
            .ok_or_else(|| CoreError::PathNotFound(parent.to_string()))?;

        let value = value.into();
        let value = match container.reference() {
            Some(origin) => track(value, Some(origin), config),
            None => value,
        };
        let (node, contexts) = value.into_parts();

        match container {
            Node::Map { entries, .. } => {
                entries.insert(key.to_key(), node);
            }
            Node::Seq { items, .. } => {
                let index = match key {
                    PathSegment::Index(i) => i,
                    PathSegment::Key(k) => {
                        return Err(CoreError::InvalidKey {
                            path: parent.to_string(),
                            key: k,
                        })
                    }
                };
                match index.cmp(&items.len()) {
                    std::cmp::Ordering::Less => items[index] = node,
                    std::cmp::Ordering::Equal => items.push(node),
                    std::cmp::Ordering::Greater => {
                        return Err(CoreError::IndexOutOfBounds {
                            index,
                            length: items.len(),
                        })
                    }
                }
            }
            Node::Leaf(_) => return Err(CoreError::NotAContainer(parent.to_string())),
        }

        self.contexts.absorb(&contexts);
        self.prune();
        Ok(())
    }

    /// Store `value` at `path`. The parent of `path` must already exist.
    pub fn set(&mut self, path: &NodePath, value: impl Into<Tree<S>>) -> Result<()> {
        let (parent, key) = match (path.parent(), path.last()) {
            (Some(parent), Some(key)) => (parent, key.clone()),
            _ => return Err(CoreError::PathNotFound(path.to_string())),
        };
        self.attach(&parent, key, value)
    }

    /// Append `value` to the sequence at `path`.
    pub fn push(&mut self, path: &NodePath, value: impl Into<Tree<S>>) -> Result<()> {
        let length = match self.get(path) {
            Some(Node::Seq { items, .. }) => items.len(),
            Some(_) => return Err(CoreError::NotAContainer(path.to_string())),
            None => return Err(CoreError::PathNotFound(path.to_string())),
        };
        self.attach(path, length, value)
    }
}

impl<S> From<Node<S>> for Tree<S> {
    fn from(root: Node<S>) -> Self {
        Tree::from_parts(root, ContextTable::new())
    }
}

impl<S: Clone> From<&Tree<S>> for Tree<S> {
    fn from(tree: &Tree<S>) -> Self {
        tree.clone()
    }
}

impl From<Value> for Tree<Scalar> {
    fn from(value: Value) -> Self {
        Tree::from(Node::from(value))
    }
}

impl From<Scalar> for Tree<Scalar> {
    fn from(value: Scalar) -> Self {
        Tree::from(Node::Leaf(value))
    }
}
