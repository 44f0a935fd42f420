//! Identity and provenance tracking.
//!
//! [`make`] deep-copies a value and stamps every composite in it with a
//! [`Context`]. The root is linked to the optional origin and every descendant
//! to its immediate structural parent. [`unmake`] is the inverse projection.

use crate::clock::{next_update_index, now_millis};
use crate::context::{Context, ContextTable};
use crate::error::{CoreError, Result};
use crate::node::Node;
use crate::path::{NodePath, PathSegment};
use crate::reference::Reference;
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// What happens to an existing reference when a node is re-tracked under an
/// origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    /// Keep the reference when the origin matches the recorded one, mint a
    /// new one otherwise.
    #[default]
    PreserveOnSameOrigin,
    /// Mint a new reference whenever an origin is given.
    AlwaysMint,
}

/// Tracking options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub identity: IdentityPolicy,
}

impl TrackConfig {
    pub fn with_identity(mut self, identity: IdentityPolicy) -> Self {
        self.identity = identity;
        self
    }
}

/// Stamp `node` with a fresh context, honoring the identity policy.
///
/// `contexts` holds the node's previous record (if any) and receives the new
/// one. Leaves are left alone and yield `Ok(None)`. Fails when `origin` is
/// given but untracked.
pub fn inherit<S>(
    node: &mut Node<S>,
    contexts: &mut ContextTable,
    origin: Option<&Node<S>>,
    config: &TrackConfig,
) -> Result<Option<Reference>> {
    let origin = origin
        .map(|o| o.reference().ok_or(CoreError::UntrackedOrigin))
        .transpose()?;
    if !node.is_composite() {
        return Ok(None);
    }
    let previous = node.reference().and_then(|r| contexts.get(r)).cloned();
    let context = stamp(node.reference(), previous.as_ref(), origin, config);
    let reference = context.reference.clone();
    node.set_reference(Some(reference.clone()));
    contexts.insert(context);
    Ok(Some(reference))
}

fn stamp(
    existing: Option<&Reference>,
    previous: Option<&Context>,
    origin: Option<&Reference>,
    config: &TrackConfig,
) -> Context {
    let now = now_millis();
    let recorded_origin = previous.and_then(|c| c.origin_reference.as_ref());

    let kept = match (existing, origin) {
        (None, _) => None,
        (Some(reference), None) => Some((reference, recorded_origin)),
        (Some(reference), Some(origin)) => {
            let same_origin = recorded_origin == Some(origin) && origin != reference;
            (config.identity == IdentityPolicy::PreserveOnSameOrigin && same_origin)
                .then_some((reference, Some(origin)))
        }
    };

    match kept {
        Some((reference, origin_reference)) => Context {
            reference: reference.clone(),
            origin_reference: origin_reference.cloned(),
            created_at: previous.map_or(now, |c| c.created_at),
            updated_at: now,
            update_index: next_update_index(),
        },
        None => Context {
            reference: Reference::new(),
            origin_reference: origin.cloned(),
            created_at: now,
            updated_at: now,
            update_index: next_update_index(),
        },
    }
}

/// Re-track a whole tree: the root under `origin`, every descendant under its
/// parent. The returned table holds exactly the new records.
pub(crate) fn track<S>(tree: Tree<S>, origin: Option<&Reference>, config: &TrackConfig) -> Tree<S> {
    let (mut root, previous) = tree.into_parts();
    let mut contexts = ContextTable::new();
    track_node(&mut root, origin, &previous, &mut contexts, config);
    Tree::from_parts(root, contexts)
}

fn track_node<S>(
    node: &mut Node<S>,
    origin: Option<&Reference>,
    previous: &ContextTable,
    out: &mut ContextTable,
    config: &TrackConfig,
) {
    if !node.is_composite() {
        return;
    }
    let before = node.reference().and_then(|r| previous.get(r));
    let context = stamp(node.reference(), before, origin, config);
    let reference = context.reference.clone();
    node.set_reference(Some(reference.clone()));
    out.insert(context);

    for child in node.children_mut() {
        track_node(child, Some(&reference), previous, out, config);
    }
}

/// Deep-copy `target` and track it, optionally under `origin`.
pub fn make<S: Clone>(target: impl Into<Tree<S>>, origin: Option<&Tree<S>>) -> Result<Tree<S>> {
    make_with(target, origin, &TrackConfig::default())
}

pub fn make_with<S: Clone>(
    target: impl Into<Tree<S>>,
    origin: Option<&Tree<S>>,
    config: &TrackConfig,
) -> Result<Tree<S>> {
    let origin = origin
        .map(|o| o.reference().ok_or(CoreError::UntrackedOrigin))
        .transpose()?;
    let tracked = track(target.into(), origin, config);
    tracing::trace!(
        reference = ?tracked.reference(),
        origin = ?origin,
        contexts = tracked.contexts().len(),
        "tracked tree"
    );
    Ok(tracked)
}

/// Untracked deep copy of `tree`.
pub fn unmake<S: Clone>(tree: &Tree<S>) -> Node<S> {
    tree.stripped()
}

/// [`Tree::reference_index`] as a free function.
pub fn reference_index<S>(tree: &Tree<S>) -> crate::tree::ReferenceIndex<'_, S> {
    tree.reference_index()
}

/// Distinct origin references recorded for the tree's composites.
pub fn collect_origin_references<S>(tree: &Tree<S>) -> BTreeSet<Reference> {
    tree.root()
        .references()
        .into_iter()
        .filter_map(|r| tree.contexts().get(r))
        .filter_map(|c| c.origin_reference.clone())
        .collect()
}

/// Ascending order on `update_index`; untracked trees sort last.
pub fn order_by_oldest_update<S>(a: &Tree<S>, b: &Tree<S>) -> Ordering {
    let key = |t: &Tree<S>| t.update_index().unwrap_or(u64::MAX);
    key(a).cmp(&key(b))
}

/// Read-only guard over a tracked tree.
///
/// Writes whose first path segment is one of the protected top-level keys
/// fail with [`CoreError::ProtectedWrite`]; everything else passes through.
#[derive(Clone, Debug, PartialEq)]
pub struct Protected<S = crate::node::Scalar> {
    tree: Tree<S>,
    keys: BTreeSet<String>,
}

/// Protect the named top-level keys of a copy of `tree`.
pub fn protect<S, I, K>(tree: &Tree<S>, keys: I) -> Protected<S>
where
    S: Clone,
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    Protected {
        tree: tree.clone(),
        keys: keys.into_iter().map(Into::into).collect(),
    }
}

impl<S: Clone> Protected<S> {
    pub fn tree(&self) -> &Tree<S> {
        &self.tree
    }

    pub fn to_tree(&self) -> Tree<S> {
        self.tree.clone()
    }

    pub fn into_tree(self) -> Tree<S> {
        self.tree
    }

    pub fn is_protected(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn get(&self, path: &NodePath) -> Option<&Node<S>> {
        self.tree.get(path)
    }

    fn check(&self, top: Option<&PathSegment>) -> Result<()> {
        match top.map(PathSegment::to_key) {
            Some(key) if self.keys.contains(&key) => Err(CoreError::ProtectedWrite(key)),
            _ => Ok(()),
        }
    }

    pub fn set(&mut self, path: &NodePath, value: impl Into<Tree<S>>) -> Result<()> {
        self.check(path.first())?;
        self.tree.set(path, value)
    }

    pub fn attach(
        &mut self,
        parent: &NodePath,
        key: impl Into<PathSegment>,
        value: impl Into<Tree<S>>,
    ) -> Result<()> {
        let key = key.into();
        self.check(parent.first().or(Some(&key)))?;
        self.tree.attach(parent, key, value)
    }

    pub fn push(&mut self, path: &NodePath, value: impl Into<Tree<S>>) -> Result<()> {
        match path.first() {
            Some(_) => self.check(path.first())?,
            None => {
                let next = PathSegment::Index(self.tree.root().len());
                self.check(Some(&next))?;
            }
        }
        self.tree.push(path, value)
    }
}
