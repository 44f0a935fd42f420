//! Patch reconciliation.
//!
//! Patches are sorted oldest first, the main patch (the one that is nobody's
//! descendant) seeds the result, and the rest are drained from a worklist:
//!
//! - untracked patches are merged at the root
//! - patches whose reference or origin is already known are merged in place
//!   or grafted into the origin sequence
//! - anything else is requeued; a full pass without progress stops the loop

use crate::config::StitchConfig;
use crate::error::{Result, StitchError};
use quilt_core::{
    merge_nodes, merge_trees, order_by_oldest_update, Combiner, Node, Reference, Scalar, Tree,
    Visit,
};
use quilt_wire::Written;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

/// A patch in any of the accepted input forms.
#[derive(Clone, Debug, PartialEq)]
pub enum Incoming<S = Scalar> {
    Tree(Tree<S>),
    Written(Written),
    /// Wire text, or plain JSON treated as an untracked overlay.
    Text(String),
}

impl<S: DeserializeOwned> Incoming<S> {
    pub fn into_tree(self) -> Result<Tree<S>> {
        match self {
            Incoming::Tree(tree) => Ok(tree),
            Incoming::Written(written) => Ok(quilt_wire::read(&written)?),
            Incoming::Text(text) if quilt_wire::is_written(&text) => {
                Ok(quilt_wire::read_str(&text)?)
            }
            Incoming::Text(text) => {
                let value: serde_json::Value = serde_json::from_str(&text)?;
                Ok(Tree::from(Node::from_json(value)?))
            }
        }
    }
}

impl<S> From<Tree<S>> for Incoming<S> {
    fn from(tree: Tree<S>) -> Self {
        Incoming::Tree(tree)
    }
}

impl<S: Clone> From<&Tree<S>> for Incoming<S> {
    fn from(tree: &Tree<S>) -> Self {
        Incoming::Tree(tree.clone())
    }
}

impl<S> From<Written> for Incoming<S> {
    fn from(written: Written) -> Self {
        Incoming::Written(written)
    }
}

impl<S> From<String> for Incoming<S> {
    fn from(text: String) -> Self {
        Incoming::Text(text)
    }
}

impl<S> From<&str> for Incoming<S> {
    fn from(text: &str) -> Self {
        Incoming::Text(text.to_string())
    }
}

/// Outcome of a reconciliation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Report<S = Scalar> {
    /// The stitched tree; `None` when no main patch could be chosen.
    pub data: Option<Tree<S>>,
    /// Patches left over, in worklist order.
    pub unstitched: Vec<Tree<S>>,
    pub stitched_count: usize,
}

impl<S> Report<S> {
    pub fn is_complete(&self) -> bool {
        self.data.is_some() && self.unstitched.is_empty()
    }
}

/// Patch reconciler.
pub struct Stitcher<S = Scalar> {
    config: StitchConfig,
    combiner: Option<Box<dyn Combiner<S> + Send + Sync>>,
}

impl<S> Stitcher<S> {
    pub fn new() -> Self {
        Self::with_config(StitchConfig::default())
    }

    pub fn with_config(config: StitchConfig) -> Self {
        Self {
            config,
            combiner: None,
        }
    }

    /// Consult `combiner` before the default merge policy.
    pub fn with_combiner(mut self, combiner: impl Combiner<S> + Send + Sync + 'static) -> Self {
        self.combiner = Some(Box::new(combiner));
        self
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }
}

impl<S> Default for Stitcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Stitcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stitcher")
            .field("config", &self.config)
            .field("combiner", &self.combiner.is_some())
            .finish()
    }
}

impl<S: Clone + DeserializeOwned> Stitcher<S> {
    /// Reconcile `patches`, reporting what could not be placed.
    ///
    /// Only malformed input is an error here; a missing main patch or
    /// leftover patches show up in the [`Report`].
    pub fn report<I, P>(&self, patches: I) -> Result<Report<S>>
    where
        I: IntoIterator<Item = P>,
        P: Into<Incoming<S>>,
    {
        let mut sorted = patches
            .into_iter()
            .map(|p| p.into().into_tree())
            .collect::<Result<Vec<_>>>()?;
        sorted.sort_by(order_by_oldest_update);

        let Some(main) = find_main(&sorted, &self.config) else {
            tracing::warn!(patches = sorted.len(), "no main patch");
            return Ok(Report {
                data: None,
                unstitched: sorted,
                stitched_count: 0,
            });
        };

        let mut result = sorted.remove(main);
        let mut applied: BTreeSet<Reference> =
            result.reference_index().into_keys().cloned().collect();
        let mut versions: BTreeSet<(Reference, u64)> = version(&result).into_iter().collect();
        let mut stitched_count = 1;
        let mut worklist: VecDeque<Tree<S>> = sorted.into();
        let mut stale = 0;
        let combiner = self.combiner.as_deref().map(|c| c as &dyn Combiner<S>);

        tracing::debug!(
            main = ?result.reference(),
            pending = worklist.len(),
            "stitching patches"
        );

        while !worklist.is_empty() && stale < worklist.len() {
            let Some(patch) = worklist.pop_front() else {
                break;
            };

            let Some(reference) = patch.reference().cloned() else {
                result = merge_trees(&result, &patch, combiner);
                stitched_count += 1;
                stale = 0;
                continue;
            };

            let origin = patch.origin_reference().cloned();
            let known = applied.contains(&reference)
                || origin.as_ref().is_some_and(|o| applied.contains(o));
            if !known {
                worklist.push_back(patch);
                stale += 1;
                continue;
            }

            let key = version(&patch);
            if self.config.deduplicate && key.as_ref().is_some_and(|k| versions.contains(k)) {
                tracing::trace!(%reference, "skipping duplicate patch");
            } else {
                apply(&mut result, &patch, &reference, origin.as_ref(), combiner);
                applied.extend(patch.reference_index().into_keys().cloned());
                versions.extend(key);
            }
            stitched_count += 1;
            stale = 0;
        }

        let unstitched: Vec<Tree<S>> = worklist.into();
        if !unstitched.is_empty() {
            tracing::warn!(
                stitched = stitched_count,
                unstitched = unstitched.len(),
                "patch set is incomplete"
            );
        }

        Ok(Report {
            data: Some(result),
            unstitched,
            stitched_count,
        })
    }

    /// Like [`Stitcher::report`], but a missing main patch or any leftover
    /// patch is an error.
    pub fn stitch<I, P>(&self, patches: I) -> Result<Tree<S>>
    where
        I: IntoIterator<Item = P>,
        P: Into<Incoming<S>>,
    {
        let report = self.report(patches)?;
        match report.data {
            None => Err(StitchError::NoMainPatch),
            Some(_) if !report.unstitched.is_empty() => Err(StitchError::IncompletePatchSet {
                remaining: report.unstitched.len(),
            }),
            Some(data) => Ok(data),
        }
    }
}

/// Reconcile with the default configuration.
pub fn report<S, I, P>(patches: I) -> Result<Report<S>>
where
    S: Clone + DeserializeOwned,
    I: IntoIterator<Item = P>,
    P: Into<Incoming<S>>,
{
    Stitcher::new().report(patches)
}

/// Stitch with the default configuration.
pub fn stitch<S, I, P>(patches: I) -> Result<Tree<S>>
where
    S: Clone + DeserializeOwned,
    I: IntoIterator<Item = P>,
    P: Into<Incoming<S>>,
{
    Stitcher::new().stitch(patches)
}

fn version<S>(tree: &Tree<S>) -> Option<(Reference, u64)> {
    Some((tree.reference()?.clone(), tree.update_index()?))
}

/// Index of the main patch in `patches` (sorted oldest first).
///
/// A patch is a descendant when it is untracked, when its origin is known to
/// another patch, or when its reference appears below the root of another
/// patch. Among the remaining candidates (one per reference, the oldest)
/// root-shaped patches are preferred over attached ones.
fn find_main<S>(patches: &[Tree<S>], config: &StitchConfig) -> Option<usize> {
    let indexes: Vec<BTreeSet<&Reference>> = patches
        .iter()
        .map(|p| p.reference_index().into_keys().collect())
        .collect();

    let is_descendant = |i: usize| {
        let patch = &patches[i];
        let Some(reference) = patch.reference() else {
            return true;
        };
        let origin = patch.origin_reference();
        patches.iter().enumerate().any(|(j, other)| {
            j != i
                && (origin.is_some_and(|o| indexes[j].contains(o))
                    || (other.reference() != Some(reference) && indexes[j].contains(reference)))
        })
    };

    let mut seen = BTreeSet::new();
    let candidates: Vec<usize> = (0..patches.len())
        .filter(|&i| !is_descendant(i))
        .filter(|&i| patches[i].reference().is_some_and(|r| seen.insert(r)))
        .collect();

    let roots: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| patches[i].origin_reference().is_none())
        .collect();
    let pool = if roots.is_empty() { candidates } else { roots };

    match pool.as_slice() {
        [] => None,
        [only] => Some(*only),
        [first, ..] if !config.require_single_root => Some(*first),
        _ => None,
    }
}

/// Merge `patch` into every node of `result` it addresses.
fn apply<S: Clone>(
    result: &mut Tree<S>,
    patch: &Tree<S>,
    reference: &Reference,
    origin: Option<&Reference>,
    combiner: Option<&dyn Combiner<S>>,
) {
    let graft = Node::Seq {
        reference: None,
        items: vec![patch.root().clone()],
    };
    let mut touched = 0usize;

    result.root_mut().visit_mut(&mut |node| {
        if origin.is_some() && node.is_seq() && node.reference() == origin {
            *node = merge_nodes(node, &graft, combiner);
            touched += 1;
            Visit::Skip
        } else if node.reference() == Some(reference) {
            *node = merge_nodes(node, patch.root(), combiner);
            touched += 1;
            Visit::Skip
        } else {
            Visit::Descend
        }
    });

    if touched == 0 {
        tracing::warn!(%reference, ?origin, "patch did not match any node");
    }
    result.absorb_contexts(patch.contexts());
    result.prune();
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilt_core::{make, NodePath};
    use serde_json::json;

    #[test]
    fn test_find_main_prefers_root_over_orphan() {
        let root: Tree = make(json!([]), None).unwrap();
        let elsewhere: Tree = make(json!([]), None).unwrap();
        let orphan = make(json!({}), Some(&elsewhere)).unwrap();

        let patches = vec![root.clone(), orphan];
        assert_eq!(find_main(&patches, &StitchConfig::default()), Some(0));
    }

    #[test]
    fn test_find_main_needs_a_single_root() {
        let a: Tree = make(json!({}), None).unwrap();
        let b: Tree = make(json!({}), None).unwrap();
        let patches = vec![a, b];
        assert_eq!(find_main(&patches, &StitchConfig::default()), None);

        let relaxed = StitchConfig {
            require_single_root: false,
            ..StitchConfig::default()
        };
        assert_eq!(find_main(&patches, &relaxed), Some(0));
    }

    #[test]
    fn test_find_main_ignores_untracked() {
        let root: Tree = make(json!({}), None).unwrap();
        let overlay = Tree::from(json!({ "extra": 1 }));
        assert_eq!(
            find_main(&[overlay.clone(), root], &StitchConfig::default()),
            Some(1)
        );
        assert_eq!(find_main(&[overlay], &StitchConfig::default()), None);
    }

    #[test]
    fn test_find_main_same_root_twice() {
        let a: Tree = make(json!({ "surname": "Joe" }), None).unwrap();
        let b: Tree = make(&a, None).unwrap();
        assert_eq!(find_main(&[a, b], &StitchConfig::default()), Some(0));
    }

    #[test]
    fn test_apply_grafts_into_origin_sequence() {
        let mut list: Tree = make(json!({ "items": [] }), None).unwrap();
        let items = list.subtree(&NodePath::parse("items")).unwrap();
        let item = make(json!({ "name": "Joe" }), Some(&items)).unwrap();

        apply(
            &mut list,
            &item,
            item.reference().unwrap(),
            item.origin_reference(),
            None,
        );
        assert_eq!(
            list.stripped().to_json().unwrap(),
            json!({ "items": [{ "name": "Joe" }] })
        );
        assert!(list.contexts().contains(item.reference().unwrap()));
    }

    #[test]
    fn test_incoming_plain_text_is_untracked_overlay() {
        let tree: Tree = Incoming::from(r#"{"a":[1]}"#).into_tree().unwrap();
        assert!(!tree.is_tracked());
        assert_eq!(tree.stripped().to_json().unwrap(), json!({ "a": [1] }));

        let bad: Result<Tree> = Incoming::from("nope").into_tree();
        assert!(bad.is_err());
    }
}
