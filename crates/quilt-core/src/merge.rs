//! Structural merge of two trees.
//!
//! - Sequences: tracked items matched by reference are merged in place, the
//!   remaining source items are appended in source order.
//! - Maps: key-wise union, the source overrides unless both sides hold
//!   composites, which recurse.
//! - Anything else: the source wins.

use crate::node::Node;
use crate::tree::Tree;
use indexmap::map::Entry;

/// Custom combination hook.
///
/// Consulted before the default policy for every pair of nodes the merge
/// visits; returning `None` falls back to the default.
pub trait Combiner<S> {
    fn combine(&self, target: &Node<S>, source: &Node<S>) -> Option<Node<S>>;
}

impl<S, F> Combiner<S> for F
where
    F: Fn(&Node<S>, &Node<S>) -> Option<Node<S>>,
{
    fn combine(&self, target: &Node<S>, source: &Node<S>) -> Option<Node<S>> {
        self(target, source)
    }
}

/// Merge `source` into a copy of `target`. Neither input is modified.
pub fn merge<S: Clone>(target: &Tree<S>, source: &Tree<S>) -> Tree<S> {
    merge_trees(target, source, None)
}

pub fn merge_with<S: Clone>(
    target: &Tree<S>,
    source: &Tree<S>,
    combiner: &dyn Combiner<S>,
) -> Tree<S> {
    merge_trees(target, source, Some(combiner))
}

/// Tree-level merge with an optional combiner. Contexts of both sides are
/// folded together and pruned to what the merged root still reaches.
pub fn merge_trees<S: Clone>(
    target: &Tree<S>,
    source: &Tree<S>,
    combiner: Option<&dyn Combiner<S>>,
) -> Tree<S> {
    let root = merge_nodes(target.root(), source.root(), combiner);
    let mut contexts = target.contexts().clone();
    contexts.absorb(source.contexts());
    let mut merged = Tree::from_parts(root, contexts);
    merged.prune();
    merged
}

/// Node-level merge used by [`merge`] and the reconciler.
pub fn merge_nodes<S: Clone>(
    target: &Node<S>,
    source: &Node<S>,
    combiner: Option<&dyn Combiner<S>>,
) -> Node<S> {
    if let Some(combined) = combiner.and_then(|c| c.combine(target, source)) {
        return combined;
    }

    match (target, source) {
        (
            Node::Seq { reference, items },
            Node::Seq {
                reference: source_reference,
                items: source_items,
            },
        ) => {
            let mut merged: Vec<Node<S>> = items
                .iter()
                .map(|item| match item.reference() {
                    Some(r) => match source_items.iter().find(|s| s.reference() == Some(r)) {
                        Some(matched) => merge_nodes(item, matched, combiner),
                        None => item.clone(),
                    },
                    None => item.clone(),
                })
                .collect();

            for item in source_items {
                let known = item
                    .reference()
                    .is_some_and(|r| items.iter().any(|t| t.reference() == Some(r)));
                if !known {
                    merged.push(item.clone());
                }
            }

            Node::Seq {
                reference: reference.clone().or_else(|| source_reference.clone()),
                items: merged,
            }
        }
        (
            Node::Map { reference, entries },
            Node::Map {
                reference: source_reference,
                entries: source_entries,
            },
        ) => {
            let mut merged = entries.clone();
            for (key, value) in source_entries {
                match merged.entry(key.clone()) {
                    Entry::Occupied(mut slot) => {
                        let next = if slot.get().is_composite() && value.is_composite() {
                            merge_nodes(slot.get(), value, combiner)
                        } else {
                            value.clone()
                        };
                        slot.insert(next);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(value.clone());
                    }
                }
            }

            Node::Map {
                reference: reference.clone().or_else(|| source_reference.clone()),
                entries: merged,
            }
        }
        _ => source.clone(),
    }
}
