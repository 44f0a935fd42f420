//! Per-reference metadata records and the side table that holds them.

use crate::reference::Reference;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Identity and provenance of one tracked composite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub reference: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_reference: Option<Reference>,
    /// Milliseconds since the Unix epoch, set on first tracking.
    pub created_at: u64,
    pub updated_at: u64,
    /// Collision-free ordering key, refreshed on every re-tracking.
    pub update_index: u64,
}

/// Side table mapping each reference to its [`Context`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextTable(BTreeMap<Reference, Context>);

impl ContextTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &Reference) -> Option<&Context> {
        self.0.get(reference)
    }

    pub fn contains(&self, reference: &Reference) -> bool {
        self.0.contains_key(reference)
    }

    /// Install a record verbatim, replacing any previous one.
    pub fn insert(&mut self, context: Context) -> Option<Context> {
        self.0.insert(context.reference.clone(), context)
    }

    pub fn remove(&mut self, reference: &Reference) -> Option<Context> {
        self.0.remove(reference)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.0.values()
    }

    /// Fold another table into this one.
    ///
    /// For a reference present on both sides the earliest `created_at` is kept
    /// and every other field comes from the record with the higher
    /// `update_index`.
    pub fn absorb(&mut self, other: &ContextTable) {
        for incoming in other.iter() {
            match self.0.get_mut(&incoming.reference) {
                Some(existing) => {
                    let created_at = existing.created_at.min(incoming.created_at);
                    if incoming.update_index > existing.update_index {
                        *existing = incoming.clone();
                    }
                    existing.created_at = created_at;
                }
                None => {
                    self.insert(incoming.clone());
                }
            }
        }
    }

    /// Drop every record whose reference is not in `reachable`.
    pub fn retain_reachable<'a, I>(&mut self, reachable: I)
    where
        I: IntoIterator<Item = &'a Reference>,
    {
        let keep: BTreeSet<&Reference> = reachable.into_iter().collect();
        self.0.retain(|reference, _| keep.contains(reference));
    }
}

impl FromIterator<Context> for ContextTable {
    fn from_iter<T: IntoIterator<Item = Context>>(iter: T) -> Self {
        let mut table = ContextTable::new();
        for context in iter {
            table.insert(context);
        }
        table
    }
}
