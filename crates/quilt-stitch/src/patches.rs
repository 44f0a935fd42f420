//! An ordered collection of written patches.

use crate::error::{Result, StitchError};
use crate::reconciler::{report, stitch, Report};
use quilt_core::{Scalar, Tree};
use quilt_wire::codec;
use quilt_wire::{WireError, WriteOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Patches stored in their compact wire text.
pub struct Patches<S = Scalar> {
    items: Vec<String>,
    marker: PhantomData<fn() -> S>,
}

impl<S> Patches<S> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            marker: PhantomData,
        }
    }

    /// Store already-written text. Anything that is not wire output is
    /// rejected.
    pub fn push_text(&mut self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        if !quilt_wire::is_written(&text) {
            return Err(WireError::InvalidWireFormat("not a written patch".into()).into());
        }
        self.items.push(text);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// The whole collection as one compact text.
    pub fn write(&self) -> Result<String> {
        Ok(codec::compress(&serde_json::to_string(&self.items)?))
    }

    /// Inverse of [`Patches::write`].
    pub fn read(text: &str) -> Result<Self> {
        let json = codec::decompress(text)?;
        let items: Vec<String> = serde_json::from_str(&json)
            .map_err(|e| StitchError::from(WireError::InvalidWireFormat(e.to_string())))?;
        let mut patches = Self::new();
        for item in items {
            patches.push_text(item)?;
        }
        Ok(patches)
    }
}

impl<S: Serialize> Patches<S> {
    /// Write `tree` and store it.
    pub fn push(&mut self, tree: &Tree<S>) -> Result<()> {
        self.add([tree]).map(|_| ())
    }

    /// Write and store every tree, returning the texts that were stored.
    pub fn add<'a, I>(&mut self, trees: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = &'a Tree<S>>,
        S: 'a,
    {
        let written = trees
            .into_iter()
            .map(|tree| -> Result<String> {
                Ok(quilt_wire::write(tree, &WriteOptions::compact())?.to_text()?)
            })
            .collect::<Result<Vec<_>>>()?;
        self.items.extend(written.iter().cloned());
        Ok(written)
    }
}

impl<S: Clone + DeserializeOwned> Patches<S> {
    /// Decode every stored patch.
    pub fn trees(&self) -> Result<Vec<Tree<S>>> {
        self.iter()
            .map(|text| -> Result<Tree<S>> { Ok(quilt_wire::read_str(text)?) })
            .collect()
    }

    pub fn report(&self) -> Result<Report<S>> {
        report(self.iter())
    }

    pub fn stitch(&self) -> Result<Tree<S>> {
        stitch(self.iter())
    }
}

impl<S> Default for Patches<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for Patches<S> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            marker: PhantomData,
        }
    }
}

impl<S> PartialEq for Patches<S> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<S> fmt::Debug for Patches<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patches")
            .field("len", &self.items.len())
            .finish()
    }
}
