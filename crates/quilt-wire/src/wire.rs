//! Data payload plus per-path context sidecar.
//!
//! ```text
//! {
//!   "Data":     { "name": "Joe", "posts": [] },
//!   "Contexts": { "": { "reference": ... }, "posts": { ... } }
//! }
//! ```
//!
//! Sidecar keys are dotted [`NodePath`] strings with `""` for the root. Map
//! keys that would clash with the dotted form (`""`, `"a.b"`, `"~"`) are
//! escaped by the path printer, so every key reads back at the same node.

use crate::codec;
use crate::error::{Result, WireError};
use quilt_core::{Context, ContextTable, Node, NodePath, Tree};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DATA_FIELD: &str = "Data";
pub const CONTEXTS_FIELD: &str = "Contexts";

/// Literal wire payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireForm {
    #[serde(rename = "Data")]
    pub data: Value,
    #[serde(rename = "Contexts")]
    pub contexts: BTreeMap<String, Context>,
}

/// Output mode of [`write`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// The payload object as is.
    Literal,
    /// Prefixed and (when it helps) compressed JSON text.
    #[default]
    Compact,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    pub format: Format,
}

impl WriteOptions {
    pub fn literal() -> Self {
        Self {
            format: Format::Literal,
        }
    }

    pub fn compact() -> Self {
        Self {
            format: Format::Compact,
        }
    }
}

/// Result of [`write`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Written {
    Literal(WireForm),
    Compact(String),
}

impl Written {
    /// Text form: JSON for literal payloads, the prefixed string otherwise.
    pub fn to_text(&self) -> Result<String> {
        match self {
            Written::Literal(form) => Ok(serde_json::to_string(form)?),
            Written::Compact(text) => Ok(text.clone()),
        }
    }
}

/// Flatten a tree into its wire form.
///
/// Untracked trees are accepted and produce an empty sidecar.
pub fn write<S: Serialize>(tree: &Tree<S>, options: &WriteOptions) -> Result<Written> {
    let form = to_form(tree)?;
    let written = match options.format {
        Format::Literal => Written::Literal(form),
        Format::Compact => Written::Compact(codec::compress(&serde_json::to_string(&form)?)),
    };
    tracing::debug!(
        reference = ?tree.reference(),
        format = ?options.format,
        "wrote tree"
    );
    Ok(written)
}

/// Build the literal payload for `tree`.
pub fn to_form<S: Serialize>(tree: &Tree<S>) -> Result<WireForm> {
    let data = tree.root().to_json()?;
    let mut contexts = BTreeMap::new();
    tree.root().walk(&mut |path, node| {
        if let Some(reference) = node.reference() {
            match tree.contexts().get(reference) {
                Some(context) => {
                    contexts.insert(path.to_string(), context.clone());
                }
                None => tracing::warn!(%reference, %path, "reference without context"),
            }
        }
    });
    Ok(WireForm { data, contexts })
}

/// Restore a tree from any wire form.
pub fn read<S: DeserializeOwned>(written: &Written) -> Result<Tree<S>> {
    match written {
        Written::Literal(form) => from_form(form.clone()),
        Written::Compact(text) => read_str(text),
    }
}

/// Restore a tree from compact text or literal JSON text.
pub fn read_str<S: DeserializeOwned>(text: &str) -> Result<Tree<S>> {
    let json = if codec::is_compact(text) {
        codec::decompress(text)?
    } else {
        text.to_string()
    };
    let value: Value = serde_json::from_str(&json)
        .map_err(|e| WireError::InvalidWireFormat(format!("not JSON: {e}")))?;
    read_value(value)
}

/// Restore a tree from a literal payload object, or from a JSON string
/// holding compact text.
pub fn read_value<S: DeserializeOwned>(value: Value) -> Result<Tree<S>> {
    if let Value::String(text) = &value {
        if codec::is_compact(text) {
            return read_str(text);
        }
    }
    if value.get(CONTEXTS_FIELD).is_none() {
        return Err(WireError::InvalidWireFormat(format!(
            "expected an object with a {CONTEXTS_FIELD} field"
        )));
    }
    let form: WireForm = serde_json::from_value(value)
        .map_err(|e| WireError::InvalidWireFormat(e.to_string()))?;
    from_form(form)
}

/// Rebuild the tree and install every sidecar context at its path.
pub fn from_form<S: DeserializeOwned>(form: WireForm) -> Result<Tree<S>> {
    let mut root: Node<S> = Node::from_json(form.data)
        .map_err(|e| WireError::InvalidWireFormat(format!("data: {e}")))?;
    let mut table = ContextTable::new();

    for (path, context) in form.contexts {
        let node = root
            .get_mut(&NodePath::parse(&path))
            .filter(|node| node.is_composite())
            .ok_or_else(|| {
                WireError::InvalidWireFormat(format!("no composite at context path {path:?}"))
            })?;
        node.set_reference(Some(context.reference.clone()));
        table.insert(context);
    }

    Ok(Tree::from_parts(root, table))
}

/// Whether `text` is compact output of [`write`] or a literal payload.
pub fn is_written(text: &str) -> bool {
    if codec::is_compact(text) {
        return true;
    }
    serde_json::from_str::<Value>(text).is_ok_and(|v| is_written_value(&v))
}

pub fn is_written_value(value: &Value) -> bool {
    match value {
        Value::String(text) => codec::is_compact(text),
        Value::Object(map) => map.contains_key(CONTEXTS_FIELD),
        _ => false,
    }
}
