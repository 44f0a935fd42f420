//! # quilt-wire
//!
//! Wire serializer for tracked trees.
//!
//! A tree is flattened into a `Data` payload (the untracked projection) and a
//! `Contexts` sidecar keyed by dotted path. Compact output is prefixed JSON
//! text, lz4-compressed and base64-encoded whenever that is shorter.
//!
//! ## Example
//!
//! ```rust,ignore
//! use quilt_core::{make, Tree};
//! use quilt_wire::{read, write, WriteOptions};
//!
//! let tree: Tree = make(serde_json::json!({ "name": "Joe" }), None)?;
//! let written = write(&tree, &WriteOptions::default())?;
//! let back: Tree = read(&written)?;
//! assert_eq!(back, tree);
//! ```

pub mod codec;
pub mod error;
pub mod wire;

pub use error::{Result, WireError};
pub use wire::{
    from_form, is_written, is_written_value, read, read_str, read_value, to_form, write, Format,
    WireForm, WriteOptions, Written,
};
