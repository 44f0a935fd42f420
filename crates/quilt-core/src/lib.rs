//! # quilt-core
//!
//! Identity and provenance tracking for nested data.
//!
//! This crate provides:
//! - A closed node model (`Map`, `Seq`, `Leaf`) generic over the scalar type
//! - Per-composite references with a side table of contexts
//! - `make` / `unmake` / `protect` for tracked trees
//! - Structural merge that unions sequences by identity
//!
//! ## Example
//!
//! ```rust,ignore
//! use quilt_core::{make, NodePath, Tree};
//! use serde_json::json;
//!
//! let profile: Tree = make(json!({ "name": "Joe", "posts": [] }), None)?;
//! let posts = profile.subtree(&NodePath::parse("posts")).unwrap();
//!
//! // Produced independently, linked to the posts sequence
//! let post = make(json!({ "title": "A new post" }), Some(&posts))?;
//! assert_eq!(post.origin_reference(), posts.reference());
//! ```

pub mod clock;
pub mod context;
pub mod error;
pub mod merge;
pub mod node;
pub mod path;
pub mod reference;
pub mod tracked;
pub mod tree;

pub use context::{Context, ContextTable};
pub use error::{CoreError, Result};
pub use merge::{merge, merge_nodes, merge_trees, merge_with, Combiner};
pub use node::{Node, Scalar, Visit};
pub use path::{NodePath, PathSegment};
pub use reference::Reference;
pub use tracked::{
    collect_origin_references, inherit, make, make_with, order_by_oldest_update, protect,
    reference_index, unmake, IdentityPolicy, Protected, TrackConfig,
};
pub use tree::{ReferenceIndex, Tree};
