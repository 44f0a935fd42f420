//! # quilt-stitch
//!
//! Reconciles independently produced patches into one tree.
//!
//! Patches may arrive in any order and may reference nodes created by
//! patches not yet seen. The reconciler sorts them by update index, picks
//! the main patch and drains the rest through a bounded-retry worklist.
//!
//! ## Example
//!
//! ```rust,ignore
//! use quilt_core::{make, NodePath, Tree};
//! use quilt_stitch::stitch;
//! use serde_json::json;
//!
//! let list: Tree = make(json!([]), None)?;
//! let item = make(json!({ "name": "Joe" }), Some(&list))?;
//!
//! let data: Tree = stitch([&item, &list])?;
//! assert_eq!(data.stripped().to_json()?, json!([{ "name": "Joe" }]));
//! ```

pub mod config;
pub mod error;
pub mod patches;
pub mod reconciler;

pub use config::{StitchConfig, StitchConfigBuilder};
pub use error::{Result, StitchError};
pub use patches::Patches;
pub use reconciler::{report, stitch, Incoming, Report, Stitcher};
