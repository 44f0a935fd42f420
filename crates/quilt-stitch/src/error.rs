//! Error types for reconciliation.

use quilt_core::CoreError;
use quilt_wire::WireError;
use thiserror::Error;

/// Errors that can occur while stitching a patch set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StitchError {
    #[error("Cannot determine patch order: no single main patch")]
    NoMainPatch,

    #[error("Cannot stitch all patches: {remaining} left unresolved")]
    IncompletePatchSet { remaining: usize },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl From<serde_json::Error> for StitchError {
    fn from(err: serde_json::Error) -> Self {
        StitchError::Wire(WireError::from(err))
    }
}

pub type Result<T> = std::result::Result<T, StitchError>;
