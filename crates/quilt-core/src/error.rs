//! Error types for tracked trees.

use thiserror::Error;

/// Errors that can occur while tracking or editing a tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Origin tree is not tracked")]
    UntrackedOrigin,

    #[error("Attempted to write protected key: {0}")]
    ProtectedWrite(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a container: {0}")]
    NotAContainer(String),

    #[error("Invalid key {key} for container at {path}")]
    InvalidKey { path: String, key: String },

    #[error("Invalid index: {index} (length: {length})")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
