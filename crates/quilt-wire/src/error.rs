//! Error types for the wire format.

use thiserror::Error;

/// Errors that can occur while writing or reading wire forms.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WireError {
    #[error("Invalid wire format: {0}")]
    InvalidWireFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        WireError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
