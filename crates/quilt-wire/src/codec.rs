//! Compact text codec.
//!
//! Compact text is tagged with a short prefix:
//! - `qz1:` base64 of the lz4 block (size-prepended) of the JSON text
//! - `qj1:` the JSON text itself, used when compression does not shrink it

use crate::error::{Result, WireError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const COMPRESSED_PREFIX: &str = "qz1:";
pub const JSON_PREFIX: &str = "qj1:";

/// Encode JSON text, compressing when that makes it shorter.
pub fn compress(json: &str) -> String {
    let compressed = lz4_flex::compress_prepend_size(json.as_bytes());
    let encoded = STANDARD.encode(compressed);
    if encoded.len() < json.len() {
        format!("{COMPRESSED_PREFIX}{encoded}")
    } else {
        format!("{JSON_PREFIX}{json}")
    }
}

/// Inverse of [`compress`].
pub fn decompress(text: &str) -> Result<String> {
    if let Some(json) = text.strip_prefix(JSON_PREFIX) {
        return Ok(json.to_string());
    }
    let encoded = text
        .strip_prefix(COMPRESSED_PREFIX)
        .ok_or_else(|| WireError::InvalidWireFormat("missing compact prefix".into()))?;
    let compressed = STANDARD
        .decode(encoded)
        .map_err(|e| WireError::InvalidWireFormat(format!("base64: {e}")))?;
    let bytes = lz4_flex::decompress_size_prepended(&compressed)
        .map_err(|e| WireError::InvalidWireFormat(format!("lz4: {e}")))?;
    String::from_utf8(bytes).map_err(|e| WireError::InvalidWireFormat(format!("utf-8: {e}")))
}

/// Whether `text` carries one of the compact prefixes.
pub fn is_compact(text: &str) -> bool {
    text.starts_with(COMPRESSED_PREFIX) || text.starts_with(JSON_PREFIX)
}
