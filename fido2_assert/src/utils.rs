use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::path::Path;

use thiserror::Error;

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(input.trim())
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))?;
    Ok(decoded)
}

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Reads a binary blob (credential id, key file) from disk.
///
/// An empty file is rejected: every blob this crate reads is meaningless
/// without content.
pub fn read_blob(path: impl AsRef<Path>) -> Result<Vec<u8>, UtilError> {
    let path = path.as_ref();
    let body = std::fs::read(path)
        .map_err(|e| UtilError::Io(format!("{}: {}", path.display(), e)))?;
    if body.is_empty() {
        return Err(UtilError::Format(format!("{}: empty file", path.display())));
    }
    tracing::trace!("Read {} bytes from {}", body.len(), path.display());
    Ok(body)
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid format: {0}")]
    Format(String),
}
