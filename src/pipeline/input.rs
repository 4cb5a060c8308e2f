//! Input resolution: validate the user-supplied document path.
//!
//! The checks run before any backend is exercised so that a typo'd path or
//! a stray non-PDF fails with a named error instead of a pdfium crash
//! three stages later. The `%PDF` magic check catches the common case of
//! pointing the tool at the raw-text artifact of a previous run.

use crate::error::ShuddhiError;
use std::path::PathBuf;
use tracing::debug;

/// Resolve a document path, validating existence, readability, and PDF
/// magic bytes.
pub fn resolve_document(path_str: &str) -> Result<PathBuf, ShuddhiError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ShuddhiError::DocumentNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(ShuddhiError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ShuddhiError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ShuddhiError::DocumentNotFound { path });
        }
    }

    debug!("resolved document: {}", path.display());
    Ok(path)
}
