//! Input validation: make sure the user-supplied path is a readable PDF.
//!
//! Checking the `%PDF` magic bytes up front gives the caller a precise error
//! ("not a PDF") instead of a generic parse failure from the PDF reader.

use crate::error::ExtractError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local file path: exists, readable, starts with `%PDF`.
pub fn resolve_local(path: &Path) -> Result<PathBuf, ExtractError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(ExtractError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(ExtractError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
