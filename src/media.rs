//! Helpers for media uploads headed to the public storage bucket.
//!
//! Keys are derived from the file's content hash so re-uploading the same
//! asset lands on the same object instead of accumulating duplicates.

use sha2::{Digest, Sha256};

/// File extensions the media library accepts.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "pdf"];

/// Lowercased extension of the uploaded filename, if it is on the
/// allow-list.
pub fn sanitized_extension(filename: &str) -> Option<String> {
    let extension = filename.rsplit_once('.')?.1.to_lowercase();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Some(extension)
    } else {
        None
    }
}

/// Content-addressed storage key: `{sha256}.{ext}`. Returns `None` for
/// filenames without an accepted extension.
pub fn storage_key(filename: &str, bytes: &[u8]) -> Option<String> {
    let extension = sanitized_extension(filename)?;
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Some(format!("{:x}.{}", hasher.finalize(), extension))
}
