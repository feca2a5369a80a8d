//! Destination filename derivation.
//!
//! The file for a URL is named by the text after its last `/` (trailing
//! slashes ignored). Nothing is decoded or sanitized and query strings are
//! kept, so `http://host/a.bin?v=2` lands in `a.bin?v=2`.
//!
//! Two URLs ending in the same segment map to the same file; whichever
//! download writes last wins. This is deliberate and not deduplicated.

use std::path::{Path, PathBuf};

/// Returns the final path segment of `url`, or `None` if it has no usable one.
#[must_use]
pub fn filename_from_url(url: &str) -> Option<&str> {
    let trimmed = url.trim_end_matches('/');
    let name = trimmed.rsplit('/').next()?;
    match name {
        "" | "." | ".." => None,
        _ => Some(name),
    }
}

/// Joins `destination_dir` with the filename derived from `url`.
#[must_use]
pub fn destination_path(destination_dir: &Path, url: &str) -> Option<PathBuf> {
    filename_from_url(url).map(|name| destination_dir.join(name))
}
