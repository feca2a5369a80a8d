//! Download jobs and destination directory checks.

use std::path::{Path, PathBuf};

use super::filename;

/// One URL-to-file download. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    url: String,
    destination_dir: PathBuf,
}

impl DownloadJob {
    /// Creates a job downloading `url` into `destination_dir`.
    #[must_use]
    pub fn new(url: impl Into<String>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination_dir: destination_dir.into(),
        }
    }

    /// Returns the source URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the directory the file is written into.
    #[must_use]
    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    /// Returns the file name derived from the URL's last path segment.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        filename::filename_from_url(&self.url)
    }

    /// Returns the full destination path, if the URL yields a file name.
    #[must_use]
    pub fn destination_path(&self) -> Option<PathBuf> {
        filename::destination_path(&self.destination_dir, &self.url)
    }
}

/// Problems with the destination directory, detected before any job starts.
#[derive(Debug, thiserror::Error)]
pub enum DestinationError {
    /// The directory does not exist.
    #[error("download directory does not exist: {}", path.display())]
    Missing {
        /// The configured directory.
        path: PathBuf,
    },

    /// The path exists but is not a directory.
    #[error("download path is not a directory: {}", path.display())]
    NotDirectory {
        /// The configured path.
        path: PathBuf,
    },
}

/// Checks that `path` exists and is a directory.
///
/// # Errors
///
/// Returns [`DestinationError`] describing why the directory cannot be used.
pub fn validate_destination_dir(path: &Path) -> Result<(), DestinationError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(DestinationError::NotDirectory {
            path: path.to_path_buf(),
        }),
        Err(_) => Err(DestinationError::Missing {
            path: path.to_path_buf(),
        }),
    }
}
