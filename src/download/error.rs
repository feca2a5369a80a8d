//! Error types for the download module.
//!
//! Every failed attempt surfaces as a [`FetchError`]. The retry supervisor
//! recovers from all of them locally, so these never reach the dispatcher.

use std::path::PathBuf;

use thiserror::Error;

/// Broad category of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport-level failure: request, connection, status or body streaming.
    Network,
    /// The destination file could not be created or written.
    Filesystem,
}

/// Errors that can occur during a single fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, body interrupted, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The URL cannot be requested or yields no usable filename.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// File system error while creating or writing the destination file.
    #[error("IO error writing to {path}: {source}")]
    Filesystem {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Returns the category this error belongs to.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } | Self::HttpStatus { .. } | Self::InvalidUrl { .. } => {
                FailureKind::Network
            }
            Self::Filesystem { .. } => FailureKind::Filesystem,
        }
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the
// url or path the source error does not carry.
