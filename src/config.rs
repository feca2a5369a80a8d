//! Download list configuration.
//!
//! The configuration file is JSON:
//!
//! ```json
//! {
//!   "concurrent_downloads": 2,
//!   "download_attempts": 3,
//!   "urls": ["<http://host/a.bin>", "http://host/b.bin"]
//! }
//! ```
//!
//! URLs may be wrapped in `<...>`; the brackets are stripped on load.
//! Unknown fields are ignored and a missing `urls` means an empty list.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The content is not valid configuration JSON.
    #[error("failed to parse config: {source}")]
    Parse {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid config value for `{field}`: {value}. Expected {expected}")]
    Invalid {
        /// Name of the offending field as it appears in the file.
        field: &'static str,
        /// The rejected value.
        value: u64,
        /// Human-readable description of the allowed range.
        expected: &'static str,
    },
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    concurrent_downloads: u64,
    download_attempts: u64,
    #[serde(default)]
    urls: Vec<String>,
}

/// Validated configuration for one run. Read-only after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    max_concurrency: usize,
    max_attempts: u32,
    urls: Vec<String>,
}

impl DownloadConfig {
    /// Builds a configuration from already parsed values.
    ///
    /// URLs are trimmed of wrapping `<` / `>` characters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if either limit is zero or too large.
    pub fn new(
        max_concurrency: u64,
        max_attempts: u64,
        urls: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, ConfigError> {
        let max_concurrency = usize::try_from(max_concurrency)
            .ok()
            .filter(|value| *value >= 1)
            .ok_or(ConfigError::Invalid {
                field: "concurrent_downloads",
                value: max_concurrency,
                expected: "a positive integer",
            })?;
        let max_attempts = u32::try_from(max_attempts)
            .ok()
            .filter(|value| *value >= 1)
            .ok_or(ConfigError::Invalid {
                field: "download_attempts",
                value: max_attempts,
                expected: "a positive integer no larger than 4294967295",
            })?;
        let urls = urls
            .into_iter()
            .map(|url| trim_delimiters(url.as_ref()).to_string())
            .collect();

        Ok(Self {
            max_concurrency,
            max_attempts,
            urls,
        })
    }

    /// Parses and validates a JSON configuration string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or missing fields and
    /// [`ConfigError::Invalid`] for out-of-range limits.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse { source })?;
        Self::new(raw.concurrent_downloads, raw.download_attempts, raw.urls)
    }

    /// Reads, parses and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise the
    /// errors of [`from_json_str`](Self::from_json_str).
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        debug!(
            path = %path.display(),
            max_concurrency = config.max_concurrency,
            max_attempts = config.max_attempts,
            urls = config.urls.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Maximum number of simultaneous transfers.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Maximum number of fetches per URL.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// URLs to download, in file order, delimiters already stripped.
    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

/// Strips every leading and trailing `<` or `>`.
fn trim_delimiters(url: &str) -> &str {
    url.trim_matches(|c| c == '<' || c == '>')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_parses_and_trims_urls() {
        let config = DownloadConfig::from_json_str(
            r#"{
                "concurrent_downloads": 2,
                "download_attempts": 3,
                "urls": ["<http://host/a.bin>", "http://host/b.bin"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.max_concurrency(), 2);
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.urls(), ["http://host/a.bin", "http://host/b.bin"]);
    }

    #[test]
    fn test_config_trims_one_sided_and_repeated_delimiters() {
        assert_eq!(trim_delimiters("<http://host/a.bin"), "http://host/a.bin");
        assert_eq!(trim_delimiters("http://host/a.bin>"), "http://host/a.bin");
        assert_eq!(trim_delimiters("<<http://host/a.bin>>"), "http://host/a.bin");
        assert_eq!(trim_delimiters("http://host/<a>.bin"), "http://host/<a>.bin");
    }

    #[test]
    fn test_config_missing_urls_is_empty() {
        let config =
            DownloadConfig::from_json_str(r#"{"concurrent_downloads": 1, "download_attempts": 1}"#)
                .unwrap();
        assert!(config.urls().is_empty());
    }

    #[test]
    fn test_config_ignores_unknown_fields() {
        let config = DownloadConfig::from_json_str(
            r#"{"concurrent_downloads": 1, "download_attempts": 1, "urls": [], "comment": "x"}"#,
        );
        assert!(config.is_ok());
    }

    #[test]
    fn test_config_zero_concurrency_rejected() {
        let result = DownloadConfig::from_json_str(
            r#"{"concurrent_downloads": 0, "download_attempts": 3, "urls": []}"#,
        );
        match result {
            Err(ConfigError::Invalid { field, value, .. }) => {
                assert_eq!(field, "concurrent_downloads");
                assert_eq!(value, 0);
            }
            other => panic!("Expected Invalid error, got: {other:?}"),
        }
    }

    #[test]
    fn test_config_zero_attempts_rejected() {
        let result = DownloadConfig::from_json_str(
            r#"{"concurrent_downloads": 1, "download_attempts": 0, "urls": []}"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "download_attempts",
                ..
            })
        ));
    }

    #[test]
    fn test_config_negative_value_is_parse_error() {
        let result = DownloadConfig::from_json_str(
            r#"{"concurrent_downloads": -1, "download_attempts": 1, "urls": []}"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_config_missing_limit_is_parse_error() {
        let result = DownloadConfig::from_json_str(r#"{"download_attempts": 1, "urls": []}"#);
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("concurrent_downloads"));
    }

    #[test]
    fn test_config_malformed_json_is_parse_error() {
        let result = DownloadConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_config_from_path_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"concurrent_downloads": 4, "download_attempts": 2, "urls": ["<http://h/x>"]}"#,
        )
        .unwrap();

        let config = DownloadConfig::from_path(&path).unwrap();
        assert_eq!(config.max_concurrency(), 4);
        assert_eq!(config.urls(), ["http://h/x"]);
    }

    #[test]
    fn test_config_from_path_missing_file_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        let err = DownloadConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.json"));
    }
}
