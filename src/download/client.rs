//! HTTP fetcher streaming one URL to one file.
//!
//! [`Fetcher`] is the seam between the retry supervisor and the network;
//! [`HttpClient`] is the reqwest-backed implementation used in production.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::CONNECT_TIMEOUT_SECS;
use super::error::FetchError;
use super::job::DownloadJob;
use super::progress::ProgressSink;
use crate::user_agent;

/// Result of a successful fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Final output path.
    pub path: PathBuf,
    /// Number of bytes written to the file.
    pub bytes_written: u64,
    /// Size declared by the server, when known.
    pub content_length: Option<u64>,
}

/// Performs one download attempt for one job.
///
/// Implementations must not leave a partially written destination file
/// behind when they return an error.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads `job` to its destination path, reporting bytes to `progress`.
    async fn fetch(
        &self,
        job: &DownloadJob,
        progress: &dyn ProgressSink,
    ) -> Result<FetchOutcome, FetchError>;
}

/// HTTP client for downloading files with streaming support.
///
/// Create once and share between jobs to reuse pooled connections.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with the default 30 second connect timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
    }

    /// Creates a client with an explicit connect timeout.
    ///
    /// No overall request timeout is set: a slow transfer runs to completion.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Wraps an already configured reqwest client.
    ///
    /// The caller's timeouts and headers are used as-is.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn send_request(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    /// Streams `job.url()` into `<destination_dir>/<last path segment>`.
    ///
    /// The file is created (or truncated) only after the server answered with
    /// a success status. If streaming fails midway the partial file is removed
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if the URL does not parse or has no file name
    /// - [`FetchError::Network`] / [`FetchError::HttpStatus`] for transport failures
    /// - [`FetchError::Filesystem`] if the file cannot be created or written
    #[instrument(skip(self, job, progress), fields(url = %job.url()))]
    async fn fetch(
        &self,
        job: &DownloadJob,
        progress: &dyn ProgressSink,
    ) -> Result<FetchOutcome, FetchError> {
        let url = job.url();
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        let file_path = job
            .destination_path()
            .ok_or_else(|| FetchError::invalid_url(url))?;

        let response = self.send_request(url).await?;
        let content_length = declared_length(&response);
        debug!(path = %file_path.display(), ?content_length, "response received");

        let mut file = File::create(&file_path)
            .await
            .map_err(|e| FetchError::filesystem(file_path.clone(), e))?;

        progress.report_total(content_length);
        let stream_result = stream_to_file(&mut file, response, url, &file_path, progress).await;
        drop(file);

        let bytes_written = match stream_result {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %file_path.display(), "cleaning up partial file after error");
                remove_partial(&file_path).await;
                return Err(e);
            }
        };

        debug!(path = %file_path.display(), bytes = bytes_written, "download complete");

        Ok(FetchOutcome {
            path: file_path,
            bytes_written,
            content_length,
        })
    }
}

/// Streams the response body to `file`, returning bytes written.
///
/// Kept separate so the caller can clean up on any error.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    progress: &dyn ProgressSink,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::filesystem(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
        progress.report_progress(bytes_written);
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::filesystem(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}

async fn remove_partial(file_path: &Path) {
    match tokio::fs::remove_file(file_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %file_path.display(), error = %e, "failed to remove partial file");
        }
    }
}

/// Reads the Content-Length header. Absent or unparsable means unknown.
fn declared_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}
