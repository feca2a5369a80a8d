//! Concurrent HTTP download engine.
//!
//! This module fetches a list of URLs into a directory with a global cap on
//! simultaneous transfers and a bounded number of attempts per URL.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Global concurrency gate shared by every job ([`ConcurrencyGate`])
//! - Explicit per-job retry state machine ([`RetryStateMachine`])
//! - Partial files removed whenever an attempt fails midway
//! - Progress and notices through observer traits ([`DownloadObserver`])
//!
//! # Example
//!
//! ```no_run
//! use bulk_dl_core::download::{DownloadJob, Fetcher, HttpClient, NoopProgress};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let job = DownloadJob::new("https://example.com/file.bin", "./downloads");
//! let outcome = client.fetch(&job, &NoopProgress).await?;
//! println!("Downloaded: {}", outcome.path.display());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
pub mod filename;
mod gate;
mod job;
mod progress;
mod retry;

pub use client::{FetchOutcome, Fetcher, HttpClient};
pub use constants::{CONNECT_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS};
pub use engine::{DownloadEngine, DownloadStats, EngineError, JobReport};
pub use error::{FailureKind, FetchError};
pub use gate::{ConcurrencyGate, GateError, GatePermit};
pub use job::{DestinationError, DownloadJob, validate_destination_dir};
pub use progress::{DownloadObserver, NoopObserver, NoopProgress, ProgressSink};
pub use retry::{AttemptResult, JobState, RetryPolicy, RetryStateMachine};

// Note: no module-local Result alias. Use `Result<T, FetchError>` explicitly.
