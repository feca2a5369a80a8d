//! Bulk Download Core Library
//!
//! This library fetches a list of remote resources into a local directory
//! under a global concurrency limit, retrying each resource a bounded number
//! of times and reporting live progress.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - JSON download list and limits
//! - [`download`] - Concurrency gate, HTTP fetcher, retry supervisor and dispatcher

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, DownloadConfig};
pub use download::{
    ConcurrencyGate, DownloadEngine, DownloadJob, DownloadObserver, DownloadStats, EngineError,
    FetchError, Fetcher, HttpClient, NoopObserver, ProgressSink, RetryPolicy,
    validate_destination_dir,
};
