//! Observer interfaces for progress and per-job notices.
//!
//! The engine never renders anything itself. It reports byte counts to a
//! [`ProgressSink`] and lifecycle notices to a [`DownloadObserver`]; both
//! are purely observational and a run behaves the same with [`NoopObserver`].

use std::path::Path;

use super::{DownloadJob, FetchError};

/// Receives byte-level progress for one fetch attempt.
pub trait ProgressSink: Send + Sync {
    /// Declared size of the body. `None` when the server did not send a length.
    fn report_total(&self, total: Option<u64>);

    /// Cumulative number of bytes written so far.
    fn report_progress(&self, bytes_so_far: u64);

    /// The attempt finished writing the whole body.
    fn finish(&self) {}

    /// The attempt failed; the sink will receive no more updates.
    fn abandon(&self) {}
}

/// Sink that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report_total(&self, _total: Option<u64>) {}

    fn report_progress(&self, _bytes_so_far: u64) {}
}

/// Receives per-attempt and per-job notices from the retry supervisor.
pub trait DownloadObserver: Send + Sync {
    /// Returns a fresh progress sink for the next attempt of `job`.
    fn progress_sink(&self, _job: &DownloadJob) -> Box<dyn ProgressSink> {
        Box::new(NoopProgress)
    }

    /// Attempt number `attempt` (1-based) failed. Informational only.
    fn attempt_failed(&self, _job: &DownloadJob, _attempt: u32, _error: &FetchError) {}

    /// The job finished and its file is complete on disk.
    fn job_succeeded(&self, _job: &DownloadJob, _path: &Path, _bytes: u64) {}

    /// The job used up all of its attempts.
    fn job_failed(&self, _job: &DownloadJob, _attempts: u32) {}
}

/// Observer that ignores every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DownloadObserver for NoopObserver {}
