//! Download engine: concurrent fan-out of retry-supervised jobs.
//!
//! [`DownloadEngine::run`] launches one Tokio task per URL. Every task runs
//! its own retry state machine and takes a [`ConcurrencyGate`] permit for the
//! duration of each fetch attempt, so at most `max_concurrency` transfers are
//! in flight regardless of how many jobs are waiting. The run returns once
//! every task reached a terminal state.
//!
//! # Example
//!
//! ```no_run
//! use bulk_dl_core::download::{DownloadEngine, HttpClient};
//! use bulk_dl_core::DownloadConfig;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DownloadConfig::from_path(Path::new("config.json"))?;
//! let engine = DownloadEngine::new(Arc::new(HttpClient::new()));
//! let stats = engine.run(&config, Path::new("./downloads")).await?;
//! println!("Completed: {}, Failed: {}", stats.completed(), stats.failed());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::client::Fetcher;
use super::gate::ConcurrencyGate;
use super::job::{DestinationError, DownloadJob, validate_destination_dir};
use super::progress::{DownloadObserver, NoopObserver};
use super::retry::{AttemptResult, JobState, RetryPolicy, RetryStateMachine};
use crate::config::DownloadConfig;

/// Error type for download engine operations.
///
/// Only raised before any job is launched; individual download failures
/// never surface here.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The destination directory cannot be used.
    #[error(transparent)]
    Destination(#[from] DestinationError),
}

/// Final state of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// The job's URL.
    pub url: String,
    /// Terminal state reached.
    pub state: JobState,
    /// Written file, for succeeded jobs.
    pub path: Option<PathBuf>,
}

/// Statistics from a download run.
#[derive(Debug, Default, Clone)]
pub struct DownloadStats {
    completed: usize,
    failed: usize,
    retried: usize,
    peak_concurrency: usize,
    reports: Vec<JobReport>,
}

impl DownloadStats {
    /// Returns the number of successfully completed downloads.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Returns the number of jobs that ended in `Failed`.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Returns the total number of jobs accounted for (completed + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }

    /// Returns the number of attempts beyond each job's first.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried
    }

    /// Returns the highest number of gate permits held at once during the run.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak_concurrency
    }

    /// Returns one report per launched job, in submission order.
    #[must_use]
    pub fn reports(&self) -> &[JobReport] {
        &self.reports
    }

    fn record(&mut self, report: JobReport) {
        match report.state {
            JobState::Succeeded { attempts } => {
                self.completed += 1;
                self.retried += attempts.saturating_sub(1) as usize;
            }
            JobState::Failed { attempts } => {
                self.failed += 1;
                self.retried += attempts.saturating_sub(1) as usize;
            }
            JobState::Pending | JobState::Attempting { .. } | JobState::Retrying { .. } => {
                warn!(url = %report.url, state = ?report.state, "job ended in non-terminal state");
                self.failed += 1;
            }
        }
        self.reports.push(report);
    }
}

/// Coordinates concurrent downloads with per-job retries.
///
/// # Concurrency Model
///
/// - Each job runs in its own Tokio task, all spawned up front
/// - A gate permit is acquired before each fetch attempt and released
///   when the attempt returns (RAII)
/// - Attempts of one job are strictly sequential, with no delay in between
/// - A failing job never cancels or delays its siblings
#[derive(Clone)]
pub struct DownloadEngine {
    fetcher: Arc<dyn Fetcher>,
    observer: Arc<dyn DownloadObserver>,
}

impl std::fmt::Debug for DownloadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadEngine").finish_non_exhaustive()
    }
}

impl DownloadEngine {
    /// Creates an engine using `fetcher` for every attempt and no observer.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Routes progress and per-job notices to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DownloadObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Downloads every URL of `config` into `destination_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Destination`] if `destination_dir` is missing or
    /// not a directory. Nothing is fetched in that case.
    ///
    /// Individual download failures do NOT cause this method to error; they
    /// are counted in the returned stats.
    #[instrument(skip(self, config), fields(destination = %destination_dir.display(), urls = config.urls().len()))]
    pub async fn run(
        &self,
        config: &DownloadConfig,
        destination_dir: &Path,
    ) -> Result<DownloadStats, EngineError> {
        validate_destination_dir(destination_dir)?;

        let jobs = config
            .urls()
            .iter()
            .map(|url| DownloadJob::new(url.clone(), destination_dir))
            .collect();
        let gate = Arc::new(ConcurrencyGate::new(config.max_concurrency()));
        let policy = RetryPolicy::with_max_attempts(config.max_attempts());

        Ok(self.run_jobs(jobs, gate, policy).await)
    }

    /// Runs prepared jobs through `gate` with `policy` and waits for all of them.
    ///
    /// Every spawned task is awaited exactly once; a task that panics is
    /// counted as failed.
    #[instrument(skip_all, fields(jobs = jobs.len(), capacity = gate.capacity(), max_attempts = policy.max_attempts()))]
    pub async fn run_jobs(
        &self,
        jobs: Vec<DownloadJob>,
        gate: Arc<ConcurrencyGate>,
        policy: RetryPolicy,
    ) -> DownloadStats {
        info!("starting downloads");

        let mut handles = Vec::with_capacity(jobs.len());
        for job in jobs {
            let url = job.url().to_string();
            let supervisor = JobSupervisor {
                fetcher: Arc::clone(&self.fetcher),
                observer: Arc::clone(&self.observer),
                gate: Arc::clone(&gate),
                policy: policy.clone(),
            };
            handles.push((url, tokio::spawn(supervisor.run(job))));
        }

        debug!(
            task_count = handles.len(),
            "waiting for downloads to complete"
        );

        let mut stats = DownloadStats::default();
        for (url, handle) in handles {
            match handle.await {
                Ok(report) => stats.record(report),
                Err(e) => {
                    warn!(url = %url, error = %e, "download task panicked");
                    stats.record(JobReport {
                        url,
                        state: JobState::Failed { attempts: 0 },
                        path: None,
                    });
                }
            }
        }
        stats.peak_concurrency = gate.peak_in_use();

        info!(
            completed = stats.completed(),
            failed = stats.failed(),
            retried = stats.retried(),
            total = stats.total(),
            peak_concurrency = stats.peak_concurrency(),
            "downloads finished"
        );
        stats
    }
}

/// Everything one job's task needs, moved into the task.
struct JobSupervisor {
    fetcher: Arc<dyn Fetcher>,
    observer: Arc<dyn DownloadObserver>,
    gate: Arc<ConcurrencyGate>,
    policy: RetryPolicy,
}

impl JobSupervisor {
    /// Drives `job` to `Succeeded` or `Failed`.
    #[instrument(skip_all, fields(url = %job.url()))]
    async fn run(self, job: DownloadJob) -> JobReport {
        let max_attempts = self.policy.max_attempts();
        let mut machine = RetryStateMachine::new(self.policy);

        while !machine.state().is_terminal() {
            let permit = match self.gate.acquire().await {
                Ok(permit) => permit,
                // Only reachable when an embedding caller closed the gate.
                Err(e) => {
                    warn!(error = %e, "cannot acquire download slot, giving up");
                    let state = machine.abort();
                    if let JobState::Failed { attempts } = state {
                        self.observer.job_failed(&job, attempts);
                    }
                    break;
                }
            };
            let Some(attempt) = machine.begin_attempt() else {
                break;
            };
            debug!(attempt, max_attempts, "attempting download");

            let sink = self.observer.progress_sink(&job);
            let result = self.fetcher.fetch(&job, sink.as_ref()).await;
            drop(permit);

            match result {
                Ok(outcome) => {
                    sink.finish();
                    machine.record(AttemptResult::Success);
                    info!(
                        attempt,
                        path = %outcome.path.display(),
                        bytes = outcome.bytes_written,
                        "download completed"
                    );
                    self.observer
                        .job_succeeded(&job, &outcome.path, outcome.bytes_written);
                    return JobReport {
                        url: job.url().to_string(),
                        state: machine.state(),
                        path: Some(outcome.path),
                    };
                }
                Err(e) => {
                    sink.abandon();
                    warn!(attempt, max_attempts, error = %e, "download attempt failed");
                    self.observer.attempt_failed(&job, attempt, &e);

                    if let JobState::Failed { attempts } = machine.record(AttemptResult::failure(&e))
                    {
                        warn!(attempts, "maximum download attempts exceeded");
                        self.observer.job_failed(&job, attempts);
                    }
                }
            }
        }

        JobReport {
            url: job.url().to_string(),
            state: machine.state(),
            path: None,
        }
    }
}
