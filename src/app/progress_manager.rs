//! Terminal progress bars and download notices.

use std::path::Path;
use std::time::Duration;

use bulk_dl_core::download::{DownloadJob, DownloadObserver, FetchError, NoopProgress, ProgressSink};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner} {msg} {bytes} ({bytes_per_sec})";

/// Prints per-job notices to stdout and, when enabled, one bar per transfer.
pub(crate) struct TerminalObserver {
    multi: Option<MultiProgress>,
    quiet: bool,
}

impl TerminalObserver {
    pub(crate) fn new(show_progress: bool, quiet: bool) -> Self {
        Self {
            multi: show_progress.then(MultiProgress::new),
            quiet,
        }
    }

    fn notice(&self, message: &str) {
        if self.quiet {
            return;
        }
        // Bars redraw on stderr; suspend them so the line is not overwritten.
        match &self.multi {
            Some(multi) => multi.suspend(|| println!("{message}")),
            None => println!("{message}"),
        }
    }
}

impl DownloadObserver for TerminalObserver {
    fn progress_sink(&self, job: &DownloadJob) -> Box<dyn ProgressSink> {
        match &self.multi {
            Some(multi) => Box::new(BarSink::new(multi, job.file_name().unwrap_or(job.url()))),
            None => Box::new(NoopProgress),
        }
    }

    fn attempt_failed(&self, job: &DownloadJob, _attempt: u32, error: &FetchError) {
        self.notice(&format!("Error downloading {}: {error}", job.url()));
    }

    fn job_succeeded(&self, job: &DownloadJob, path: &Path, _bytes: u64) {
        let name = path
            .file_name()
            .map_or_else(|| job.url().to_string(), |n| n.to_string_lossy().into_owned());
        self.notice(&format!("Downloaded {name}"));
    }

    fn job_failed(&self, job: &DownloadJob, _attempts: u32) {
        self.notice(&format!(
            "Error downloading {}: maximum download attempts exceeded",
            job.url()
        ));
    }
}

/// One attempt's bar. Starts as a spinner until the total size is known.
struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    fn new(multi: &MultiProgress, name: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("Downloading {name}"));
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressSink for BarSink {
    fn report_total(&self, total: Option<u64>) {
        // Zero is treated like unknown: the server sent no usable length.
        if let Some(len) = total.filter(|len| *len > 0) {
            self.bar.disable_steady_tick();
            self.bar.set_length(len);
            self.bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
        }
    }

    fn report_progress(&self, bytes_so_far: u64) {
        self.bar.set_position(bytes_so_far);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}
