use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result};
use bulk_dl_core::{
    DownloadConfig, DownloadEngine, DownloadStats, HttpClient, validate_destination_dir,
};
use tracing::{debug, info};

use crate::app::progress_manager::TerminalObserver;
use crate::app::terminal;
use crate::cli::Args;

/// Validates inputs, loads the config and downloads every URL.
///
/// Fatal errors (missing directory, unreadable or invalid config) are
/// returned before any request is made. Per-URL failures are only reported
/// through notices and never make this function fail.
pub(crate) async fn run_downloader(args: Args) -> Result<DownloadStats> {
    terminal::init_tracing(terminal::default_log_level(args.verbose, args.quiet));
    debug!(?args, "CLI arguments parsed");

    validate_destination_dir(&args.download_dir).context("invalid download directory")?;

    let config = DownloadConfig::from_path(&args.config)
        .with_context(|| format!("error reading config {}", args.config.display()))?;

    info!(
        urls = config.urls().len(),
        concurrent_downloads = config.max_concurrency(),
        download_attempts = config.max_attempts(),
        "starting bulk download"
    );

    let show_progress = terminal::should_show_progress(
        io::stderr().is_terminal(),
        args.quiet,
        args.no_progress,
        terminal::is_dumb_terminal(),
    );
    let observer = Arc::new(TerminalObserver::new(show_progress, args.quiet));
    let engine = DownloadEngine::new(Arc::new(HttpClient::new())).with_observer(observer);

    let stats = engine.run(&config, &args.download_dir).await?;

    info!(
        completed = stats.completed(),
        failed = stats.failed(),
        retried = stats.retried(),
        total = stats.total(),
        "bulk download finished"
    );

    Ok(stats)
}
