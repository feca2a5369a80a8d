//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download every URL listed in a JSON config into an existing directory.
///
/// Transfers run concurrently up to `concurrent_downloads` at a time and each
/// URL is tried up to `download_attempts` times.
#[derive(Parser, Debug)]
#[command(name = "bulk-dl")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the JSON configuration file
    pub config: PathBuf,

    /// Existing directory to save downloaded files into
    pub download_dir: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress notices, progress bars and non-error logs
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable progress bars (notices are still printed)
    #[arg(long)]
    pub no_progress: bool,
}
