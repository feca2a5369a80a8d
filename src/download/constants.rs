//! Constants for the download module.

/// Default HTTP connect timeout (30 seconds).
///
/// Only connection establishment is bounded; a transfer in progress is never
/// cut short by a deadline.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts per URL when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
