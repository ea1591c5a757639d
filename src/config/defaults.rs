//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::path::PathBuf;
use std::time::Duration;

/// Default number of retries after the first attempt.
pub const RETRY_MAX_RETRIES: u32 = 5;

/// Default initial retry delay in milliseconds.
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;

/// Default maximum retry delay in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 60_000;

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Jitter is on unless disabled.
pub const RETRY_JITTER: bool = true;

/// Default per-attempt HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default cap on stored history events.
pub const HISTORY_MAX_EVENTS: usize = 500;

/// Directory name used under the platform data directory.
pub const HISTORY_DIR_NAME: &str = "hookledger";

/// File name written by `init` when no output is given.
pub const CONFIG_FILE_NAME: &str = "hookledger.toml";

/// Default per-attempt HTTP timeout as Duration.
#[must_use]
pub const fn http_timeout() -> Duration {
    Duration::from_secs(HTTP_TIMEOUT_SECS)
}

/// Default history directory.
///
/// `<data dir>/hookledger` where the platform has a data directory, else
/// `./.hookledger`.
#[must_use]
pub fn history_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(format!(".{HISTORY_DIR_NAME}")),
        |dir| dir.join(HISTORY_DIR_NAME),
    )
}
