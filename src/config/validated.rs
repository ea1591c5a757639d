//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::history::RetentionPolicy;
use crate::webhook::{RetryPolicy, mask_url, sanitize_url};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Where the delivery history lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryLocation {
    /// In memory for the lifetime of the process.
    Ephemeral,
    /// One JSON file per key inside this directory.
    Directory(PathBuf),
}

impl fmt::Display for HistoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ephemeral => f.write_str("memory"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Retry policy for webhook deliveries
    pub retry_policy: RetryPolicy,

    /// History backend
    pub history: HistoryLocation,

    /// History retention
    pub retention: RetentionPolicy,

    /// Per-attempt HTTP timeout
    pub http_timeout: Duration,

    /// Zapier hook for business events, whitespace removed
    pub zapier_url: Option<String>,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zapier = self
            .zapier_url
            .as_deref()
            .map_or_else(|| "none".to_string(), mask_url);
        let max_events = self
            .retention
            .max_events
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string());

        write!(
            f,
            "Config {{ retry: {}x/{}ms (max {}ms, x{}, jitter: {}), history: {}, \
             max_events: {}, timeout: {}s, zapier: {} }}",
            self.retry_policy.max_retries,
            self.retry_policy.initial_delay.as_millis(),
            self.retry_policy.max_delay.as_millis(),
            self.retry_policy.multiplier,
            self.retry_policy.jitter,
            self.history,
            max_events,
            self.http_timeout.as_secs(),
            zapier,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Retry delays are zero or inconsistent
    /// - The multiplier is not a positive finite number
    /// - The HTTP timeout or history cap is zero
    /// - The Zapier URL is not a valid http(s) URL
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let retry_policy = Self::build_retry_policy(cli, toml)?;
        let history = Self::resolve_history(cli, toml);
        let retention = Self::build_retention(toml)?;
        let http_timeout = Self::resolve_http_timeout(toml)?;
        let zapier_url = Self::resolve_zapier_url(toml)?;

        Ok(Self {
            retry_policy,
            history,
            retention,
            http_timeout,
            zapier_url,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        // Priority: CLI explicit > TOML > default
        let max_retries = cli
            .retry_max
            .or_else(|| retry.and_then(|r| r.max_retries))
            .unwrap_or(defaults::RETRY_MAX_RETRIES);

        let initial_delay_ms = cli
            .retry_delay
            .or_else(|| retry.and_then(|r| r.initial_delay_ms))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_MS);

        let max_delay_ms = retry
            .and_then(|r| r.max_delay_ms)
            .unwrap_or(defaults::RETRY_MAX_DELAY_MS);

        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);

        // --no-jitter only disables
        let jitter = !cli.no_jitter
            && retry
                .and_then(|r| r.jitter)
                .unwrap_or(defaults::RETRY_JITTER);

        if initial_delay_ms == 0 {
            return Err(ConfigError::InvalidRetry(
                "initial_delay_ms must be greater than 0".to_string(),
            ));
        }

        if max_delay_ms < initial_delay_ms {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay_ms ({max_delay_ms}) must be >= initial_delay_ms ({initial_delay_ms})"
            )));
        }

        RetryPolicy::new()
            .with_max_retries(max_retries)
            .with_initial_delay(Duration::from_millis(initial_delay_ms))
            .with_max_delay(Duration::from_millis(max_delay_ms))
            .with_jitter(jitter)
            .with_multiplier(multiplier)
            .map_err(|e| ConfigError::InvalidRetry(e.to_string()))
    }

    fn resolve_history(cli: &Cli, toml: Option<&TomlConfig>) -> HistoryLocation {
        if cli.ephemeral {
            return HistoryLocation::Ephemeral;
        }

        // CLI takes precedence
        if let Some(ref dir) = cli.history_dir {
            return HistoryLocation::Directory(dir.clone());
        }

        let dir = toml
            .and_then(|t| t.history.path.as_deref())
            .map_or_else(defaults::history_dir, expand_tilde);
        HistoryLocation::Directory(dir)
    }

    fn build_retention(toml: Option<&TomlConfig>) -> Result<RetentionPolicy, ConfigError> {
        let history = toml.map(|t| &t.history);

        let max_events = history
            .and_then(|h| h.max_events)
            .unwrap_or(defaults::HISTORY_MAX_EVENTS);

        if max_events == 0 {
            return Err(ConfigError::InvalidHistory(
                "max_events must be greater than 0".to_string(),
            ));
        }

        let mut retention = RetentionPolicy::unbounded().with_max_events(max_events);

        if let Some(days) = history.and_then(|h| h.max_age_days) {
            if days == 0 {
                return Err(ConfigError::InvalidDuration {
                    field: field::HISTORY_MAX_AGE,
                    reason: "must be greater than 0".to_string(),
                });
            }
            let secs = days
                .checked_mul(SECS_PER_DAY)
                .ok_or_else(|| ConfigError::InvalidDuration {
                    field: field::HISTORY_MAX_AGE,
                    reason: "too large".to_string(),
                })?;
            retention = retention.with_max_age(Duration::from_secs(secs));
        }

        Ok(retention)
    }

    fn resolve_http_timeout(toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        match toml.and_then(|t| t.http.timeout_secs) {
            None => Ok(defaults::http_timeout()),
            Some(0) => Err(ConfigError::InvalidDuration {
                field: field::HTTP_TIMEOUT,
                reason: "must be greater than 0".to_string(),
            }),
            Some(seconds) => Ok(Duration::from_secs(seconds)),
        }
    }

    fn resolve_zapier_url(toml: Option<&TomlConfig>) -> Result<Option<String>, ConfigError> {
        let Some(raw) = toml.and_then(|t| t.triggers.zapier_url.as_deref()) else {
            return Ok(None);
        };

        let url = sanitize_url(raw);
        if url.is_empty() {
            return Ok(None);
        }

        let parsed = url::Url::parse(&url).map_err(|e| ConfigError::InvalidUrl {
            field: field::ZAPIER_URL,
            url: mask_url(&url),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                field: field::ZAPIER_URL,
                url: mask_url(&url),
                reason: "scheme must be http or https".to_string(),
            });
        }

        Ok(Some(url))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Expands a leading `~` to the home directory.
///
/// Paths without `~`, or with no known home directory, are returned as is.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => Some(""),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => Some(&rest[1..]),
        _ => None,
    };

    match (rest, dirs::home_dir()) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
