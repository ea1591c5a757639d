//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,

    /// History storage and retention
    #[serde(default)]
    pub history: HistorySection,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSection,

    /// Business event triggers
    #[serde(default)]
    pub triggers: TriggersSection,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Retries after the first attempt
    pub max_retries: Option<u32>,

    /// Initial retry delay in milliseconds
    pub initial_delay_ms: Option<u64>,

    /// Maximum retry delay in milliseconds
    pub max_delay_ms: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,

    /// Randomize delays
    pub jitter: Option<bool>,
}

/// History configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistorySection {
    /// Directory holding the history; `~` is expanded
    pub path: Option<String>,

    /// Maximum number of stored events
    pub max_events: Option<usize>,

    /// Drop events older than this many days
    pub max_age_days: Option<u64>,
}

/// HTTP client configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    /// Per-attempt timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Business event trigger section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggersSection {
    /// Zapier catch hook receiving business events
    pub zapier_url: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# hookledger configuration file

[retry]
# Retries after the first attempt (default: 5)
# max_retries = 5

# Initial retry delay in milliseconds (default: 1000)
# initial_delay_ms = 1000

# Maximum retry delay in milliseconds (default: 60000)
# max_delay_ms = 60000

# Backoff multiplier (default: 2.0)
# multiplier = 2.0

# Scale each delay by a random factor in [0.5, 1.5] (default: true)
# jitter = true

[history]
# Directory holding the delivery history; "~" expands to the home directory
# Default: the platform data directory, e.g. ~/.local/share/hookledger
# path = "~/.local/share/hookledger"

# Maximum number of stored events (default: 500)
# max_events = 500

# Drop events older than this many days (default: keep forever)
# max_age_days = 30

[http]
# Per-attempt timeout in seconds (default: 30)
# timeout_secs = 30

[triggers]
# Zapier catch hook receiving business events
# zapier_url = "https://hooks.zapier.com/hooks/catch/123456/abcdef/"
"#
    .to_string()
}
