//! Configuration layer for hookledger.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! # Boolean Flag Semantics
//!
//! `--no-jitter` and `--ephemeral` only ever switch a feature off (or to
//! memory); without them the TOML value, then the default, applies.
//!
//! # CLI-Only vs TOML-Only Options
//!
//! Some options are TOML-only:
//! - `retry.max_delay_ms`, `retry.multiplier`
//! - `history.max_events`, `history.max_age_days`
//! - `http.timeout_secs`
//! - `triggers.zapier_url`

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod cli_tests;
#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command, TriggerArg};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{HistoryLocation, ValidatedConfig, write_default_config};
