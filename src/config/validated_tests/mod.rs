//! Tests for validated configuration.

use std::time::Duration;

use super::ConfigError;
use super::cli::Cli;
use super::toml::TomlConfig;
use super::validated::{HistoryLocation, ValidatedConfig};

/// Helper to create CLI args from a slice; runs the `clear` subcommand.
fn cli(args: &[&str]) -> Cli {
    let mut full_args = vec!["hookledger", "clear"];
    full_args.extend(args);
    Cli::parse_from_iter(full_args)
}

/// Helper to parse TOML config
fn toml(content: &str) -> TomlConfig {
    TomlConfig::parse(content).unwrap()
}

mod validation_tests;
