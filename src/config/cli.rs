//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::history::{DEFAULT_EVENT_TYPE, EventStatus};
use crate::trigger::BusinessEvent;
use crate::webhook::WebhookKind;

/// hookledger: outbound webhook dispatcher
///
/// Delivers JSON payloads to webhook endpoints with exponential backoff
/// and keeps an auditable history of every dispatch.
#[derive(Debug, Parser)]
#[command(name = "hookledger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the delivery history
    #[arg(long = "history-dir", global = true, value_name = "DIR")]
    pub history_dir: Option<PathBuf>,

    /// Keep history in memory only (discarded on exit)
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Number of retries after the first attempt
    #[arg(long = "retry-max", global = true)]
    pub retry_max: Option<u32>,

    /// Initial retry delay in milliseconds
    #[arg(long = "retry-delay", global = true, value_name = "MS")]
    pub retry_delay: Option<u64>,

    /// Disable random jitter on retry delays
    #[arg(long = "no-jitter", global = true)]
    pub no_jitter: bool,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for hookledger
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a JSON payload to a webhook
    Send {
        /// Target URL
        #[arg(long)]
        url: String,

        /// Integration kind (stripe, zapier, github, slack, custom, notion)
        #[arg(long, default_value = "custom")]
        kind: WebhookKind,

        /// Business label recorded in history
        #[arg(long = "event-type", default_value = DEFAULT_EVENT_TYPE)]
        event_type: String,

        /// Inline JSON payload
        #[arg(long, conflicts_with = "payload_file")]
        payload: Option<String>,

        /// File containing the JSON payload
        #[arg(long = "payload-file", value_name = "PATH")]
        payload_file: Option<PathBuf>,

        /// Do not inspect the response; only transport errors fail
        #[arg(long)]
        blind: bool,
    },

    /// Announce a business event to the configured Zapier hook
    Trigger {
        /// Event to announce
        #[arg(value_enum)]
        event: TriggerArg,

        /// Event details as JSON
        #[arg(long)]
        data: String,
    },

    /// Show delivery history, newest first
    History {
        /// Only these kinds (can be specified multiple times)
        #[arg(long = "kind", value_name = "KIND")]
        kinds: Vec<WebhookKind>,

        /// Only events with this status (pending, success, failed)
        #[arg(long)]
        status: Option<EventStatus>,

        /// Case-insensitive text in the masked URL or event type
        #[arg(long)]
        search: Option<String>,

        /// Earliest creation time (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_since)]
        since: Option<DateTime<Utc>>,

        /// Latest creation time (RFC 3339 or YYYY-MM-DD, whole day included)
        #[arg(long, value_parser = parse_until)]
        until: Option<DateTime<Utc>>,

        /// Print events as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the delivery history
    Clear,

    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = super::defaults::CONFIG_FILE_NAME)]
        output: PathBuf,
    },
}

/// Business event argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TriggerArg {
    /// A strategy was approved
    StrategyApproved,
    /// A campaign was created
    CampaignCreated,
    /// A lead was converted
    LeadConverted,
}

impl From<TriggerArg> for BusinessEvent {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::StrategyApproved => Self::StrategyApproved,
            TriggerArg::CampaignCreated => Self::CampaignCreated,
            TriggerArg::LeadConverted => Self::LeadConverted,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Command::Init { .. })
    }
}

/// Parses a lower time bound; a bare date means its first instant.
fn parse_since(s: &str) -> Result<DateTime<Utc>, String> {
    parse_bound(s, NaiveTime::MIN)
}

/// Parses an upper time bound; a bare date means its last instant.
fn parse_until(s: &str) -> Result<DateTime<Utc>, String> {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    parse_bound(s, end_of_day)
}

fn parse_bound(s: &str, time_of_day: NaiveTime) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(time_of_day).and_utc())
        .map_err(|_| format!("invalid time '{s}': expected RFC 3339 or YYYY-MM-DD"))
}
