//! Application execution logic.
//!
//! This module wires the validated configuration into a dispatcher and
//! runs one subcommand against it.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use hookledger::config::{Command, HistoryLocation, ValidatedConfig};
use hookledger::history::{
    EventStatus, FileStorage, HistoryFilter, HistoryLog, MemoryStorage, Storage, WebhookEvent,
};
use hookledger::time::{Clock, Sleeper};
use hookledger::trigger::{
    BusinessEvent, CampaignCreationData, EventTrigger, LeadConversionData, StrategyApprovalData,
};
use hookledger::webhook::{Dispatcher, HttpClient, HttpError, ReqwestClient, WebhookKind};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Longest failure message shown in the one-line summary.
const SUMMARY_MAX_CHARS: usize = 100;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to build the HTTP client.
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] HttpError),

    /// Failed to read the payload file.
    #[error("Failed to read payload file '{}': {source}", path.display())]
    PayloadRead {
        /// Path to the payload file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The payload is not valid JSON.
    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    /// The trigger data does not match the event's fields.
    #[error("Invalid data for {event}: {source}")]
    InvalidTriggerData {
        /// Event being triggered
        event: BusinessEvent,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// The webhook could not be delivered.
    #[error("Webhook delivery failed: {0}")]
    DeliveryFailed(String),

    /// The business event was not sent.
    #[error("Failed to send {0} event")]
    TriggerFailed(BusinessEvent),

    /// The history could not be removed.
    #[error("Failed to clear webhook history")]
    ClearFailed,

    /// Failed to write command output.
    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        Self::Output(e)
    }
}

/// Runs `command` with the given configuration.
///
/// `init` is handled before configuration is loaded and never reaches here.
///
/// # Errors
///
/// Returns an error if the command fails; a failed delivery is an error.
///
/// Excluded from coverage - builds the real HTTP client and storage.
#[cfg(not(tarpaulin_include))]
pub async fn execute(command: Command, config: ValidatedConfig) -> Result<(), RunError> {
    let history = HistoryLog::new(open_storage(&config.history)).with_retention(config.retention);
    tracing::debug!("History location: {}", config.history);

    let client = ReqwestClient::with_timeout(config.http_timeout).map_err(RunError::HttpClient)?;
    let dispatcher =
        Dispatcher::new(client, history).with_retry_policy(config.retry_policy.clone());

    let mut stdout = std::io::stdout().lock();

    match command {
        Command::Send {
            url,
            kind,
            event_type,
            payload,
            payload_file,
            blind,
        } => {
            let payload = load_payload(payload.as_deref(), payload_file.as_deref())?;
            let request = SendRequest {
                url: &url,
                kind,
                event_type: &event_type,
                blind,
            };
            handle_send(&dispatcher, &request, payload, &mut stdout).await
        }
        Command::Trigger { event, data } => {
            let trigger = EventTrigger::new(&dispatcher, config.zapier_url.clone());
            handle_trigger(&trigger, event.into(), &data).await
        }
        Command::History {
            kinds,
            status,
            search,
            since,
            until,
            json,
        } => {
            let filter = build_filter(kinds, status, search, since, until);
            handle_history(dispatcher.history(), &filter, json, &mut stdout)
        }
        Command::Clear => handle_clear(dispatcher.history(), &mut stdout),
        Command::Init { .. } => Ok(()),
    }
}

/// Opens the configured history backend.
fn open_storage(location: &HistoryLocation) -> Arc<dyn Storage> {
    match location {
        HistoryLocation::Ephemeral => Arc::new(MemoryStorage::new()),
        HistoryLocation::Directory(dir) => Arc::new(FileStorage::new(dir.clone())),
    }
}

/// Reads the payload from inline JSON or a file; `{}` when neither is given.
fn load_payload(inline: Option<&str>, file: Option<&Path>) -> Result<Value, RunError> {
    let content = match (inline, file) {
        (Some(inline), _) => inline.to_string(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).map_err(|e| RunError::PayloadRead {
                path: path.to_path_buf(),
                source: e,
            })?
        }
        (None, None) => return Ok(Value::Object(serde_json::Map::new())),
    };

    serde_json::from_str(&content).map_err(RunError::InvalidPayload)
}

fn build_filter(
    kinds: Vec<WebhookKind>,
    status: Option<EventStatus>,
    search: Option<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> HistoryFilter {
    let mut filter = HistoryFilter {
        kinds,
        ..HistoryFilter::default()
    }
    .with_range(since, until);

    if let Some(status) = status {
        filter = filter.with_status(status);
    }
    if let Some(search) = search {
        filter = filter.with_search(search);
    }
    filter
}

/// Target and labels of a `send` invocation.
struct SendRequest<'a> {
    url: &'a str,
    kind: WebhookKind,
    event_type: &'a str,
    blind: bool,
}

/// Dispatches one payload and prints the result as JSON.
async fn handle_send<H, St, C, S>(
    dispatcher: &Dispatcher<H, St, C, S>,
    request: &SendRequest<'_>,
    payload: Value,
    out: &mut impl Write,
) -> Result<(), RunError>
where
    H: HttpClient,
    St: Storage,
    C: Clock,
    S: Sleeper,
{
    let result = if request.blind {
        dispatcher
            .dispatch_blind(request.url, payload, request.kind, request.event_type)
            .await
    } else {
        dispatcher
            .dispatch(request.url, payload, request.kind, request.event_type)
            .await
    };

    let json = serde_json::to_string_pretty(&result).map_err(std::io::Error::other)?;
    writeln!(out, "{json}")?;

    let summary = result.summary(SUMMARY_MAX_CHARS);
    if result.success {
        tracing::info!("{summary}");
        Ok(())
    } else {
        Err(RunError::DeliveryFailed(summary))
    }
}

/// Decodes `data` for `event` and announces it.
async fn handle_trigger<H, St, C, S>(
    trigger: &EventTrigger<'_, H, St, C, S>,
    event: BusinessEvent,
    data: &str,
) -> Result<(), RunError>
where
    H: HttpClient,
    St: Storage,
    C: Clock,
    S: Sleeper,
{
    let invalid = |source| RunError::InvalidTriggerData { event, source };

    let sent = match event {
        BusinessEvent::StrategyApproved => {
            let data: StrategyApprovalData = serde_json::from_str(data).map_err(invalid)?;
            trigger.on_strategy_approved(data).await
        }
        BusinessEvent::CampaignCreated => {
            let data: CampaignCreationData = serde_json::from_str(data).map_err(invalid)?;
            trigger.on_campaign_created(data).await
        }
        BusinessEvent::LeadConverted => {
            let data: LeadConversionData = serde_json::from_str(data).map_err(invalid)?;
            trigger.on_lead_converted(data).await
        }
    };

    if sent {
        Ok(())
    } else {
        Err(RunError::TriggerFailed(event))
    }
}

/// Prints the events matching `filter`, newest first.
fn handle_history<St: Storage, C: Clock>(
    history: &HistoryLog<St, C>,
    filter: &HistoryFilter,
    json: bool,
    out: &mut impl Write,
) -> Result<(), RunError> {
    let events = history.filtered(filter);

    if json {
        let json = serde_json::to_string_pretty(&events).map_err(std::io::Error::other)?;
        writeln!(out, "{json}")?;
        return Ok(());
    }

    for event in &events {
        writeln!(out, "{}", format_event(event))?;
    }
    writeln!(out, "{} event(s)", events.len())?;
    Ok(())
}

/// One history line: time, status, kind, event type, target, outcome.
fn format_event(event: &WebhookEvent) -> String {
    let mut line = format!(
        "{}  {:<7}  {:<6}  {}  {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
        event.status.as_str(),
        event.webhook_type.as_str(),
        event.event_type,
        event.target_url,
    );

    if let Some(code) = event.response_code {
        line.push_str(&format!("  [{code}]"));
    }
    if let Some(duration) = event.duration {
        line.push_str(&format!("  {duration}ms"));
    }
    if let Some(retries) = event.retry_count.filter(|&n| n > 0) {
        line.push_str(&format!("  {retries} retries"));
    }
    if let Some(message) = event
        .error_message
        .as_deref()
        .filter(|_| event.status == EventStatus::Failed)
    {
        line.push_str(&format!("  ({message})"));
    }
    line
}

/// Removes the whole history.
fn handle_clear<St: Storage, C: Clock>(
    history: &HistoryLog<St, C>,
    out: &mut impl Write,
) -> Result<(), RunError> {
    if !history.clear() {
        return Err(RunError::ClearFailed);
    }
    writeln!(out, "Webhook history cleared")?;
    Ok(())
}
