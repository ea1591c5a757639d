//! History records and partial updates.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::webhook::{WebhookKind, mask_url};

/// Event type recorded when the caller does not name one.
pub const DEFAULT_EVENT_TYPE: &str = "webhook_call";

/// Exclusive upper bound of the random id suffix.
const ID_SUFFIX_BOUND: u32 = 1_000_000;

/// Identifier of a [`WebhookEvent`]: `wh_<unix-millis>_<random>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generates a fresh id for an event created at `at`.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(at: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix = rng.random_range(0..ID_SUFFIX_BOUND);
        Self(format!("wh_{}_{suffix}", at.timestamp_millis()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Delivery in progress.
    Pending,
    /// Delivered with a 2xx response.
    Success,
    /// Gave up.
    #[serde(alias = "error")]
    Failed,
}

impl EventStatus {
    /// Returns true for `Success` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" | "error" => Ok(Self::Failed),
            other => Err(format!(
                "unknown status '{other}': expected pending, success, or failed"
            )),
        }
    }
}

/// One dispatch lifecycle, from creation to its terminal outcome.
///
/// Retries of the same dispatch update this record; they never add rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Unique id.
    pub id: EventId,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Integration kind.
    pub webhook_type: WebhookKind,
    /// Business event label.
    pub event_type: String,
    /// Masked destination; never the raw URL.
    pub target_url: String,
    /// Body that was sent.
    pub payload: Value,
    /// Lifecycle status.
    pub status: EventStatus,
    /// HTTP status of the terminal response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    /// Response body of a successful delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// Last error or retry diagnostic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Milliseconds from dispatch start to the latest update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Retries made so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
}

impl WebhookEvent {
    /// Creates a pending event; `raw_url` is masked before it is stored.
    #[must_use]
    pub fn pending(
        id: EventId,
        timestamp: DateTime<Utc>,
        kind: WebhookKind,
        event_type: impl Into<String>,
        raw_url: &str,
        payload: Value,
    ) -> Self {
        Self {
            id,
            timestamp,
            webhook_type: kind,
            event_type: event_type.into(),
            target_url: mask_url(raw_url),
            payload,
            status: EventStatus::Pending,
            response_code: None,
            response: None,
            error_message: None,
            duration: None,
            retry_count: None,
        }
    }
}

/// Fields merged into an existing event; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    /// New status.
    pub status: Option<EventStatus>,
    /// HTTP status code.
    pub response_code: Option<u16>,
    /// Response body.
    pub response: Option<Value>,
    /// Error or diagnostic message; `Some(None)` clears it.
    pub error_message: Option<Option<String>>,
    /// Elapsed milliseconds.
    pub duration: Option<u64>,
    /// Retries so far.
    pub retry_count: Option<u32>,
}

impl EventPatch {
    /// A patch that moves the event to `status`.
    #[must_use]
    pub fn status(status: EventStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Sets the response code.
    #[must_use]
    pub const fn with_response_code(mut self, code: u16) -> Self {
        self.response_code = Some(code);
        self
    }

    /// Sets the response body.
    #[must_use]
    pub fn with_response(mut self, response: Option<Value>) -> Self {
        self.response = response;
        self
    }

    /// Sets the error message.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(Some(message.into()));
        self
    }

    /// Removes any error message left by earlier attempts.
    #[must_use]
    pub fn without_error_message(mut self) -> Self {
        self.error_message = Some(None);
        self
    }

    /// Sets the elapsed duration in milliseconds.
    #[must_use]
    pub const fn with_duration(mut self, millis: u64) -> Self {
        self.duration = Some(millis);
        self
    }

    /// Sets the retry count.
    #[must_use]
    pub const fn with_retry_count(mut self, retries: u32) -> Self {
        self.retry_count = Some(retries);
        self
    }

    /// Merges this patch into `event`.
    ///
    /// Returns `false` and leaves the event unchanged once it is terminal.
    pub fn apply_to(&self, event: &mut WebhookEvent) -> bool {
        if event.status.is_terminal() {
            return false;
        }
        if let Some(status) = self.status {
            event.status = status;
        }
        if let Some(code) = self.response_code {
            event.response_code = Some(code);
        }
        if let Some(ref response) = self.response {
            event.response = Some(response.clone());
        }
        if let Some(ref message) = self.error_message {
            event.error_message.clone_from(message);
        }
        if let Some(duration) = self.duration {
            event.duration = Some(duration);
        }
        if let Some(retries) = self.retry_count {
            event.retry_count = Some(retries);
        }
        true
    }
}
