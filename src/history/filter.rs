//! Query filter over history events.

use chrono::{DateTime, Utc};

use super::{EventStatus, WebhookEvent};
use crate::webhook::WebhookKind;

/// Selects events by kind, status, creation time and free text.
///
/// Every criterion left empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Accepted kinds; empty accepts all.
    pub kinds: Vec<WebhookKind>,
    /// Required status.
    pub status: Option<EventStatus>,
    /// Earliest creation time, inclusive.
    pub from: Option<DateTime<Utc>>,
    /// Latest creation time, inclusive.
    pub to: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the masked URL or event type.
    pub search: Option<String>,
}

impl HistoryFilter {
    /// A filter that matches every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an accepted kind.
    #[must_use]
    pub fn with_kind(mut self, kind: WebhookKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Requires a status.
    #[must_use]
    pub const fn with_status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts creation time to `from..=to`; either end may be open.
    #[must_use]
    pub const fn with_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Requires a search term.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.trim().is_empty()).then_some(search);
        self
    }

    /// Returns true if `event` passes every criterion.
    #[must_use]
    pub fn matches(&self, event: &WebhookEvent) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&event.webhook_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != event.status) {
            return false;
        }
        if self.from.is_some_and(|from| event.timestamp < from) {
            return false;
        }
        if self.to.is_some_and(|to| event.timestamp > to) {
            return false;
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            let hit = event.target_url.to_lowercase().contains(&needle)
                || event.event_type.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}
