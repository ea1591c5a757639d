//! Retention policy bounding history growth.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::WebhookEvent;

/// How much history to keep.
///
/// Applied every time an event is appended. Age is measured from the
/// event's creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Keep at most this many newest events.
    pub max_events: Option<usize>,
    /// Drop events older than this.
    pub max_age: Option<Duration>,
}

impl RetentionPolicy {
    /// Default cap on stored events.
    pub const DEFAULT_MAX_EVENTS: usize = 500;

    /// Keeps everything.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_events: None,
            max_age: None,
        }
    }

    /// Sets the event cap.
    #[must_use]
    pub const fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = Some(max_events);
        self
    }

    /// Sets the maximum event age.
    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Prunes `events` (newest first) in place; returns how many were dropped.
    pub fn apply(&self, events: &mut Vec<WebhookEvent>, now: DateTime<Utc>) -> usize {
        let before = events.len();

        if let Some(cutoff) = self
            .max_age
            .and_then(|age| chrono::Duration::from_std(age).ok())
            .and_then(|age| now.checked_sub_signed(age))
        {
            events.retain(|event| event.timestamp >= cutoff);
        }

        if let Some(max) = self.max_events {
            events.truncate(max);
        }

        before - events.len()
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::unbounded().with_max_events(Self::DEFAULT_MAX_EVENTS)
    }
}
