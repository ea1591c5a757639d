//! The persisted webhook history log.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    EventId, EventPatch, HistoryFilter, RetentionPolicy, Storage, StorageError, WebhookEvent,
};
use crate::time::{Clock, SystemClock};

/// Storage key of the history blob.
pub const HISTORY_KEY: &str = "webhook_event_history";

/// Current blob format version.
///
/// Blobs with any other version are treated as corrupted.
pub const HISTORY_VERSION: u32 = 1;

/// Errors from history persistence.
///
/// The dispatcher logs these and carries on; they never reach its caller.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The history could not be serialized.
    #[error("Failed to serialize history: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// On-storage layout of the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBlob {
    /// Format version.
    pub version: u32,
    /// Events, newest first.
    pub events: Vec<WebhookEvent>,
    /// Time of the last write.
    pub last_updated: DateTime<Utc>,
}

/// Result of reading the history blob.
#[derive(Debug)]
pub enum LoadResult {
    /// A valid blob was read.
    Loaded(HistoryBlob),

    /// Nothing is stored (never written, or cleared).
    NotFound,

    /// Something is stored but unusable; the next append replaces it.
    Corrupted {
        /// Reason for corruption (for logging).
        reason: String,
    },

    /// The backend could not be read. The stored blob may be intact, so
    /// writers must not replace it.
    Unavailable(StorageError),
}

impl LoadResult {
    /// Returns the events, or an empty list when none could be read.
    #[must_use]
    pub fn into_events(self) -> Vec<WebhookEvent> {
        match self {
            Self::Loaded(blob) => blob.events,
            Self::NotFound | Self::Corrupted { .. } | Self::Unavailable(_) => Vec::new(),
        }
    }
}

/// Outcome of [`HistoryLog::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The patch was merged and saved.
    Applied,
    /// No usable history is stored.
    NoHistory,
    /// No event has the given id.
    NotFound,
    /// The event is already terminal; nothing changed.
    AlreadyTerminal,
}

/// Newest-first event log over a [`Storage`] port.
///
/// The whole history is one blob that is read, modified and written back
/// on every change. Changes made through one `HistoryLog` are serialized;
/// separate processes sharing a backend race with last-write-wins.
#[derive(Debug)]
pub struct HistoryLog<S, C = SystemClock> {
    storage: S,
    clock: C,
    retention: RetentionPolicy,
    write_lock: Mutex<()>,
}

impl<S: Storage> HistoryLog<S, SystemClock> {
    /// Creates a log with the default retention policy and the system clock.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            clock: SystemClock,
            retention: RetentionPolicy::default(),
            write_lock: Mutex::new(()),
        }
    }
}

impl<S: Storage, C: Clock> HistoryLog<S, C> {
    /// Replaces the clock used for timestamps and retention.
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> HistoryLog<S, C2> {
        HistoryLog {
            storage: self.storage,
            clock,
            retention: self.retention,
            write_lock: self.write_lock,
        }
    }

    /// Sets the retention policy.
    #[must_use]
    pub const fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Returns the retention policy.
    #[must_use]
    pub const fn retention(&self) -> &RetentionPolicy {
        &self.retention
    }

    /// Returns the storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Current time according to the log's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    /// Reads and validates the stored blob.
    pub fn load(&self) -> LoadResult {
        let content = match self.storage.get(HISTORY_KEY) {
            Ok(Some(content)) => content,
            Ok(None) => return LoadResult::NotFound,
            Err(e) => return LoadResult::Unavailable(e),
        };

        match serde_json::from_str::<HistoryBlob>(&content) {
            Ok(blob) if blob.version == HISTORY_VERSION => LoadResult::Loaded(blob),
            Ok(blob) => LoadResult::Corrupted {
                reason: format!(
                    "Incompatible version: expected {HISTORY_VERSION}, got {}",
                    blob.version
                ),
            },
            Err(e) => LoadResult::Corrupted {
                reason: format!("Invalid JSON: {e}"),
            },
        }
    }

    /// Prepends `event`, prunes by retention, and saves.
    ///
    /// A corrupted blob is discarded and replaced. If the blob cannot be
    /// read at all, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the history cannot be read or written.
    pub fn append(&self, event: WebhookEvent) -> Result<(), HistoryError> {
        let _guard = self.lock();

        let mut events = match self.load() {
            LoadResult::Loaded(blob) => blob.events,
            LoadResult::NotFound => Vec::new(),
            LoadResult::Corrupted { reason } => {
                tracing::warn!("Webhook history corrupted ({reason}), starting fresh");
                Vec::new()
            }
            LoadResult::Unavailable(e) => return Err(e.into()),
        };

        events.insert(0, event);

        let now = self.now();
        let pruned = self.retention.apply(&mut events, now);
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned webhook history");
        }

        self.save(events, now)
    }

    /// Merges `patch` into the event with `id`.
    ///
    /// Missing history, unknown ids and terminal events are reported
    /// through [`UpdateOutcome`], never as errors.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the history cannot be read or the
    /// updated history cannot be written.
    pub fn update(&self, id: &EventId, patch: &EventPatch) -> Result<UpdateOutcome, HistoryError> {
        let _guard = self.lock();

        let mut blob = match self.load() {
            LoadResult::Loaded(blob) => blob,
            LoadResult::NotFound | LoadResult::Corrupted { .. } => {
                return Ok(UpdateOutcome::NoHistory);
            }
            LoadResult::Unavailable(e) => return Err(e.into()),
        };

        let Some(event) = blob.events.iter_mut().find(|e| &e.id == id) else {
            return Ok(UpdateOutcome::NotFound);
        };

        if !patch.apply_to(event) {
            return Ok(UpdateOutcome::AlreadyTerminal);
        }

        self.save(blob.events, self.now())?;
        Ok(UpdateOutcome::Applied)
    }

    /// Returns all events, newest first; empty if missing or corrupted.
    #[must_use]
    pub fn events(&self) -> Vec<WebhookEvent> {
        match self.load() {
            LoadResult::Corrupted { reason } => {
                tracing::error!("Error retrieving webhook history: {reason}");
                Vec::new()
            }
            LoadResult::Unavailable(e) => {
                tracing::error!("Error retrieving webhook history: {e}");
                Vec::new()
            }
            other => other.into_events(),
        }
    }

    /// Returns the events matching `filter`, newest first.
    #[must_use]
    pub fn filtered(&self, filter: &HistoryFilter) -> Vec<WebhookEvent> {
        self.events()
            .into_iter()
            .filter(|event| filter.matches(event))
            .collect()
    }

    /// Returns the event with `id`, if stored.
    #[must_use]
    pub fn find(&self, id: &EventId) -> Option<WebhookEvent> {
        self.events().into_iter().find(|e| &e.id == id)
    }

    /// Removes the whole history. Returns `false` if storage refused.
    pub fn clear(&self) -> bool {
        let _guard = self.lock();
        match self.storage.remove(HISTORY_KEY) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error clearing webhook history: {e}");
                false
            }
        }
    }

    fn save(&self, events: Vec<WebhookEvent>, now: DateTime<Utc>) -> Result<(), HistoryError> {
        let blob = HistoryBlob {
            version: HISTORY_VERSION,
            events,
            last_updated: now,
        };
        let content = serde_json::to_string(&blob).map_err(HistoryError::Serialize)?;
        self.storage.set(HISTORY_KEY, &content)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
