//! Webhook delivery history.
//!
//! Every dispatch leaves one [`WebhookEvent`] in a newest-first log. The log
//! lives in a single blob behind a [`Storage`] port, so the backend can be
//! swapped: [`MemoryStorage`] for tests, [`FileStorage`] for the CLI.
//!
//! Writes are best-effort from the dispatcher's point of view: it logs
//! [`HistoryError`]s and never lets them interfere with delivery.

mod event;
mod file;
mod filter;
mod log;
mod retention;
mod storage;

#[cfg(test)]
mod event_tests;
#[cfg(test)]
mod retention_tests;

pub use event::{DEFAULT_EVENT_TYPE, EventId, EventPatch, EventStatus, WebhookEvent};
pub use file::FileStorage;
pub use filter::HistoryFilter;
pub use log::{
    HISTORY_KEY, HISTORY_VERSION, HistoryBlob, HistoryError, HistoryLog, LoadResult,
    UpdateOutcome,
};
pub use retention::RetentionPolicy;
pub use storage::{MemoryStorage, Storage, StorageError};
