//! # ZaTix Validation
//!
//! The stateful half of the crew ticket-validation pipeline: persisted
//! storage seam, offline retry queue, bounded validation history, stored
//! credentials, and the [`ValidationService`] facade the presentation layer
//! drives.
//!
//! Guarantees, in one place:
//!
//! - a validation attempt is never silently lost: transport failures become
//!   persisted queue items retried up to a bounded attempt count;
//! - queue drains are single-flight and process items in enqueue order;
//! - history is capped and newest-first; statistics are recomputed from the
//!   persisted list on every read;
//! - persistence failures are logged and never abort the user-visible flow —
//!   in-memory state is authoritative until the next successful write.

pub mod auth;
pub mod config;
pub mod history;
pub mod queue;
pub mod service;
pub mod storage;

pub use auth::StoredTokenProvider;
pub use config::Config;
pub use history::{HISTORY_LIMIT, HistoryEntry, HistoryStore, ValidationStats};
pub use queue::{DrainReport, MAX_RETRY_ATTEMPTS, OfflineQueue, QueueItem, QueueItemStatus, QueueStats};
pub use service::{ValidationDisposition, ValidationError, ValidationService};
pub use storage::{KeyValueStore, MemoryStore, StorageError, keys};
