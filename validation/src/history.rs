//! Validation history and statistics.
//!
//! Every completed validation is prepended to a bounded, newest-first list
//! persisted under one storage key; the oldest entries fall off past
//! [`HISTORY_LIMIT`]. Statistics are recomputed from the list on every call
//! rather than kept as incremental counters, so a partial write can never
//! leave the counts drifting from the entries.

use crate::storage::{KeyValueStore, keys};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use zatix_client::{TicketValidation, ValidationStatus};
use zatix_core::TicketCode;

/// Cap on retained history entries.
pub const HISTORY_LIMIT: usize = 100;

/// One completed validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Ticket the outcome applies to.
    pub ticket_code: TicketCode,
    /// Client-assigned timestamp of the round trip.
    pub validated_at: DateTime<Utc>,
    /// Server outcome.
    pub result: TicketValidation,
}

/// Report counts derived from the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    /// Entries in the list.
    pub total_validations: usize,
    /// Entries with a `valid` verdict.
    pub successful_validations: usize,
    /// Entries with an `invalid` verdict.
    pub failed_validations: usize,
    /// Entries whose timestamp falls on the current calendar day, local time.
    pub today_validations: usize,
}

/// Append-only, capped log of completed validations.
pub struct HistoryStore<S> {
    store: S,
    entries: Mutex<Vec<HistoryEntry>>,
    limit: usize,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Load the history from its persisted snapshot.
    ///
    /// Missing or corrupt snapshots yield an empty history; corruption is
    /// logged, not propagated.
    pub async fn load(store: S) -> Self {
        Self::load_with_limit(store, HISTORY_LIMIT).await
    }

    /// Load with an explicit retention cap.
    pub async fn load_with_limit(store: S, limit: usize) -> Self {
        let entries = match store.get(keys::VALIDATION_HISTORY).await {
            Ok(Some(snapshot)) => match serde_json::from_str::<Vec<HistoryEntry>>(&snapshot) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(error = %e, "corrupt history snapshot; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read history snapshot; starting empty");
                Vec::new()
            }
        };

        Self {
            store,
            entries: Mutex::new(entries),
            limit,
        }
    }

    /// Record one completed validation with a client-assigned timestamp.
    ///
    /// Prepends the entry, truncates to the cap and persists the whole list.
    /// A failed persist is logged; the in-memory list stays authoritative.
    pub async fn record(&self, ticket_code: TicketCode, result: TicketValidation) {
        {
            let mut entries = self.entries.lock().unwrap();
            entries.insert(
                0,
                HistoryEntry {
                    ticket_code,
                    validated_at: Utc::now(),
                    result,
                },
            );
            entries.truncate(self.limit);
        }
        self.persist().await;
    }

    /// Current entries, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Derive the report counts from the current list.
    ///
    /// Computed fresh on every call; `today` is the current calendar day in
    /// local time.
    #[must_use]
    pub fn stats(&self) -> ValidationStats {
        let entries = self.entries.lock().unwrap();
        let today = Local::now().date_naive();

        let mut stats = ValidationStats {
            total_validations: entries.len(),
            successful_validations: 0,
            failed_validations: 0,
            today_validations: 0,
        };

        for entry in entries.iter() {
            match entry.result.status {
                ValidationStatus::Valid => stats.successful_validations += 1,
                ValidationStatus::Invalid => stats.failed_validations += 1,
            }
            if entry.validated_at.with_timezone(&Local).date_naive() == today {
                stats.today_validations += 1;
            }
        }
        stats
    }

    async fn persist(&self) {
        let snapshot = {
            let entries = self.entries.lock().unwrap();
            match serde_json::to_string(&*entries) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to serialize history snapshot");
                    return;
                }
            }
        };

        if let Err(e) = self.store.set(keys::VALIDATION_HISTORY, &snapshot).await {
            tracing::warn!(
                error = %e,
                "history persist failed; in-memory state remains authoritative"
            );
        }
    }
}
