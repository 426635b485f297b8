//! Offline retry queue.
//!
//! When the validation call fails at the transport level the attempt is not
//! lost: it becomes a [`QueueItem`] persisted under one storage key and is
//! retried by [`OfflineQueue::drain`] up to [`MAX_RETRY_ATTEMPTS`] times.
//! Terminal items (success or failed) stay in the persisted list until an
//! explicit [`OfflineQueue::clear`]; the retained entries are the audit
//! trail for attempts made while the device was offline.
//!
//! The in-memory list is authoritative. Persistence is whole-list
//! read/modify/write; a failed write is logged and retried on the next
//! mutation rather than propagated, so an unreachable backend can never make
//! the queue drop an item it already holds.

use crate::storage::{KeyValueStore, keys};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use zatix_client::{ApiClient, TicketValidation, TokenProvider};
use zatix_core::TicketCode;

/// Bound on transport-failure retries per item.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Lifecycle state of a queued attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueItemStatus {
    /// Waiting for a retry.
    Pending,
    /// Server answered; outcome attached.
    Success,
    /// Retries exhausted or the server rejected the attempt.
    Failed,
}

/// One deferred validation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique id, time+random derived.
    pub id: String,
    /// Ticket the attempt is for.
    pub ticket_code: TicketCode,
    /// When the attempt was deferred.
    pub enqueued_at: DateTime<Utc>,
    /// Retry count; only ever increases.
    pub attempts: u32,
    /// Lifecycle state.
    pub status: QueueItemStatus,
    /// Outcome, attached on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TicketValidation>,
    /// Terminal error message, attached on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueueItem {
    fn new(ticket_code: TicketCode) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(char::from)
            .collect::<String>()
            .to_lowercase();

        Self {
            id: format!("{}_{}", Utc::now().timestamp_millis(), suffix),
            ticket_code,
            enqueued_at: Utc::now(),
            attempts: 0,
            status: QueueItemStatus::Pending,
            result: None,
            error: None,
        }
    }
}

/// Counts over the queued items; pure read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Items still waiting for a retry.
    pub pending: usize,
    /// Items that exhausted their retries or were rejected.
    pub failed: usize,
    /// All items, terminal ones included.
    pub total: usize,
}

/// Outcome of one drain pass.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Items attempted in this pass.
    pub processed: usize,
    /// Items that reached a terminal failure in this pass.
    pub failed: usize,
    /// Successful outcomes, in processing order, for history recording.
    pub successes: Vec<(TicketCode, TicketValidation)>,
    /// True when another drain was already in flight and this one did nothing.
    pub skipped: bool,
}

/// Durable list of pending validation attempts.
pub struct OfflineQueue<S> {
    store: S,
    items: Mutex<Vec<QueueItem>>,
    drain_lock: tokio::sync::Mutex<()>,
    max_retry: u32,
}

impl<S: KeyValueStore> OfflineQueue<S> {
    /// Load the queue from its persisted snapshot.
    ///
    /// A missing or corrupt snapshot yields an empty queue; corruption is
    /// logged, not propagated.
    pub async fn load(store: S) -> Self {
        Self::load_with_max_retry(store, MAX_RETRY_ATTEMPTS).await
    }

    /// Load with an explicit retry bound.
    pub async fn load_with_max_retry(store: S, max_retry: u32) -> Self {
        let items = match store.get(keys::VALIDATION_QUEUE).await {
            Ok(Some(snapshot)) => match serde_json::from_str::<Vec<QueueItem>>(&snapshot) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(error = %e, "corrupt queue snapshot; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read queue snapshot; starting empty");
                Vec::new()
            }
        };

        Self {
            store,
            items: Mutex::new(items),
            drain_lock: tokio::sync::Mutex::new(()),
            max_retry,
        }
    }

    /// Defer a validation attempt; returns the new queue length.
    ///
    /// The item is persisted before this returns; if the write fails it is
    /// retried once and then logged, with the in-memory item kept either way.
    pub async fn enqueue(&self, ticket_code: TicketCode) -> usize {
        let len = {
            let mut items = self.items.lock().unwrap();
            items.push(QueueItem::new(ticket_code));
            items.len()
        };
        self.persist().await;
        len
    }

    /// Retry every eligible item, one at a time, in enqueue order.
    ///
    /// Eligible means `pending` with fewer than `max_retry` attempts. The
    /// attempt counter is incremented before each call, so a terminally
    /// failed item always shows the full retry count. A drain invoked while
    /// another is in flight is a no-op (`skipped` set on the report);
    /// two drains never interleave.
    pub async fn drain<T: TokenProvider>(&self, client: &ApiClient<T>) -> DrainReport {
        let Ok(_guard) = self.drain_lock.try_lock() else {
            tracing::debug!("queue drain already in flight; skipping");
            return DrainReport {
                skipped: true,
                ..DrainReport::default()
            };
        };

        let eligible: Vec<String> = {
            let items = self.items.lock().unwrap();
            items
                .iter()
                .filter(|item| {
                    item.status == QueueItemStatus::Pending && item.attempts < self.max_retry
                })
                .map(|item| item.id.clone())
                .collect()
        };

        let mut report = DrainReport::default();

        for id in eligible {
            let Some(code) = self.with_item(&id, |item| {
                item.attempts += 1;
                item.ticket_code.clone()
            }) else {
                continue;
            };

            match client.validate_ticket(&code).await {
                Ok(outcome) => {
                    self.with_item(&id, |item| {
                        item.status = QueueItemStatus::Success;
                        item.result = Some(outcome.clone());
                    });
                    report.successes.push((code, outcome));
                }
                Err(e) if e.is_transport() => {
                    let exhausted = self
                        .with_item(&id, |item| {
                            if item.attempts >= self.max_retry {
                                item.status = QueueItemStatus::Failed;
                                item.error = Some(e.to_string());
                                true
                            } else {
                                false
                            }
                        })
                        .unwrap_or(false);
                    if exhausted {
                        report.failed += 1;
                    }
                }
                Err(e) => {
                    // Server answered and said no; further retries cannot help.
                    self.with_item(&id, |item| {
                        item.status = QueueItemStatus::Failed;
                        item.error = Some(e.to_string());
                    });
                    report.failed += 1;
                }
            }

            report.processed += 1;
            self.persist().await;
        }

        if report.processed > 0 {
            tracing::info!(
                processed = report.processed,
                succeeded = report.successes.len(),
                failed = report.failed,
                "queue drain finished"
            );
        }
        report
    }

    /// Current counts; no side effects.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let items = self.items.lock().unwrap();
        QueueStats {
            pending: items
                .iter()
                .filter(|i| i.status == QueueItemStatus::Pending)
                .count(),
            failed: items
                .iter()
                .filter(|i| i.status == QueueItemStatus::Failed)
                .count(),
            total: items.len(),
        }
    }

    /// Snapshot of the queued items, in enqueue order.
    #[must_use]
    pub fn items(&self) -> Vec<QueueItem> {
        self.items.lock().unwrap().clone()
    }

    /// Drop every item and delete the persisted snapshot.
    ///
    /// Explicit maintenance only; nothing prunes the queue automatically.
    pub async fn clear(&self) {
        self.items.lock().unwrap().clear();
        if let Err(e) = self.store.remove(keys::VALIDATION_QUEUE).await {
            tracing::warn!(error = %e, "failed to delete queue snapshot");
        }
    }

    fn with_item<R>(&self, id: &str, f: impl FnOnce(&mut QueueItem) -> R) -> Option<R> {
        let mut items = self.items.lock().unwrap();
        items.iter_mut().find(|item| item.id == id).map(f)
    }

    /// Write the whole list under the queue key; one retry, then log.
    async fn persist(&self) {
        let snapshot = {
            let items = self.items.lock().unwrap();
            match serde_json::to_string(&*items) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to serialize queue snapshot");
                    return;
                }
            }
        };

        for attempt in 0..2 {
            match self.store.set(keys::VALIDATION_QUEUE, &snapshot).await {
                Ok(()) => return,
                Err(e) if attempt == 0 => {
                    tracing::debug!(error = %e, "queue persist failed; retrying once");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "queue persist failed; in-memory state remains authoritative"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn enqueue_persists_the_whole_list() {
        let store = MemoryStore::new();
        let queue = OfflineQueue::load(store.clone()).await;

        let code = TicketCode::normalize("ZTX-AB12").unwrap();
        assert_eq!(queue.enqueue(code).await, 1);

        let snapshot = store.get(keys::VALIDATION_QUEUE).await.unwrap().unwrap();
        let items: Vec<QueueItem> = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].ticket_code.as_str(), "ZTX-AB12");
        assert_eq!(items[0].attempts, 0);
        assert_eq!(items[0].status, QueueItemStatus::Pending);
    }

    #[tokio::test]
    async fn queue_reloads_from_snapshot() {
        let store = MemoryStore::new();
        {
            let queue = OfflineQueue::load(store.clone()).await;
            queue
                .enqueue(TicketCode::normalize("ZTX-AB12").unwrap())
                .await;
        }

        let reloaded = OfflineQueue::load(store).await;
        assert_eq!(reloaded.stats().total, 1);
        assert_eq!(reloaded.items()[0].ticket_code.as_str(), "ZTX-AB12");
    }

    #[tokio::test]
    async fn corrupt_snapshot_starts_empty() {
        let store = MemoryStore::new();
        store
            .set(keys::VALIDATION_QUEUE, "not json at all")
            .await
            .unwrap();

        let queue = OfflineQueue::load(store).await;
        assert_eq!(queue.stats().total, 0);
    }

    #[tokio::test]
    async fn clear_removes_items_and_snapshot() {
        let store = MemoryStore::new();
        let queue = OfflineQueue::load(store.clone()).await;
        queue
            .enqueue(TicketCode::normalize("ZTX-AB12").unwrap())
            .await;

        queue.clear().await;

        assert_eq!(queue.stats().total, 0);
        assert_eq!(store.get(keys::VALIDATION_QUEUE).await.unwrap(), None);
    }

    #[tokio::test]
    async fn stats_partition_by_status() {
        let store = MemoryStore::new();
        let queue = OfflineQueue::load(store).await;
        queue
            .enqueue(TicketCode::normalize("ZTX-AB12").unwrap())
            .await;
        queue
            .enqueue(TicketCode::normalize("ZTX-CD34").unwrap())
            .await;

        let stats = queue.stats();
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn queue_item_ids_are_unique() {
        let code = TicketCode::normalize("ZTX-AB12").unwrap();
        let a = QueueItem::new(code.clone());
        let b = QueueItem::new(code);
        assert_ne!(a.id, b.id);
    }
}
