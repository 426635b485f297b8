//! Pipeline facade.
//!
//! [`ValidationService`] is the single object the presentation layer talks
//! to: scan and manual-entry admission, the remote validation call, offline
//! queueing on transport failure, history recording, and session
//! bookkeeping. One instance per process, constructed explicitly and passed
//! by reference; nothing in here is a global.

use crate::auth::StoredTokenProvider;
use crate::config::Config;
use crate::history::{HistoryEntry, HistoryStore, ValidationStats};
use crate::queue::{DrainReport, OfflineQueue, QueueStats};
use crate::storage::KeyValueStore;
use std::sync::Mutex;
use thiserror::Error;
use zatix_client::{ApiClient, ClientError, LoginRequest, TicketValidation, User};
use zatix_core::{FormatError, ScanGate, TicketCode};

/// Errors surfaced to the presentation layer.
///
/// Transport failures never appear here: once the offline queue is in play
/// they are converted into [`ValidationDisposition::Queued`].
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Code failed a ticket-code grammar; report to the user, never queue.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The server rejected the request; terminal for this attempt.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Non-error outcome of one admitted validation attempt.
#[derive(Debug)]
pub enum ValidationDisposition {
    /// Server answered; the outcome (valid or invalid verdict) is attached.
    Validated(TicketValidation),

    /// No server response; the attempt is queued for a later drain.
    Queued {
        /// Queue length after the enqueue, for operator feedback.
        queue_len: usize,
    },
}

/// The ticket-validation pipeline.
pub struct ValidationService<S: KeyValueStore + Clone> {
    client: ApiClient<StoredTokenProvider<S>>,
    tokens: StoredTokenProvider<S>,
    queue: OfflineQueue<S>,
    history: HistoryStore<S>,
    gate: Mutex<ScanGate>,
}

impl<S: KeyValueStore + Clone> ValidationService<S> {
    /// Construct the pipeline over a storage backend.
    ///
    /// Loads the persisted queue and history snapshots before returning.
    pub async fn new(config: &Config, store: S) -> Self {
        let tokens = StoredTokenProvider::new(store.clone());
        let client = ApiClient::with_base_url(
            config.api_base_url.clone(),
            config.api_timeout,
            tokens.clone(),
        );
        let queue = OfflineQueue::load_with_max_retry(store.clone(), config.max_retry_attempts).await;
        let history = HistoryStore::load_with_limit(store, config.history_limit).await;

        Self {
            client,
            tokens,
            queue,
            history,
            gate: Mutex::new(ScanGate::with_cooldown(config.scan_cooldown)),
        }
    }

    /// Process one camera scan event.
    ///
    /// `active` and `loading` come from the presentation layer; no scan is
    /// admitted while loading. `Ok(None)` means the gate dropped the event
    /// (cooldown, duplicate, inactive) and nothing else happened.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Format`] for unrecognized payloads (on every
    /// occurrence), [`ValidationError::Client`] for application failures.
    pub async fn handle_scan(
        &self,
        raw: &str,
        active: bool,
        loading: bool,
    ) -> Result<Option<ValidationDisposition>, ValidationError> {
        let admitted = self.gate.lock().unwrap().on_scan(raw, active, loading)?;
        match admitted {
            Some(code) => Ok(Some(self.validate_code(&code).await?)),
            None => Ok(None),
        }
    }

    /// Process one manually entered code.
    ///
    /// Manual entry enforces the strict fixed-length grammar and bypasses
    /// the scan cooldown.
    ///
    /// # Errors
    ///
    /// Same surface as [`Self::handle_scan`].
    pub async fn handle_manual_entry(
        &self,
        raw: &str,
    ) -> Result<ValidationDisposition, ValidationError> {
        let code = self.gate.lock().unwrap().on_manual_entry(raw)?;
        self.validate_code(&code).await
    }

    /// Validate an admitted code against the remote service.
    ///
    /// Success is recorded into history. A transport failure is converted
    /// into an enqueue — the caller sees `Queued`, never a raw transport
    /// error.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Client`] for application failures only.
    pub async fn validate_code(
        &self,
        code: &TicketCode,
    ) -> Result<ValidationDisposition, ValidationError> {
        match self.client.validate_ticket(code).await {
            Ok(outcome) => {
                self.history.record(code.clone(), outcome.clone()).await;
                Ok(ValidationDisposition::Validated(outcome))
            }
            Err(e) if e.is_transport() => {
                tracing::info!(%code, error = %e, "network unavailable; queueing attempt");
                let queue_len = self.queue.enqueue(code.clone()).await;
                Ok(ValidationDisposition::Queued { queue_len })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Retry queued attempts through the same validation client.
    ///
    /// Successful outcomes from the drain are recorded into history. A drain
    /// invoked while another is running is a no-op (`skipped` on the report).
    pub async fn drain_queue(&self) -> DrainReport {
        let report = self.queue.drain(&self.client).await;
        for (code, outcome) in &report.successes {
            self.history.record(code.clone(), outcome.clone()).await;
        }
        report
    }

    /// Queue counts; pure read.
    #[must_use]
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Empty the queue and delete its persisted snapshot.
    pub async fn clear_queue(&self) {
        self.queue.clear().await;
    }

    /// Validation history, newest first.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    /// Report counts derived from the history.
    #[must_use]
    pub fn validation_stats(&self) -> ValidationStats {
        self.history.stats()
    }

    /// Tear down the scan gate when the scanner is switched off.
    ///
    /// Cancels any pending cooldown so no stale admission state survives
    /// into the next scanning session.
    pub fn deactivate_scanner(&self) {
        self.gate.lock().unwrap().deactivate();
    }

    /// Authenticate and persist the session.
    ///
    /// Token and profile persistence failures are logged, not fatal: the
    /// session stays usable in memory for its lifetime.
    ///
    /// # Errors
    ///
    /// [`ClientError`] as classified by the client; transport failures are
    /// surfaced here (there is no offline login).
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let session = self
            .client
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        if let Err(e) = self.tokens.store_token(&session.access_token).await {
            tracing::warn!(error = %e, "failed to persist session token");
        }
        if let Err(e) = self.tokens.store_user(&session.user).await {
            tracing::warn!(error = %e, "failed to persist user profile");
        }
        Ok(session.user)
    }

    /// Drop the stored session.
    pub async fn logout(&self) {
        self.tokens.clear().await;
    }

    /// Profile of the logged-in crew member, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.tokens.current_user().await
    }
}
