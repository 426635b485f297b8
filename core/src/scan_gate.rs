//! Scan admission control.
//!
//! The camera fires decode callbacks far faster than tickets can be
//! validated; [`ScanGate`] sits in front of the validation pipeline and
//! admits each new code exactly once, then holds a cooldown window during
//! which every further scan event is dropped.
//!
//! The cooldown is a deadline on the tokio clock rather than a spawned
//! timer task: expiry needs no external event, deactivation cannot race a
//! pending callback, and paused-clock tests can drive the boundary
//! deterministically.

use crate::ticket::{FormatError, TicketCode};
use std::time::Duration;
use tokio::time::Instant;

/// Default cooldown window between admitted scans.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(2000);

/// Admission filter in front of the scan callback.
///
/// Two states: `Idle` (no deadline armed) and `Cooldown` (deadline in the
/// future). Reaching the deadline resets the gate completely, including the
/// last-accepted code, so the same ticket can be re-scanned once the window
/// has passed.
#[derive(Debug)]
pub struct ScanGate {
    last_accepted: Option<TicketCode>,
    cooldown_until: Option<Instant>,
    cooldown: Duration,
}

impl ScanGate {
    /// Create a gate with the default 2-second cooldown.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cooldown(DEFAULT_COOLDOWN)
    }

    /// Create a gate with an explicit cooldown window.
    #[must_use]
    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            last_accepted: None,
            cooldown_until: None,
            cooldown,
        }
    }

    /// Process one camera scan event.
    ///
    /// Returns `Ok(Some(code))` exactly once per admitted code; the caller
    /// forwards it to the validation client. `Ok(None)` means the event was
    /// dropped silently (gate inactive, caller still loading, cooldown in
    /// effect, or duplicate of the last accepted code).
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Unrecognized`] when the payload matches none of
    /// the known formats. Rejections never change gate state and are reported
    /// on every occurrence, not deduplicated.
    pub fn on_scan(
        &mut self,
        raw: &str,
        active: bool,
        loading: bool,
    ) -> Result<Option<TicketCode>, FormatError> {
        if !active || loading {
            return Ok(None);
        }

        self.expire_cooldown();

        // Cooldown check comes before extraction: while the window is open
        // every event is dropped, parseable or not.
        if self.cooldown_until.is_some() {
            tracing::debug!("scan dropped: cooldown in effect");
            return Ok(None);
        }

        let code = TicketCode::normalize(raw).ok_or(FormatError::Unrecognized)?;

        if self.last_accepted.as_ref() == Some(&code) {
            tracing::debug!(%code, "scan dropped: duplicate of last accepted code");
            return Ok(None);
        }

        self.last_accepted = Some(code.clone());
        self.cooldown_until = Some(Instant::now() + self.cooldown);
        Ok(Some(code))
    }

    /// Process one manually entered code.
    ///
    /// Manual entry bypasses the cooldown window entirely but still records
    /// the code as last accepted, so an immediate camera re-scan of the same
    /// ticket is deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidManualCode`] when the input fails the
    /// strict fixed-length grammar.
    pub fn on_manual_entry(&mut self, raw: &str) -> Result<TicketCode, FormatError> {
        self.expire_cooldown();
        let code = TicketCode::parse_manual(raw)?;
        self.last_accepted = Some(code.clone());
        Ok(code)
    }

    /// Tear the gate down when scanning is switched off.
    ///
    /// Cancels the pending cooldown deadline so no stale state survives into
    /// the next scanning session.
    pub fn deactivate(&mut self) {
        self.last_accepted = None;
        self.cooldown_until = None;
    }

    /// Whether the cooldown window is currently open.
    #[must_use]
    pub fn in_cooldown(&self) -> bool {
        self.cooldown_until.is_some_and(|until| Instant::now() < until)
    }

    /// Reset the gate once the deadline has passed.
    fn expire_cooldown(&mut self) {
        if self.cooldown_until.is_some_and(|until| Instant::now() >= until) {
            self.cooldown_until = None;
            self.last_accepted = None;
        }
    }
}

impl Default for ScanGate {
    fn default() -> Self {
        Self::new()
    }
}
