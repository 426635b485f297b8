//! Configuration for the validation pipeline.
//!
//! Loads from environment variables with the production defaults baked in.

use std::env;
use std::time::Duration;
use zatix_client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

use crate::history::HISTORY_LIMIT;
use crate::queue::MAX_RETRY_ATTEMPTS;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL.
    pub api_base_url: String,
    /// Per-request timeout.
    pub api_timeout: Duration,
    /// Scan-gate cooldown window.
    pub scan_cooldown: Duration,
    /// Retry bound for queued attempts.
    pub max_retry_attempts: u32,
    /// Retention cap for the validation history.
    pub history_limit: usize,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("ZATIX_API_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_timeout: env::var("ZATIX_API_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(DEFAULT_TIMEOUT, Duration::from_secs),
            scan_cooldown: env::var("ZATIX_SCAN_COOLDOWN_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(zatix_core::DEFAULT_COOLDOWN, Duration::from_millis),
            max_retry_attempts: env::var("ZATIX_MAX_RETRY_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_RETRY_ATTEMPTS),
            history_limit: env::var("ZATIX_HISTORY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(HISTORY_LIMIT),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            api_timeout: DEFAULT_TIMEOUT,
            scan_cooldown: zatix_core::DEFAULT_COOLDOWN,
            max_retry_attempts: MAX_RETRY_ATTEMPTS,
            history_limit: HISTORY_LIMIT,
        }
    }
}
