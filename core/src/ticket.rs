//! Ticket-code normalization.
//!
//! Scanned payloads arrive in several shapes (bare codes, JSON payloads,
//! validation URLs, query strings), depending on which issuing tool produced
//! the QR code. [`TicketCode::normalize`] reduces all of them to the canonical
//! `ZTX-` identifier through an ordered list of parser strategies; the first
//! strategy that produces a match wins.
//!
//! Manual keyboard entry targets a single issuing scheme and uses the stricter
//! fixed-length grammar enforced by [`TicketCode::parse_manual`]. The
//! asymmetry between the two grammars is intentional.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

#[allow(clippy::unwrap_used)] // patterns are compile-time constants
fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap()
}

/// Canonical scan grammar: open-ended suffix, any issuing scheme.
static CANONICAL: LazyLock<Regex> = LazyLock::new(|| pattern(r"^ZTX-[A-Z0-9]+$"));

/// Manual-entry grammar: exactly ten characters after the prefix.
static MANUAL: LazyLock<Regex> = LazyLock::new(|| pattern(r"^ZTX-[A-Z0-9]{10}$"));

/// Trailing path segment of a validation URL.
static URL_PATH: LazyLock<Regex> = LazyLock::new(|| pattern(r"/(ZTX-[A-Z0-9-]+)$"));

/// `code=` / `ticket_code=` query parameter (input is uppercased first).
static QUERY_PARAM: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"[?&](?:CODE|TICKET_CODE)=(ZTX-[A-Z0-9-]+)"));

/// `ZTX-` pattern embedded anywhere in the payload.
static EMBEDDED: LazyLock<Regex> = LazyLock::new(|| pattern(r"ZTX-[A-Z0-9]+"));

/// A code that failed one of the ticket-code grammars.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// Scanned payload matched none of the recognized formats.
    #[error("ticket code format not recognized")]
    Unrecognized,

    /// Manually entered code failed the fixed-length grammar.
    #[error("invalid ticket code format, expected ZTX-XXXXXXXXXX")]
    InvalidManualCode,
}

/// Canonical ticket identifier (`ZTX-` prefixed, uppercase).
///
/// The sole key used for scan dedup, offline queueing and history. Values are
/// only produced by [`TicketCode::normalize`] and [`TicketCode::parse_manual`],
/// so a `TicketCode` always satisfies the prefix grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketCode(String);

/// One parser strategy: raw payload in, canonical candidate out.
type Strategy = fn(&str) -> Option<TicketCode>;

/// Ordered strategy list; evaluation stops at the first match.
const STRATEGIES: &[Strategy] = &[
    direct_code,
    json_payload,
    url_path_segment,
    query_parameter,
    embedded_code,
];

impl TicketCode {
    /// Normalize an arbitrary scanned payload into a canonical ticket code.
    ///
    /// Returns `None` when no strategy matches; the caller is expected to
    /// surface that as a [`FormatError::Unrecognized`] rather than drop the
    /// event silently.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        STRATEGIES.iter().find_map(|strategy| strategy(raw))
    }

    /// Parse a manually entered code against the strict 13-character grammar.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidManualCode`] when the trimmed, uppercased
    /// input is not exactly `ZTX-` plus ten alphanumerics.
    pub fn parse_manual(raw: &str) -> Result<Self, FormatError> {
        let candidate = raw.trim().to_uppercase();
        if MANUAL.is_match(&candidate) {
            Ok(Self(candidate))
        } else {
            Err(FormatError::InvalidManualCode)
        }
    }

    /// The canonical code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TicketCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whole payload is already a bare canonical code.
fn direct_code(raw: &str) -> Option<TicketCode> {
    let candidate = raw.trim().to_uppercase();
    CANONICAL.is_match(&candidate).then(|| TicketCode(candidate))
}

/// JSON payload carrying a `ticket_code` (or `code`) field.
///
/// Parses the original input, not the uppercased copy: JSON keys are
/// case-sensitive even though the code value itself is case-folded.
fn json_payload(raw: &str) -> Option<TicketCode> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let field = value
        .get("ticket_code")
        .or_else(|| value.get("code"))?
        .as_str()?;
    let candidate = field.trim().to_uppercase();
    CANONICAL.is_match(&candidate).then(|| TicketCode(candidate))
}

/// Validation-URL payload, e.g. `https://zatix.id/validate/ZTX-LIRGSH9MMA`.
fn url_path_segment(raw: &str) -> Option<TicketCode> {
    let candidate = raw.trim().to_uppercase();
    URL_PATH
        .captures(&candidate)
        .map(|caps| TicketCode(caps[1].to_string()))
}

/// Query-parameter payload, e.g. `…?ticket_code=ZTX-AB12`.
fn query_parameter(raw: &str) -> Option<TicketCode> {
    let candidate = raw.trim().to_uppercase();
    QUERY_PARAM
        .captures(&candidate)
        .map(|caps| TicketCode(caps[1].to_string()))
}

/// Last resort: a canonical code embedded anywhere in the payload.
fn embedded_code(raw: &str) -> Option<TicketCode> {
    let candidate = raw.trim().to_uppercase();
    EMBEDDED
        .find(&candidate)
        .map(|m| TicketCode(m.as_str().to_string()))
}
