//! Wire types for the ZaTix API.

use serde::{Deserialize, Serialize};
use zatix_core::TicketCode;

/// Body of `POST /e-tickets/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Canonical ticket code to validate.
    pub ticket_code: TicketCode,
}

/// Envelope of the validate endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Application-level acceptance flag; `false` is an application error
    /// even on a 2xx status.
    pub success: bool,
    /// Human-readable message from the API.
    #[serde(default)]
    pub message: String,
    /// Validation payload, present when `success` is `true`.
    pub data: Option<TicketValidation>,
}

/// Outcome of a server round trip for one ticket.
///
/// An `invalid` status is a legitimate outcome, not an error: the server
/// answered and the crew member sees the verdict. Servers that only report
/// accepted tickets omit the field, which defaults to `valid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketValidation {
    /// Canonical ticket code the verdict applies to.
    pub ticket_code: TicketCode,
    /// Verdict for this ticket.
    #[serde(default)]
    pub status: ValidationStatus,
    /// Verdict message, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Identifier of the event the ticket belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    /// Name of the event the ticket belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// Ticket holder name, when the issuing scheme records one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    /// Ticket class (e.g. regular, VIP).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<String>,
    /// Server-side validation timestamp, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<String>,
    /// Crew member who validated the ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_by: Option<ValidatedBy>,
    /// How many times this ticket had been presented before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_validations: Option<u32>,
}

/// Verdict attached to a [`TicketValidation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Ticket accepted.
    #[default]
    Valid,
    /// Ticket rejected (already used, wrong event, revoked).
    Invalid,
}

/// Crew member identity inside a validation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedBy {
    /// Crew member id.
    pub id: i64,
    /// Crew member display name.
    pub name: String,
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Crew account email.
    pub email: String,
    /// Crew account password.
    pub password: String,
}

/// Envelope of the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Application-level acceptance flag.
    pub success: bool,
    /// Human-readable message from the API.
    #[serde(default)]
    pub message: String,
    /// Session payload, present when `success` is `true`.
    pub data: Option<LoginData>,
}

/// Session payload returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    /// Bearer token for subsequent calls.
    pub access_token: String,
    /// Token scheme, `Bearer` in practice.
    pub token_type: String,
    /// Authenticated crew member.
    pub user: User,
}

/// Crew member profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Account id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
    /// Role names granted to this account.
    #[serde(default)]
    pub roles: Vec<String>,
}
