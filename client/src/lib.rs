//! # ZaTix Client
//!
//! HTTP client for the ZaTix e-ticket API: crew login and ticket validation.
//!
//! The crate's one structural commitment is the error classification in
//! [`ClientError`]: a failure is either *transport* (no server response, the
//! offline queue may retry it) or *application* (the server answered and
//! said no, surfaced immediately). Credentials flow through the
//! [`TokenProvider`] seam so the client never owns token storage.

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use auth::TokenProvider;
pub use client::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::ClientError;
pub use types::{
    LoginData, LoginRequest, LoginResponse, TicketValidation, ValidatedBy, ValidationRequest,
    ValidationResponse, ValidationStatus, User,
};
