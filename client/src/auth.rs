//! Credential seam between the client and the authentication collaborator.

use std::future::Future;

/// Supplier of the bearer credential attached to authenticated calls.
///
/// The client looks the token up before every request and notifies the
/// provider when the server rejects it with a 401, so a dead credential is
/// never silently retried. Implementations live outside this crate (the
/// validation crate ships one backed by persisted storage).
pub trait TokenProvider: Send + Sync {
    /// Current bearer token, if any.
    fn bearer_token(&self) -> impl Future<Output = Option<String>> + Send;

    /// Discard the stored credential after the server rejected it.
    fn invalidate(&self) -> impl Future<Output = ()> + Send;
}
