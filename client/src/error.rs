//! Error types for the ZaTix API client.

use thiserror::Error;

/// Errors that can occur when calling the ZaTix API.
///
/// The transport/application split is the load-bearing classification in the
/// pipeline: only [`ClientError::Transport`] is eligible for the offline
/// queue. Everything else means the server answered (or the request was never
/// sendable) and retrying without operator involvement would be wrong.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response obtained: connection refused, DNS failure, timeout.
    #[error("no response from server: {0}")]
    Transport(String),

    /// Server answered 2xx but the body did not match the wire contract.
    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    /// No bearer credential is available for an authenticated call.
    #[error("no stored credential; log in first")]
    MissingCredential,

    /// Unauthorized - credential rejected (the stored token has been
    /// invalidated as a side effect).
    #[error("unauthorized - invalid or expired credentials")]
    Unauthorized,

    /// Rate limited - too many requests.
    #[error("rate limited - too many requests")]
    RateLimited,

    /// Server reached, request rejected at the application level
    /// (`success: false` body on a 2xx response).
    #[error("validation rejected: {message}")]
    Rejected {
        /// Message from the API body.
        message: String,
    },

    /// Server reached, non-2xx status outside the dedicated variants.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        message: String,
    },
}

impl ClientError {
    /// Whether this failure means no server response was obtained.
    ///
    /// This is the single switch the offline queue keys off: transport
    /// failures are queued and retried, everything else surfaces immediately.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_is_queue_eligible() {
        assert!(ClientError::Transport("connection refused".into()).is_transport());

        assert!(!ClientError::Unauthorized.is_transport());
        assert!(!ClientError::RateLimited.is_transport());
        assert!(!ClientError::MissingCredential.is_transport());
        assert!(!ClientError::ResponseParse("bad json".into()).is_transport());
        assert!(
            !ClientError::Rejected {
                message: "already validated".into()
            }
            .is_transport()
        );
        assert!(
            !ClientError::Api {
                status: 404,
                message: "not found".into()
            }
            .is_transport()
        );
    }
}
