//! ZaTix API client implementation.

use crate::{
    auth::TokenProvider,
    error::ClientError,
    types::{LoginData, LoginRequest, LoginResponse, TicketValidation, ValidationRequest,
            ValidationResponse},
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use zatix_core::TicketCode;

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.zatix.id";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// ZaTix API client.
///
/// Wraps the two remote calls the pipeline needs (`/login` and
/// `/e-tickets/validate`) and classifies every failure as transport
/// (no response) or application (server rejected). The bearer credential is
/// looked up through the injected [`TokenProvider`] on every authenticated
/// call; a 401 invalidates it before the error surfaces.
#[derive(Clone)]
pub struct ApiClient<T: TokenProvider> {
    client: Client,
    base_url: String,
    timeout: Duration,
    tokens: T,
}

impl<T: TokenProvider> ApiClient<T> {
    /// Create a client against the production API.
    #[must_use]
    pub fn new(tokens: T) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT, tokens)
    }

    /// Create a client with an explicit base URL and per-request timeout.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration, tokens: T) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            timeout,
            tokens,
        }
    }

    /// Validate one ticket against the remote service.
    ///
    /// A returned [`TicketValidation`] means the server answered; its
    /// `status` field may still say `invalid`, which is a normal outcome.
    ///
    /// # Errors
    ///
    /// - [`ClientError::MissingCredential`] when no bearer token is stored
    /// - [`ClientError::Transport`] when no response was obtained (the only
    ///   variant eligible for offline queueing)
    /// - [`ClientError::Unauthorized`] on 401, after invalidating the stored
    ///   credential
    /// - [`ClientError::RateLimited`] on 429
    /// - [`ClientError::Rejected`] on a 2xx body with `success: false`
    /// - [`ClientError::Api`] on any other non-2xx status
    /// - [`ClientError::ResponseParse`] when a 2xx body does not match the
    ///   wire contract
    pub async fn validate_ticket(&self, code: &TicketCode) -> Result<TicketValidation, ClientError> {
        let token = self
            .tokens
            .bearer_token()
            .await
            .ok_or(ClientError::MissingCredential)?;

        tracing::debug!(%code, "validating ticket");

        let response = self
            .client
            .post(format!("{}/e-tickets/validate", self.base_url))
            .bearer_auth(token)
            .header("accept", "application/json")
            .timeout(self.timeout)
            .json(&ValidationRequest {
                ticket_code: code.clone(),
            })
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                // Never retry with a dead credential: drop it before surfacing.
                self.tokens.invalidate().await;
                Err(ClientError::Unauthorized)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(ClientError::RateLimited),
            status if status.is_success() => {
                let body = response
                    .json::<ValidationResponse>()
                    .await
                    .map_err(|e| ClientError::ResponseParse(e.to_string()))?;

                if body.success {
                    body.data
                        .ok_or_else(|| ClientError::ResponseParse("missing data payload".into()))
                } else {
                    Err(ClientError::Rejected {
                        message: body.message,
                    })
                }
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ClientError::Api {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }

    /// Authenticate a crew member and return the session payload.
    ///
    /// Storing the returned token is the caller's responsibility; this call
    /// attaches no bearer header and a 401 does not touch stored credentials.
    ///
    /// # Errors
    ///
    /// Same classification as [`Self::validate_ticket`], minus the
    /// credential lookup.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginData, ClientError> {
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .header("accept", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(ClientError::RateLimited),
            status if status.is_success() => {
                let body = response
                    .json::<LoginResponse>()
                    .await
                    .map_err(|e| ClientError::ResponseParse(e.to_string()))?;

                if body.success {
                    body.data
                        .ok_or_else(|| ClientError::ResponseParse("missing data payload".into()))
                } else {
                    Err(ClientError::Rejected {
                        message: body.message,
                    })
                }
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ClientError::Api {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }

    /// Base URL this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct NoToken;

    impl TokenProvider for NoToken {
        async fn bearer_token(&self) -> Option<String> {
            None
        }

        async fn invalidate(&self) {}
    }

    #[test]
    fn client_creation() {
        let client = ApiClient::new(NoToken);
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn validate_without_credential_fails_before_sending() {
        let client = ApiClient::new(NoToken);
        let code = TicketCode::normalize("ZTX-AB12").unwrap();

        let err = client.validate_ticket(&code).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingCredential));
    }
}
