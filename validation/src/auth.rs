//! Stored-credential provider.
//!
//! Implements the client's [`TokenProvider`] seam on top of the persisted
//! storage collaborator: the bearer token lives under its own key (secure
//! storage on device) together with the logged-in crew member's profile.

use crate::storage::{KeyValueStore, StorageError, keys};
use zatix_client::{TokenProvider, User};

/// Bearer-credential provider backed by the key-value store.
#[derive(Debug, Clone)]
pub struct StoredTokenProvider<S> {
    store: S,
}

impl<S: KeyValueStore> StoredTokenProvider<S> {
    /// Wrap a storage backend.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persist a freshly issued bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend write fails; the caller
    /// decides whether the session can proceed without a persisted token.
    pub async fn store_token(&self, token: &str) -> Result<(), StorageError> {
        self.store.set(keys::AUTH_TOKEN, token).await
    }

    /// Persist the logged-in crew member profile.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend write fails.
    pub async fn store_user(&self, user: &User) -> Result<(), StorageError> {
        let blob = serde_json::to_string(user)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        self.store.set(keys::USER_DATA, &blob).await
    }

    /// Profile of the logged-in crew member, if any.
    pub async fn current_user(&self) -> Option<User> {
        let blob = match self.store.get(keys::USER_DATA).await {
            Ok(blob) => blob?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored user profile");
                return None;
            }
        };
        match serde_json::from_str(&blob) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "corrupt stored user profile");
                None
            }
        }
    }

    /// Drop both the token and the profile (logout).
    pub async fn clear(&self) {
        if let Err(e) = self.store.remove(keys::AUTH_TOKEN).await {
            tracing::warn!(error = %e, "failed to remove stored token");
        }
        if let Err(e) = self.store.remove(keys::USER_DATA).await {
            tracing::warn!(error = %e, "failed to remove stored user profile");
        }
    }
}

impl<S: KeyValueStore> TokenProvider for StoredTokenProvider<S> {
    async fn bearer_token(&self) -> Option<String> {
        match self.store.get(keys::AUTH_TOKEN).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored token");
                None
            }
        }
    }

    async fn invalidate(&self) {
        if let Err(e) = self.store.remove(keys::AUTH_TOKEN).await {
            tracing::warn!(error = %e, "failed to remove rejected token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn token_round_trip_and_invalidation() {
        let provider = StoredTokenProvider::new(MemoryStore::new());

        assert_eq!(provider.bearer_token().await, None);

        provider.store_token("tok-1").await.unwrap();
        assert_eq!(provider.bearer_token().await.as_deref(), Some("tok-1"));

        provider.invalidate().await;
        assert_eq!(provider.bearer_token().await, None);
    }

    #[tokio::test]
    async fn clear_drops_token_and_profile() {
        let provider = StoredTokenProvider::new(MemoryStore::new());
        provider.store_token("tok-1").await.unwrap();
        provider
            .store_user(&User {
                id: 1,
                name: "Crew".into(),
                email: "crew@zatix.id".into(),
                roles: vec!["crew".into()],
            })
            .await
            .unwrap();

        assert!(provider.current_user().await.is_some());

        provider.clear().await;
        assert_eq!(provider.bearer_token().await, None);
        assert!(provider.current_user().await.is_none());
    }
}
