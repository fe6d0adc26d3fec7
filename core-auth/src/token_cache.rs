//! Credential Cache
//!
//! Holds the access token believed valid for each credential id, populated
//! lazily from the host vault.
//!
//! ## Single-flight
//!
//! Population and refresh run under a per-credential lock. A caller that
//! finds the entry empty takes the lock, re-checks, and only then asks the
//! vault. Callers arriving while a fetch is in flight queue on the same lock
//! and pick up the freshly cached credential, so N concurrent
//! [`acquire_token`](TokenCache::acquire_token) calls cost one vault fetch.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{CredentialId, TokenCache};
//! use std::sync::Arc;
//! # use bridge_traits::secrets::SecretStore;
//! # async fn example(store: Arc<dyn SecretStore>) -> core_auth::Result<()> {
//! let cache = TokenCache::new(store);
//! let id = CredentialId::from("5f1d0c");
//!
//! let credential = cache.acquire_token(&id).await?;
//! cache.invalidate(&id).await;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{Credential, CredentialId};
use async_trait::async_trait;
use bridge_traits::error::BridgeError;
use bridge_traits::secrets::SecretStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Notified every time a credential is (re)placed in the cache.
///
/// Hosts that keep their own copy of the tokens implement this to stay in
/// sync; the cache itself only logs the replacement.
#[async_trait]
pub trait TokenObserver: Send + Sync {
    async fn on_token_replaced(&self, credential_id: &CredentialId, credential: &Credential);
}

/// Process-wide credential cache, shared behind `Arc` by all callers.
pub struct TokenCache {
    secret_store: Arc<dyn SecretStore>,
    entries: RwLock<HashMap<CredentialId, Arc<Credential>>>,
    /// Per-credential locks serialising vault fetches
    fetch_locks: Mutex<HashMap<CredentialId, Arc<Mutex<()>>>>,
    observer: Option<Arc<dyn TokenObserver>>,
}

impl TokenCache {
    pub fn new(secret_store: Arc<dyn SecretStore>) -> Self {
        debug!("Initializing TokenCache");
        Self {
            secret_store,
            entries: RwLock::new(HashMap::new()),
            fetch_locks: Mutex::new(HashMap::new()),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TokenObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Cached credential, without touching the vault
    pub async fn cached(&self, credential_id: &CredentialId) -> Option<Arc<Credential>> {
        self.entries.read().await.get(credential_id).cloned()
    }

    /// Returns the cached credential or fetches it from the vault.
    ///
    /// # Errors
    ///
    /// - `AuthError::SecretNotFound` - the vault does not know the id
    /// - `AuthError::MalformedCredential` - the vault payload is unusable
    /// - `AuthError::Bridge` - vault transport failure
    #[instrument(skip(self), fields(credential_id = %credential_id))]
    pub async fn acquire_token(&self, credential_id: &CredentialId) -> Result<Arc<Credential>> {
        if let Some(credential) = self.cached(credential_id).await {
            return Ok(credential);
        }

        let lock = self.fetch_lock(credential_id).await;
        let _guard = lock.lock().await;

        // Another caller may have populated the entry while we waited
        if let Some(credential) = self.cached(credential_id).await {
            debug!("Credential populated by concurrent fetch");
            return Ok(credential);
        }

        self.fetch_and_store(credential_id).await
    }

    /// Drops the cached credential; the next acquire refetches.
    #[instrument(skip(self), fields(credential_id = %credential_id))]
    pub async fn invalidate(&self, credential_id: &CredentialId) {
        if self.entries.write().await.remove(credential_id).is_some() {
            debug!("Credential invalidated");
        }
    }

    /// Replaces a credential the remote API just rejected.
    ///
    /// Invalidates the entry, asks the vault to refresh the secret upstream
    /// and fetches the new material. When a concurrent caller already
    /// replaced `rejected`, its result is reused instead of refreshing twice.
    #[instrument(skip(self, rejected), fields(credential_id = %credential_id))]
    pub async fn refresh_after_rejection(
        &self,
        credential_id: &CredentialId,
        rejected: &Credential,
    ) -> Result<Arc<Credential>> {
        let lock = self.fetch_lock(credential_id).await;
        let _guard = lock.lock().await;

        if let Some(current) = self.cached(credential_id).await {
            if current.access_token != rejected.access_token {
                debug!("Credential already replaced by concurrent refresh");
                return Ok(current);
            }
        }

        self.invalidate(credential_id).await;

        info!("Requesting credential refresh from secret store");
        self.secret_store
            .refresh_secret(credential_id.as_str())
            .await
            .map_err(|e| Self::map_store_error(credential_id, e))?;

        self.fetch_and_store(credential_id).await
    }

    async fn fetch_lock(&self, credential_id: &CredentialId) -> Arc<Mutex<()>> {
        let mut locks = self.fetch_locks.lock().await;
        locks
            .entry(credential_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Must be called with the credential's fetch lock held.
    async fn fetch_and_store(&self, credential_id: &CredentialId) -> Result<Arc<Credential>> {
        debug!("Fetching credential from secret store");

        let bytes = self
            .secret_store
            .fetch_secret(credential_id.as_str())
            .await
            .map_err(|e| Self::map_store_error(credential_id, e))?;

        let credential = Arc::new(Credential::from_secret_bytes(credential_id, &bytes)?);

        self.entries
            .write()
            .await
            .insert(credential_id.clone(), Arc::clone(&credential));

        info!(
            has_refresh_token = credential.refresh_token.is_some(),
            expires_in = credential.expires_in,
            "Credential cached"
        );

        if let Some(observer) = &self.observer {
            observer.on_token_replaced(credential_id, &credential).await;
        }

        Ok(credential)
    }

    fn map_store_error(credential_id: &CredentialId, error: BridgeError) -> AuthError {
        match error {
            BridgeError::NotFound(_) => {
                warn!(credential_id = %credential_id, "Secret not found");
                AuthError::SecretNotFound(credential_id.to_string())
            }
            other => {
                warn!(credential_id = %credential_id, error = %other, "Secret store call failed");
                AuthError::Bridge(other)
            }
        }
    }
}
