//! Secret Store Abstraction
//!
//! The host platform keeps OAuth credential material in a vault addressed by
//! an opaque secret id. The connector only ever reads it and asks the vault to
//! refresh it when the provider rejects the current access token.

use async_trait::async_trait;

use crate::error::Result;

/// Credential vault owned by the host runtime.
///
/// # Security
///
/// - Returned bytes contain live tokens and must never be logged
/// - Implementations should not cache; caching is done by the caller
///
/// # Example
///
/// ```ignore
/// use bridge_traits::secrets::SecretStore;
///
/// async fn load(store: &dyn SecretStore) -> bridge_traits::error::Result<Vec<u8>> {
///     store.fetch_secret("5f1d0c").await
/// }
/// ```
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the credential JSON for a secret id.
    ///
    /// The payload is the bare credentials object
    /// (`{"access_token": ..., "refresh_token": ..., ...}`), already unwrapped
    /// from any platform envelope.
    ///
    /// # Errors
    ///
    /// - `BridgeError::NotFound` when the secret id is unknown
    /// - `BridgeError::OperationFailed` on network failures
    async fn fetch_secret(&self, secret_id: &str) -> Result<Vec<u8>>;

    /// Ask the vault to refresh the secret with its upstream provider.
    ///
    /// A subsequent [`fetch_secret`](Self::fetch_secret) returns the new
    /// material.
    async fn refresh_secret(&self, secret_id: &str) -> Result<()>;
}
