//! Authorized remote calls
//!
//! [`AuthorizedCaller`] attaches the cached bearer token to a remote
//! operation and recovers from one token rejection:
//!
//! 1. Acquire the credential (cache, else vault)
//! 2. Invoke the operation with the access token
//! 3. On 401/403: refresh through the vault and invoke exactly once more
//! 4. A second 401/403 becomes [`AuthError::Unauthorized`]; transport
//!    errors are returned unchanged at any step
//! 5. Any other response is passed through untouched
//!
//! ```no_run
//! use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
//! use core_auth::{AuthorizedCaller, CredentialId, TokenCache};
//! use std::sync::Arc;
//! # async fn example(cache: Arc<TokenCache>, http: Arc<dyn HttpClient>) -> core_auth::Result<()> {
//! let caller = AuthorizedCaller::new(cache, CredentialId::from("5f1d0c"));
//!
//! let response = caller
//!     .call(|token| {
//!         let http = Arc::clone(&http);
//!         async move {
//!             let request = HttpRequest::new(HttpMethod::Get, "https://sheets.googleapis.com/v4/spreadsheets/abc")
//!                 .bearer_token(token);
//!             http.execute(request).await
//!         }
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::token_cache::TokenCache;
use crate::types::CredentialId;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::HttpResponse;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Response shape the caller needs to recognise a rejected token.
pub trait AuthStatus {
    fn status_code(&self) -> u16;

    /// Body excerpt carried by [`AuthError::Unauthorized`]
    fn failure_detail(&self) -> String;

    fn is_auth_failure(&self) -> bool {
        matches!(self.status_code(), 401 | 403)
    }
}

impl AuthStatus for HttpResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn failure_detail(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn is_auth_failure(&self) -> bool {
        HttpResponse::is_auth_failure(self)
    }
}

/// Wraps remote operations for one credential.
#[derive(Clone)]
pub struct AuthorizedCaller {
    cache: Arc<TokenCache>,
    credential_id: CredentialId,
}

impl AuthorizedCaller {
    pub fn new(cache: Arc<TokenCache>, credential_id: CredentialId) -> Self {
        Self {
            cache,
            credential_id,
        }
    }

    pub fn credential_id(&self) -> &CredentialId {
        &self.credential_id
    }

    /// Run `operation` with a valid bearer token.
    ///
    /// `operation` receives the access token and may be invoked twice, so it
    /// must be safe to repeat.
    #[instrument(skip(self, operation), fields(credential_id = %self.credential_id))]
    pub async fn call<F, Fut, R>(&self, operation: F) -> Result<R>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = BridgeResult<R>>,
        R: AuthStatus,
    {
        let credential = self.cache.acquire_token(&self.credential_id).await?;

        let response = operation(credential.access_token.clone()).await?;
        if !response.is_auth_failure() {
            return Ok(response);
        }

        warn!(
            status = response.status_code(),
            "Remote API rejected access token, refreshing credential"
        );

        let refreshed = self
            .cache
            .refresh_after_rejection(&self.credential_id, &credential)
            .await?;

        let retry = operation(refreshed.access_token.clone()).await?;
        if retry.is_auth_failure() {
            warn!(
                status = retry.status_code(),
                "Remote API rejected refreshed token"
            );
            return Err(AuthError::Unauthorized {
                status: retry.status_code(),
                body: retry.failure_detail(),
            });
        }

        debug!(status = retry.status_code(), "Retry with refreshed token succeeded");
        Ok(retry)
    }
}
