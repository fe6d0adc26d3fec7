use crate::error::{AuthError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a secret held by the host vault.
///
/// # Examples
///
/// ```
/// use core_auth::CredentialId;
///
/// let id = CredentialId::from("5f1d0c");
/// assert_eq!(id.as_str(), "5f1d0c");
/// assert_eq!(id.to_string(), "5f1d0c");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(String);

impl CredentialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CredentialId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CredentialId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// OAuth token material as stored by the vault.
///
/// Replaced wholesale on refresh, never mutated in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds as reported when the token was minted
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
            token_type: None,
            scope: None,
        }
    }

    /// Parse the vault's credential JSON.
    ///
    /// # Errors
    ///
    /// `AuthError::MalformedCredential` when the payload is not JSON, lacks
    /// `access_token`, or carries an empty one.
    pub fn from_secret_bytes(credential_id: &CredentialId, bytes: &[u8]) -> Result<Self> {
        let credential: Credential =
            serde_json::from_slice(bytes).map_err(|e| AuthError::MalformedCredential {
                credential_id: credential_id.to_string(),
                reason: e.to_string(),
            })?;

        if credential.access_token.trim().is_empty() {
            return Err(AuthError::MalformedCredential {
                credential_id: credential_id.to_string(),
                reason: "access_token is empty".to_string(),
            });
        }

        Ok(credential)
    }
}

// Tokens never reach Debug output
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}
