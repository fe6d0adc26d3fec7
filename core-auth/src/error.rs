use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The vault answered but the payload is not a usable credential
    #[error("Malformed credential for secret {credential_id}: {reason}")]
    MalformedCredential {
        credential_id: String,
        reason: String,
    },

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    /// The remote API rejected a freshly refreshed token
    #[error("Authorization failed (status {status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// Transport failure from the vault or the remote API, passed through
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl AuthError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Unauthorized { .. })
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
