//! # Desktop Bridge Implementations
//!
//! Default host adapters for running the connector outside an integration
//! platform:
//! - `HttpClient` using `reqwest`, with timeouts and retries on 429/5xx
//! - `SecretStore` backed by the platform's secrets REST service
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{PlatformSecretStore, ReqwestHttpClient, SecretsApiConfig};
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let secrets = PlatformSecretStore::new(http_client.clone(), SecretsApiConfig::from_env()?);
//! ```

mod http;
mod secret_store;

pub use http::ReqwestHttpClient;
pub use secret_store::{PlatformSecretStore, SecretsApiConfig};
