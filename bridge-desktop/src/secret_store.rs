//! Secret store backed by the integration platform's secrets REST service

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
    secrets::SecretStore,
};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Connection settings for the secrets service.
#[derive(Clone)]
pub struct SecretsApiConfig {
    pub base_url: String,
    pub workspace_id: String,
    pub username: String,
    pub api_key: String,
}

impl SecretsApiConfig {
    /// Read settings from `SECRETS_API_URL`, `SECRETS_WORKSPACE_ID`,
    /// `SECRETS_API_USERNAME` and `SECRETS_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: required_env("SECRETS_API_URL")?,
            workspace_id: required_env("SECRETS_WORKSPACE_ID")?,
            username: required_env("SECRETS_API_USERNAME")?,
            api_key: required_env("SECRETS_API_KEY")?,
        })
    }

    fn secret_url(&self, secret_id: &str) -> String {
        format!(
            "{}/v2/workspaces/{}/secrets/{}",
            self.base_url.trim_end_matches('/'),
            self.workspace_id,
            secret_id
        )
    }

    fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.username, self.api_key);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for SecretsApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretsApiConfig")
            .field("base_url", &self.base_url)
            .field("workspace_id", &self.workspace_id)
            .field("username", &self.username)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| BridgeError::NotAvailable(format!("{} is not set", name)))
}

#[derive(Deserialize)]
struct SecretEnvelope {
    data: SecretData,
}

#[derive(Deserialize)]
struct SecretData {
    attributes: SecretAttributes,
}

#[derive(Deserialize)]
struct SecretAttributes {
    credentials: Option<serde_json::Value>,
}

/// [`SecretStore`] over the platform secrets API.
pub struct PlatformSecretStore {
    http_client: Arc<dyn HttpClient>,
    config: SecretsApiConfig,
}

impl PlatformSecretStore {
    pub fn new(http_client: Arc<dyn HttpClient>, config: SecretsApiConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    async fn send(&self, secret_id: &str, request: HttpRequest) -> Result<HttpResponse> {
        let response = self
            .http_client
            .execute(
                request
                    .header("Authorization", self.config.basic_auth())
                    .header("Accept", "application/json"),
            )
            .await?;

        match response.status {
            200..=299 => Ok(response),
            404 => Err(BridgeError::NotFound(format!("secret {}", secret_id))),
            status => {
                warn!(status, secret_id, "Secrets service request failed");
                Err(BridgeError::OperationFailed(format!(
                    "Secrets service returned status {}",
                    status
                )))
            }
        }
    }
}

#[async_trait]
impl SecretStore for PlatformSecretStore {
    #[instrument(skip(self))]
    async fn fetch_secret(&self, secret_id: &str) -> Result<Vec<u8>> {
        let request = HttpRequest::new(HttpMethod::Get, self.config.secret_url(secret_id));
        let response = self.send(secret_id, request).await?;

        let envelope: SecretEnvelope = response.json()?;
        let credentials = envelope.data.attributes.credentials.ok_or_else(|| {
            BridgeError::OperationFailed(format!("secret {} has no credentials", secret_id))
        })?;

        debug!("Fetched secret");
        serde_json::to_vec(&credentials)
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to encode credentials: {}", e)))
    }

    #[instrument(skip(self))]
    async fn refresh_secret(&self, secret_id: &str) -> Result<()> {
        let url = format!("{}/refresh", self.config.secret_url(secret_id));
        self.send(secret_id, HttpRequest::new(HttpMethod::Post, url))
            .await?;

        debug!("Refreshed secret");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use serde_json::json;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn config() -> SecretsApiConfig {
        SecretsApiConfig {
            base_url: "https://api.example.com/".to_string(),
            workspace_id: "ws-1".to_string(),
            username: "robot@example.com".to_string(),
            api_key: "key".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_unwraps_credentials() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Get
                    && req.url == "https://api.example.com/v2/workspaces/ws-1/secrets/sec-9"
                    && req.headers.get("Authorization").map(String::as_str)
                        == Some("Basic cm9ib3RAZXhhbXBsZS5jb206a2V5")
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    json!({
                        "data": {
                            "id": "sec-9",
                            "attributes": {
                                "name": "Sheets",
                                "credentials": { "access_token": "ya29.token", "expires_in": 3599 }
                            }
                        }
                    })
                    .to_string(),
                ))
            });

        let store = PlatformSecretStore::new(Arc::new(http), config());
        let bytes = store.fetch_secret("sec-9").await.unwrap();

        let credentials: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(credentials, json!({ "access_token": "ya29.token", "expires_in": 3599 }));
    }

    #[tokio::test]
    async fn test_unknown_secret_is_not_found() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, "")));

        let store = PlatformSecretStore::new(Arc::new(http), config());

        assert!(matches!(
            store.fetch_secret("missing").await,
            Err(BridgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_secret_without_credentials() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse::new(
                200,
                json!({ "data": { "attributes": {} } }).to_string(),
            ))
        });

        let store = PlatformSecretStore::new(Arc::new(http), config());

        assert!(matches!(
            store.fetch_secret("sec-9").await,
            Err(BridgeError::OperationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_posts_to_refresh_endpoint() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Post
                    && req.url == "https://api.example.com/v2/workspaces/ws-1/secrets/sec-9/refresh"
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "{}")));

        let store = PlatformSecretStore::new(Arc::new(http), config());

        store.refresh_secret("sec-9").await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_is_operation_failure() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .returning(|_| Ok(HttpResponse::new(502, "bad gateway")));

        let store = PlatformSecretStore::new(Arc::new(http), config());

        assert!(matches!(
            store.refresh_secret("sec-9").await,
            Err(BridgeError::OperationFailed(_))
        ));
    }

    #[test]
    fn test_config_debug_hides_api_key() {
        let rendered = format!("{:?}", config());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("\"key\""));
    }
}
