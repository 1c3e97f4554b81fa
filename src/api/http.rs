//! HTTP plumbing shared by every resource module.
//!
//! One [`ApiClient`] per client instance: a reqwest client with a shared
//! cookie jar (the server drives the session through `token`/`role`
//! cookies), base-URL joining, envelope unwrapping and a single automatic
//! retry of GETs on transport failure.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ClientError;
use crate::guard::EdgeCredentials;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Every endpoint answers `{success, content?, message?}`; `success:false`
/// is treated exactly like a transport error by callers.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub content: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: String,
    retry: u32,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ClientError::Config(err.to_string()))?;

        Ok(Self {
            http,
            jar,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with at most `retry` automatic retries on transport failure.
    /// Mutating verbs are never auto-retried.
    pub async fn get(&self, path: &str) -> Result<Value, ClientError> {
        let url = self.url(path);
        let mut attempt = 0;
        loop {
            match self.execute(self.http.get(&url)).await {
                Err(ClientError::Network(reason)) if attempt < self.retry => {
                    attempt += 1;
                    debug!(%url, attempt, reason, "retrying after transport failure");
                }
                outcome => return outcome,
            }
        }
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, ClientError> {
        let mut builder = self.http.post(self.url(path));
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        self.execute(builder).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.execute(self.http.put(self.url(path)).json(&body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        self.execute(self.http.delete(self.url(path))).await
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<Value, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        let envelope: ApiEnvelope<Value> = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(status = status.as_u16(), error = %err, "unparseable response body");
                return Err(ClientError::Api {
                    status: Some(status.as_u16()),
                    message: status.to_string(),
                });
            }
        };

        if !status.is_success() || !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "request failed".to_string());
            return Err(ClientError::Api {
                status: Some(status.as_u16()),
                message,
            });
        }

        Ok(envelope.content.unwrap_or(Value::Null))
    }

    /// Raw `Cookie:` header for the current session, shared with the live
    /// channel so the WebSocket authenticates the same way REST calls do.
    pub fn cookie_header(&self) -> Option<String> {
        let url = Url::parse(&self.base_url).ok()?;
        let header = self.jar.cookies(&url)?;
        header.to_str().ok().map(str::to_string)
    }

    /// The lightweight `token`/`role` pair the edge-level route guard runs
    /// on before any session check has resolved.
    pub fn edge_credentials(&self) -> EdgeCredentials {
        EdgeCredentials::from_cookie_header(self.cookie_header().as_deref().unwrap_or(""))
    }

    /// Seed a cookie into the shared jar, as when the embedding platform
    /// hands over credentials it already holds.
    pub fn seed_cookie(&self, cookie: &str) {
        if let Ok(url) = Url::parse(&self.base_url) {
            self.jar.add_cookie_str(cookie, &url);
        }
    }
}

/// Deserialize an envelope `content` into its typed shape.
pub(crate) fn decode<T: DeserializeOwned>(content: Value) -> Result<T, ClientError> {
    serde_json::from_value(content).map_err(ClientError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_success_shape() {
        let envelope: ApiEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":true,"content":[1,2,3]}"#).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.content, Some(vec![1, 2, 3]));
        assert_eq!(envelope.message, None);
    }

    #[test]
    fn envelope_decodes_failure_shape() {
        let envelope: ApiEnvelope<Value> =
            serde_json::from_str(r#"{"success":false,"message":"No prior check-in"}"#).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("No prior check-in"));
    }

    #[tokio::test]
    async fn seeded_cookies_surface_as_edge_credentials() {
        let client = ApiClient::new(&Config::new("http://localhost:4000/api")).unwrap();
        assert!(client.edge_credentials().token.is_none());

        client.seed_cookie("token=abc; Path=/");
        client.seed_cookie("role=EMPLOYEE; Path=/");
        let creds = client.edge_credentials();
        assert_eq!(creds.token.as_deref(), Some("abc"));
        assert_eq!(creds.role.as_deref(), Some("EMPLOYEE"));
    }
}
