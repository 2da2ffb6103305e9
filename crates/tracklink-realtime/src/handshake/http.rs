//! Connect-key handshake over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::COOKIE;
use serde::Deserialize;
use tracing::debug;

use tracklink_core::config::link::LinkConfig;
use tracklink_core::error::ErrorKind;
use tracklink_core::traits::HandshakeClient;
use tracklink_core::{AppError, AppResult};

/// Response body of the connect-key endpoint.
#[derive(Debug, Deserialize)]
struct ConnectKeyResponse {
    key: String,
}

/// Fetches connect keys with a `POST` to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpHandshakeClient {
    client: Client,
    endpoint: String,
}

impl HttpHandshakeClient {
    /// Creates a client for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Creates a client from `link.handshake_url`.
    pub fn from_config(config: &LinkConfig) -> AppResult<Self> {
        let endpoint = config
            .handshake_url
            .clone()
            .ok_or_else(|| AppError::configuration("link.handshake_url is not set"))?;
        Ok(Self::new(endpoint))
    }

    /// The endpoint keys are fetched from.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl HandshakeClient for HttpHandshakeClient {
    async fn fetch_connect_key(&self, cookie_header: Option<&str>) -> AppResult<String> {
        let mut request = self.client.post(&self.endpoint);
        if let Some(cookie) = cookie_header {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Handshake,
                format!("Connect key request to {} failed", self.endpoint),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::handshake(format!(
                "Connect key request returned {status}"
            )));
        }

        let body: ConnectKeyResponse = response.json().await.map_err(|e| {
            AppError::with_source(ErrorKind::Handshake, "Malformed connect key response", e)
        })?;

        if body.key.is_empty() {
            return Err(AppError::handshake("Connect key response carried an empty key"));
        }

        debug!(endpoint = %self.endpoint, "Connect key fetched");
        Ok(body.key)
    }
}
