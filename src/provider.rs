// src/provider.rs
use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{ ACCEPT, CACHE_CONTROL };
use serde_json::Value;
use crate::utils::provider_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    Transport(String),
    Status(u16),
    Decode(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Request to status provider failed: {}", e),
            Self::Status(code) => write!(f, "Status provider answered with HTTP {}", code),
            Self::Decode(e) => write!(f, "Status provider returned an unreadable body: {}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

/// External service that resolves a host into a raw status document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusProvider: Send + Sync {
    async fn lookup(&self, host: &str) -> Result<Value, ProviderError>;
}

/// mcsrvstat.us compatible provider: `GET <base>/<host>`.
pub struct HttpStatusProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatusProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl StatusProvider for HttpStatusProvider {
    async fn lookup(&self, host: &str) -> Result<Value, ProviderError> {
        let url = provider_url(&self.base_url, host);
        debug!("Fetching server status for {} from {}", host, url);

        let response = self.client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .send().await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        response
            .json::<Value>().await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}
