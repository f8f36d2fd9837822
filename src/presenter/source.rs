// src/presenter/source.rs
use std::fmt;
use std::time::{ Duration, SystemTime, UNIX_EPOCH };
use async_trait::async_trait;
use log::debug;
use reqwest::header::CACHE_CONTROL;
use crate::models::server::{ ServerStatus, StatusResponse };

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    Transport(String),
    Status(u16),
    Decode(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Failed to reach status endpoint: {}", e),
            Self::Status(code) => write!(f, "Status endpoint answered with HTTP {}", code),
            Self::Decode(e) => write!(f, "Invalid status payload: {}", e),
        }
    }
}

impl std::error::Error for SourceError {}

/// Where the presenter gets its snapshots from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<ServerStatus>, SourceError>;
}

/// Reads the aggregator's `/status` endpoint over HTTP.
pub struct HttpStatusSource {
    client: reqwest::Client,
    url: String,
}

impl HttpStatusSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(Self { client, url: url.to_string() })
    }
}

fn cache_buster() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> Result<Vec<ServerStatus>, SourceError> {
        let t = cache_buster();
        debug!("Polling {} (t={})", self.url, t);

        let response = self.client
            .get(&self.url)
            .query(&[("t", t.as_str())])
            .header(CACHE_CONTROL, "no-store")
            .send().await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response
            .json::<StatusResponse>().await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(body.servers)
    }
}
