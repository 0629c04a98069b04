//! HTTP fetcher implementation
//!
//! This module handles all network requests for the archiver:
//! - Building the HTTP client with the configured user agent and timeout
//! - Resolving scheme-less links against the source origin
//! - Holding a per-host connection slot for the lifetime of each request
//! - Materializing the body as text or raw bytes
//! - Classifying failures

use crate::config::Config;
use crate::crawler::limiter::HostLimiter;
use crate::url::{host_key, resolve_url};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// How the response body should be materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Decode the body as text (HTML pages)
    Text,
    /// Keep the raw bytes (linked resources of unknown type)
    Binary,
}

/// Downloaded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Body as text; binary payloads are decoded lossily
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// The downloaded content
    pub payload: Payload,

    /// Content-Type reported by the server, used to pick a file extension.
    /// Empty when the server sent none.
    pub kind: String,
}

/// A single network GET
///
/// Implementations never return partial data: a fetch either yields the full
/// body or a [`FetchError`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, mode: FetchMode) -> Result<FetchResult, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The archiver configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use hn_archiver::config::Config;
/// use hn_archiver::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let timeout = config.crawler.request_timeout();

    Client::builder()
        .user_agent(config.user_agent.value.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by `reqwest`
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    limiter: Arc<HostLimiter>,
}

impl HttpFetcher {
    pub fn new(client: Client, base_url: Url, limiter: Arc<HostLimiter>) -> Self {
        Self {
            client,
            base_url,
            limiter,
        }
    }

    /// Builds the client, base origin, and per-host limiter from configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let client = build_http_client(config)?;
        let base_url = Url::parse(&config.source.base_url)?;
        let limiter = Arc::new(HostLimiter::new(
            config.crawler.max_host_connections as usize,
        ));
        Ok(Self::new(client, base_url, limiter))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn limiter(&self) -> &Arc<HostLimiter> {
        &self.limiter
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Fetches a URL, waiting for a free connection slot on its host first
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Link cannot be resolved | `InvalidUrl` |
    /// | Non-2xx response | `Status` |
    /// | Timeout (connect or body) | `Timeout` |
    /// | Any other transport failure | `Transport` |
    async fn fetch(&self, raw: &str, mode: FetchMode) -> Result<FetchResult, FetchError> {
        let url = resolve_url(&self.base_url, raw).map_err(|e| FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        let host = host_key(&url).unwrap_or_default();

        let _permit = self
            .limiter
            .acquire(&host)
            .await
            .map_err(|_| FetchError::LimiterClosed {
                url: url.to_string(),
            })?;

        tracing::debug!(url = %url, ?mode, "Downloading");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let kind = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let payload = match mode {
            FetchMode::Text => Payload::Text(
                response
                    .text()
                    .await
                    .map_err(|e| classify_error(url.as_str(), e))?,
            ),
            FetchMode::Binary => Payload::Binary(
                response
                    .bytes()
                    .await
                    .map_err(|e| classify_error(url.as_str(), e))?
                    .to_vec(),
            ),
        };

        Ok(FetchResult { payload, kind })
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}
