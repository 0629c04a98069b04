//! hn-archiver: an incremental news archiver
//!
//! This crate polls a news aggregator's front page, discovers newly listed
//! stories, and archives each story's article, its discussion thread, and
//! every outbound link referenced in that thread. Stories that already have
//! an archived article on disk are skipped.

pub mod config;
pub mod crawler;
pub mod stats;
pub mod storage;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for archiver operations
#[derive(Debug, Error)]
pub enum ArchiverError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    #[error("Cycle did not finish within {0:?}")]
    CycleTimeout(Duration),

    #[error("Cycle panicked: {0}")]
    CyclePanic(String),
}

/// Errors produced by a single network fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Connection limiter closed while waiting for {url}")]
    LimiterClosed { url: String },
}

impl FetchError {
    /// Returns the URL the failed fetch was aimed at
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. }
            | Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Transport { url, .. }
            | Self::LimiterClosed { url } => url,
        }
    }
}

/// Archive store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Can't write {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid archive name: {0:?}")]
    InvalidName(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for archiver operations
pub type Result<T> = std::result::Result<T, ArchiverError>;

/// Result type alias for archive store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CycleReport, FetchResult, Payload, Story};
pub use storage::ArchiveStore;
