use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default Hacker News origin
pub const DEFAULT_BASE_URL: &str = "https://news.ycombinator.com";

/// Browser-like user agent; the site serves reduced pages to unknown clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_4) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.1 Safari/605.1.15";

/// Main configuration structure for the archiver
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub source: SourceConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Polling and fetching behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Seconds between front page checks; also bounds a single cycle
    pub interval: u64,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Maximum simultaneous connections to a single host
    #[serde(rename = "max-host-connections")]
    pub max_host_connections: u32,

    /// Pause between story task dispatches (milliseconds)
    #[serde(rename = "dispatch-delay")]
    pub dispatch_delay: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            interval: 60,
            request_timeout: 10,
            max_host_connections: 3,
            dispatch_delay: 1000,
        }
    }
}

impl CrawlerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch_delay)
    }
}

/// Where stories come from
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Origin of the front page; relative links resolve against it
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// User agent sent with every request
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the archive tree
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("news"),
        }
    }
}
