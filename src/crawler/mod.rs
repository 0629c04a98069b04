//! Crawler module for polling and archiving
//!
//! This module contains the core archiving logic, including:
//! - HTTP fetching under a per-host connection ceiling
//! - HTML parsing of the front page and discussion threads
//! - Per-story fan-out over the article, thread, and thread links
//! - Polling cycles and the monitor loop that drives them

mod archiver;
mod cycle;
mod fetcher;
mod limiter;
mod monitor;
mod parser;

pub use archiver::StoryArchiver;
pub use cycle::{CycleReport, CycleRunner};
pub use fetcher::{build_http_client, FetchMode, FetchResult, Fetcher, HttpFetcher, Payload};
pub use limiter::{HostLimiter, HostPermit};
pub use monitor::Monitor;
pub use parser::{HnParser, PageParser, Story};

use crate::config::Config;
use crate::storage::ArchiveStore;
use std::sync::Arc;

/// Wires the HTTP fetcher, the Hacker News parser, and the archive store
/// described by `config` into a monitor
///
/// The output directory is created here; failing to create it is fatal.
///
/// # Example
///
/// ```no_run
/// use hn_archiver::config::Config;
/// use hn_archiver::crawler::build_monitor;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let monitor = build_monitor(&Config::default())?;
/// monitor.run(async { let _ = tokio::signal::ctrl_c().await; }).await;
/// # Ok(())
/// # }
/// ```
pub fn build_monitor(config: &Config) -> crate::Result<Monitor> {
    let store = ArchiveStore::new(config.output.directory.clone());
    store.init()?;

    let fetcher = Arc::new(HttpFetcher::from_config(config)?);
    let parser = Arc::new(HnParser::new()?);
    let archiver = StoryArchiver::new(fetcher, parser, store);

    let runner = CycleRunner::new(
        archiver,
        config.source.base_url.clone(),
        config.crawler.dispatch_delay(),
    );

    Ok(Monitor::new(runner, config.crawler.interval()))
}
