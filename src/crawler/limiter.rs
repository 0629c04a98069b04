//! Per-host connection ceiling
//!
//! Every fetch holds a permit from the semaphore of its target host for the
//! whole request. Callers past the ceiling wait for a permit instead of being
//! rejected, and the permit is released when it is dropped, whatever way the
//! fetch ends.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

type HostMap = DashMap<String, Arc<Semaphore>>;

/// A held connection slot for one host
///
/// Dropping the last permit of an otherwise idle host forgets that host.
#[derive(Debug)]
pub struct HostPermit {
    permit: Option<OwnedSemaphorePermit>,
    host: String,
    hosts: Arc<HostMap>,
}

impl Drop for HostPermit {
    fn drop(&mut self) {
        drop(self.permit.take());

        // Every permit and every waiter holds a clone of the semaphore
        self.hosts
            .remove_if(&self.host, |_, semaphore| Arc::strong_count(semaphore) == 1);
    }
}

/// Process-wide cap on simultaneous connections per host
///
/// One instance is shared by every fetch in the process. Tests inject a
/// smaller or unlimited limiter instead. Only hosts with a fetch in flight or
/// waiting are tracked.
#[derive(Debug)]
pub struct HostLimiter {
    limit: usize,
    hosts: Arc<HostMap>,
}

impl HostLimiter {
    /// Creates a limiter allowing `limit` connections per host (at least one)
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            hosts: Arc::new(DashMap::new()),
        }
    }

    /// Creates a limiter that never makes a caller wait
    pub fn unlimited() -> Self {
        Self::new(Semaphore::MAX_PERMITS)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Waits for a free connection slot on `host`
    pub async fn acquire(&self, host: &str) -> Result<HostPermit, AcquireError> {
        let semaphore = self.get_or_create(host);
        let permit = semaphore.acquire_owned().await?;
        Ok(HostPermit {
            permit: Some(permit),
            host: host.to_string(),
            hosts: self.hosts.clone(),
        })
    }

    /// Number of slots currently free for `host`
    pub fn available(&self, host: &str) -> usize {
        self.hosts
            .get(host)
            .map(|semaphore| semaphore.available_permits())
            .unwrap_or(self.limit)
    }

    /// Number of hosts with a fetch in flight or waiting
    pub fn tracked_hosts(&self) -> usize {
        self.hosts.len()
    }

    fn get_or_create(&self, host: &str) -> Arc<Semaphore> {
        self.hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.limit)))
            .clone()
    }
}
