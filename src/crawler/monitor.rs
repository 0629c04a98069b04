//! Monitor loop driving cycles on a fixed interval
//!
//! Each cycle is bounded by the interval. A cycle that errors, panics, or
//! times out is logged and the loop carries on; only the shutdown signal ends
//! it.

use crate::crawler::cycle::{CycleReport, CycleRunner};
use crate::ArchiverError;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// Drives [`CycleRunner`] forever
pub struct Monitor {
    runner: CycleRunner,
    interval: Duration,
}

impl Monitor {
    pub fn new(runner: CycleRunner, interval: Duration) -> Self {
        Self { runner, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one cycle bounded by the interval
    ///
    /// On timeout the cycle stops dispatching, but story tasks it already
    /// spawned finish in the background. A panic inside the cycle is turned
    /// into an error.
    pub async fn run_once(&self) -> crate::Result<CycleReport> {
        let cycle = AssertUnwindSafe(self.runner.run_cycle()).catch_unwind();

        match tokio::time::timeout(self.interval, cycle).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(ArchiverError::CyclePanic(panic_message(panic.as_ref()))),
            Err(_) => Err(ArchiverError::CycleTimeout(self.interval)),
        }
    }

    /// Loops until `shutdown` resolves
    ///
    /// Every iteration runs a cycle, logs its outcome, then sleeps for the
    /// interval no matter how the cycle ended.
    pub async fn run<S>(&self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tracing::info!(interval = ?self.interval, "Monitoring front page");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Crawler stopped");
                    return;
                }
                _ = self.tick() => {}
            }
        }
    }

    async fn tick(&self) {
        match self.run_once().await {
            Ok(report) => tracing::info!(
                listed = report.listed,
                skipped = report.skipped,
                dispatched = report.dispatched,
                failed_tasks = report.failed_tasks,
                "Cycle finished"
            ),
            Err(e) => tracing::error!("Crawler failed: {}", e),
        }

        tokio::time::sleep(self.interval).await;
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
