//! One polling cycle
//!
//! Fetch the front page, keep the stories that have no archived article yet,
//! and dispatch one archive task per story. Task creation is staggered by a
//! fixed delay because the site refuses bursts of requests ("Sorry, we're not
//! able to serve your requests this quickly"); dispatched tasks keep running
//! during the pause.

use crate::crawler::archiver::StoryArchiver;
use crate::crawler::fetcher::FetchMode;
use crate::crawler::parser::Story;
use crate::storage::MAIN_NAME;
use std::collections::HashSet;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Counters for one finished cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Stories parsed from the front page
    pub listed: usize,

    /// Stories skipped because they were already archived (or listed twice)
    pub skipped: usize,

    /// Archive tasks dispatched
    pub dispatched: usize,

    /// Tasks that panicked or were aborted
    pub failed_tasks: usize,
}

/// Runs polling cycles against a front page
#[derive(Clone)]
pub struct CycleRunner {
    archiver: StoryArchiver,
    front_page: String,
    dispatch_delay: Duration,
}

impl CycleRunner {
    /// # Arguments
    ///
    /// * `archiver` - Shared per-story archiver; also provides fetcher, parser, and store
    /// * `front_page` - Front page URL (absolute, or relative to the fetcher's origin)
    /// * `dispatch_delay` - Pause between two story task creations
    pub fn new(
        archiver: StoryArchiver,
        front_page: impl Into<String>,
        dispatch_delay: Duration,
    ) -> Self {
        Self {
            archiver,
            front_page: front_page.into(),
            dispatch_delay,
        }
    }

    /// Runs a single cycle and waits for every dispatched story task
    ///
    /// # Returns
    ///
    /// * `Ok(CycleReport)` - The cycle ran; individual stories may still have failed
    /// * `Err(ArchiverError)` - The front page could not be fetched; nothing was dispatched
    pub async fn run_cycle(&self) -> crate::Result<CycleReport> {
        let fetcher = self.archiver.fetcher();
        let store = self.archiver.store();

        let front = fetcher.fetch(&self.front_page, FetchMode::Text).await?;
        if let Err(e) = store.save_root(MAIN_NAME, &front) {
            tracing::error!(error = %e, "Can't save front page");
        }

        let stories = self.archiver.parser().parse_front_page(&front.payload.to_text());
        let listed = stories.len();

        let fresh = self.unarchived(stories);
        tracing::info!("Handle main page: {} new stories", fresh.len());

        let mut report = CycleReport {
            listed,
            skipped: listed - fresh.len(),
            ..CycleReport::default()
        };

        let mut tasks: Vec<(String, JoinHandle<()>)> = Vec::with_capacity(fresh.len());
        for (idx, story) in fresh.into_iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.dispatch_delay).await;
            }
            tasks.push((story.id.clone(), self.dispatch(story)));
        }
        report.dispatched = tasks.len();

        for (story_id, task) in tasks {
            if let Err(e) = task.await {
                report.failed_tasks += 1;
                tracing::error!(story_id = %story_id, error = %e, "Story task failed");
            }
        }

        Ok(report)
    }

    /// Stories without an archived article, front page order, first listing wins
    fn unarchived(&self, stories: Vec<Story>) -> Vec<Story> {
        let store = self.archiver.store();
        let mut seen = HashSet::new();

        stories
            .into_iter()
            .filter(|story| seen.insert(story.id.clone()))
            .filter(|story| {
                let archived = store.is_archived(&story.id);
                if archived {
                    tracing::trace!(story_id = %story.id, "Already archived");
                }
                !archived
            })
            .collect()
    }

    /// Spawns the archive task for one story
    ///
    /// The task owns its story and a clone of the archiver, so it keeps
    /// running if the cycle that spawned it is abandoned.
    fn dispatch(&self, story: Story) -> JoinHandle<()> {
        let archiver = self.archiver.clone();
        let span = tracing::info_span!("story", story_id = %story.id);
        tokio::spawn(async move { archiver.archive(&story).await }.instrument(span))
    }
}
