//! Per-story archiving
//!
//! A story is archived in two independent branches that run concurrently:
//! the article itself, and the discussion thread followed by a fan-out over
//! every link posted in it. Failures are logged and contained inside the
//! branch (or the single link) where they happen.

use crate::crawler::fetcher::{FetchMode, FetchResult, Fetcher};
use crate::crawler::parser::{PageParser, Story};
use crate::storage::{comment_name, ArchiveStore, ARTICLE_NAME, DETAIL_NAME};
use crate::url::item_url;
use crate::FetchError;
use futures::future::join_all;
use std::sync::Arc;

/// Downloads and stores everything belonging to one story
///
/// Cloning shares the fetcher, parser, and store.
#[derive(Clone)]
pub struct StoryArchiver {
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn PageParser>,
    store: ArchiveStore,
}

impl StoryArchiver {
    pub fn new(fetcher: Arc<dyn Fetcher>, parser: Arc<dyn PageParser>, store: ArchiveStore) -> Self {
        Self {
            fetcher,
            parser,
            store,
        }
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn parser(&self) -> &Arc<dyn PageParser> {
        &self.parser
    }

    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// Archives a story on a best-effort basis
    ///
    /// Returns once the article fetch and the whole comment fan-out have
    /// settled, successfully or not. Nothing is reported back to the caller;
    /// the archive directory is the only outcome.
    pub async fn archive(&self, story: &Story) {
        tracing::debug!(story_id = %story.id, title = %story.title, "Handle story");

        if let Err(e) = self.store.ensure_story_dir(&story.id) {
            tracing::error!(story_id = %story.id, error = %e, "Can't create story directory");
            return;
        }

        let ((), comments) = tokio::join!(self.archive_article(story), self.archive_thread(story));

        tracing::info!(
            story_id = %story.id,
            comments_found = comments.found,
            comments_fetched = comments.fetched,
            "Story done: {}",
            story.title
        );
    }

    async fn archive_article(&self, story: &Story) {
        if let Err(e) = self
            .download(&story.id, &story.url, FetchMode::Binary, ARTICLE_NAME)
            .await
        {
            tracing::error!(story_id = %story.id, error = %e, "Downloading error");
        }
    }

    async fn archive_thread(&self, story: &Story) -> CommentTally {
        let thread = item_url(&story.id);
        let detail = match self
            .download(&story.id, &thread, FetchMode::Text, DETAIL_NAME)
            .await
        {
            Ok(detail) => detail,
            Err(e) => {
                tracing::error!(story_id = %story.id, error = %e, "Downloading error");
                return CommentTally::default();
            }
        };

        let links = self.parser.parse_thread_links(&detail.payload.to_text());
        tracing::debug!(story_id = %story.id, links = links.len(), "Handle comments");

        // Names are bound to parse positions before anything is dispatched
        let downloads = links.iter().enumerate().map(|(idx, link)| {
            let name = comment_name(idx + 1);
            async move {
                match self.download(&story.id, link, FetchMode::Binary, &name).await {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!(story_id = %story.id, file = %name, error = %e, "Downloading error");
                        false
                    }
                }
            }
        });

        let fetched = join_all(downloads)
            .await
            .into_iter()
            .filter(|ok| *ok)
            .count();

        CommentTally {
            found: links.len(),
            fetched,
        }
    }

    /// Fetches `url` and stores it as `name` in the story directory
    ///
    /// A failed write is logged but the fetched result is still returned, so
    /// that a thread page can be parsed even when it could not be saved.
    async fn download(
        &self,
        story_id: &str,
        url: &str,
        mode: FetchMode,
        name: &str,
    ) -> Result<FetchResult, FetchError> {
        let result = self.fetcher.fetch(url, mode).await?;

        if let Err(e) = self.store.save(story_id, name, &result) {
            tracing::error!(story_id, error = %e, "Can't save file");
        }

        Ok(result)
    }
}

#[derive(Debug, Default)]
struct CommentTally {
    found: usize,
    fetched: usize,
}
