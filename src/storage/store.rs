use crate::crawler::FetchResult;
use crate::storage::extension::extension_for;
use crate::{StoreError, StoreResult};
use std::path::{Path, PathBuf};

/// Base name of the front page snapshot
pub const MAIN_NAME: &str = "main";

/// Base name of a story's target page
pub const ARTICLE_NAME: &str = "article";

/// Base name of a story's discussion thread
pub const DETAIL_NAME: &str = "detail";

/// Base name for the `index`-th (1-based) link found in a thread
pub fn comment_name(index: usize) -> String {
    format!("comment_{}", index)
}

/// Filesystem-backed archive
///
/// Cloning is cheap; every clone points at the same root.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    /// Creates a store rooted at `root`. Nothing is touched on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the root directory (and its parents) if needed
    pub fn init(&self) -> StoreResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the files of one story
    ///
    /// Story ids come from scraped HTML, so anything that could escape the
    /// root (separators, `.`/`..`, empty ids) is rejected.
    pub fn story_dir(&self, story_id: &str) -> StoreResult<PathBuf> {
        validate_name(story_id)?;
        Ok(self.root.join(story_id))
    }

    /// Creates the story directory if it does not exist yet
    pub fn ensure_story_dir(&self, story_id: &str) -> StoreResult<PathBuf> {
        let dir = self.story_dir(story_id)?;
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Returns true iff the story directory exists and contains `article.*`
    ///
    /// A missing or unreadable directory is simply not archived.
    pub fn is_archived(&self, story_id: &str) -> bool {
        let Ok(dir) = self.story_dir(story_id) else {
            return false;
        };

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => return false,
        };

        let prefix = format!("{}.", ARTICLE_NAME);
        entries.filter_map(|entry| entry.ok()).any(|entry| {
            entry.file_name().to_string_lossy().starts_with(&prefix)
                && entry.file_type().map(|t| t.is_file()).unwrap_or(false)
        })
    }

    /// Writes a fetched payload as `<story dir>/<base_name>.<ext>`
    ///
    /// The story directory is created when missing. Returns the final path.
    pub fn save(
        &self,
        story_id: &str,
        base_name: &str,
        result: &FetchResult,
    ) -> StoreResult<PathBuf> {
        let dir = self.ensure_story_dir(story_id)?;
        write_payload(&dir, base_name, result)
    }

    /// Writes a payload directly under the root, e.g. the front page snapshot.
    /// An existing file with the same name is overwritten.
    pub fn save_root(&self, base_name: &str, result: &FetchResult) -> StoreResult<PathBuf> {
        self.init()?;
        write_payload(&self.root, base_name, result)
    }
}

fn write_payload(dir: &Path, base_name: &str, result: &FetchResult) -> StoreResult<PathBuf> {
    validate_name(base_name)?;

    let path = dir.join(format!("{}.{}", base_name, extension_for(&result.kind)));
    std::fs::write(&path, result.payload.as_bytes()).map_err(|source| StoreError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::debug!(path = %path.display(), bytes = result.payload.len(), "Saved file");
    Ok(path)
}

fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
