//! Statistics over the archive directory
//!
//! The archive tree is the only state the crawler keeps, so statistics are
//! computed by walking it.

use crate::storage::{ArchiveStore, ARTICLE_NAME, DETAIL_NAME, MAIN_NAME};
use crate::StoreError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Archive statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveStatistics {
    /// Story directories found under the root
    pub stories: u64,

    /// Stories with an `article.*` file (these are never re-crawled)
    pub archived: u64,

    /// Story directories without an article; retried on the next cycle
    pub partial: u64,

    /// Stories with a saved discussion thread
    pub with_detail: u64,

    /// Total `comment_<n>.*` files across all stories
    pub comment_files: u64,

    /// Whether a front page snapshot exists
    pub has_front_page: bool,

    /// Most recent modification time of any archived file
    pub last_modified: Option<DateTime<Utc>>,
}

/// Walks the archive root and counts its contents
///
/// A missing root yields empty statistics.
///
/// # Arguments
///
/// * `store` - The archive to inspect
///
/// # Returns
///
/// * `Ok(ArchiveStatistics)` - Successfully computed statistics
/// * `Err(StoreError)` - The root exists but could not be read
pub fn load_statistics(store: &ArchiveStore) -> Result<ArchiveStatistics, StoreError> {
    let root = store.root();
    let mut stats = ArchiveStatistics::default();

    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(stats),
        Err(source) => {
            return Err(StoreError::Io {
                path: root.to_path_buf(),
                source,
            })
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if path.is_dir() {
            stats.stories += 1;
            if store.is_archived(&name) {
                stats.archived += 1;
            } else {
                stats.partial += 1;
            }
            scan_story(&path, &mut stats);
        } else if has_base_name(&name, MAIN_NAME) {
            stats.has_front_page = true;
            track_modified(&path, &mut stats);
        }
    }

    Ok(stats)
}

fn scan_story(dir: &Path, stats: &mut ArchiveStatistics) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if has_base_name(&name, DETAIL_NAME) {
            stats.with_detail += 1;
        } else if name.starts_with("comment_") {
            stats.comment_files += 1;
        } else if !has_base_name(&name, ARTICLE_NAME) {
            continue;
        }
        track_modified(&entry.path(), stats);
    }
}

fn has_base_name(file_name: &str, base: &str) -> bool {
    file_name
        .strip_prefix(base)
        .is_some_and(|rest| rest.starts_with('.'))
}

fn track_modified(path: &Path, stats: &mut ArchiveStatistics) {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from);

    if let Ok(modified) = modified {
        if stats.last_modified.map_or(true, |last| modified > last) {
            stats.last_modified = Some(modified);
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("=== Archive Statistics ===\n");

    println!("Stories:");
    println!("  Directories: {}", stats.stories);
    println!("  Archived: {}", stats.archived);
    println!("  Missing article (retried next cycle): {}", stats.partial);
    println!("  With discussion thread: {}", stats.with_detail);
    println!();

    println!("Comment links saved: {}", stats.comment_files);
    if stats.archived > 0 {
        println!(
            "  Average per archived story: {:.1}",
            stats.comment_files as f64 / stats.archived as f64
        );
    }
    println!();

    println!(
        "Front page snapshot: {}",
        if stats.has_front_page { "yes" } else { "no" }
    );
    match stats.last_modified {
        Some(when) => println!("Last write: {}", when.to_rfc3339()),
        None => println!("Last write: never"),
    }
}
