//! Storage module for the on-disk archive
//!
//! The archive directory is both the persistence layer and the idempotency
//! ledger. A story counts as archived if and only if its directory holds an
//! `article.*` file; there is no separate manifest.
//!
//! # Layout
//!
//! ```text
//! <root>/main.<ext>                 latest front page snapshot
//! <root>/<story id>/article.<ext>   the story's target page
//! <root>/<story id>/detail.<ext>    the discussion thread
//! <root>/<story id>/comment_<n>.<ext>
//! ```

mod extension;
mod store;

pub use extension::{essence, extension_for, DEFAULT_EXTENSION};
pub use store::{comment_name, ArchiveStore, ARTICLE_NAME, DETAIL_NAME, MAIN_NAME};
