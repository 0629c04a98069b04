//! HTML parser for front page listings and discussion links
//!
//! The crawl logic only depends on the [`PageParser`] capability; [`HnParser`]
//! implements it for Hacker News markup with `scraper`.

use crate::ArchiverError;
use scraper::{ElementRef, Html, Selector};

/// One front page listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    /// Identifier assigned by the source site
    pub id: String,
    pub title: String,
    /// Target page; may be relative to the source origin (e.g. "Ask HN" posts)
    pub url: String,
}

/// Extraction of stories and thread links from fetched HTML
pub trait PageParser: Send + Sync {
    /// Stories in front page order
    fn parse_front_page(&self, html: &str) -> Vec<Story>;

    /// Outbound links from a discussion page, in document order.
    /// Links are returned as written in the page, possibly relative.
    fn parse_thread_links(&self, html: &str) -> Vec<String>;
}

/// Story rows carry the item id on the row itself
const STORY_ROW: &str = "tr.athing";

/// Current markup uses `span.titleline`, older pages `a.storylink`
const STORY_LINK: &str = "span.titleline > a, a.storylink";

/// Links posted inside comment bodies. The reply/flag controls also carry
/// `rel="nofollow"` but live outside `.commtext`.
const COMMENT_LINK: &str = "div.comment .commtext a[rel~=\"nofollow\"][href]";

/// Parser for Hacker News pages
#[derive(Debug, Clone)]
pub struct HnParser {
    story_row: Selector,
    story_link: Selector,
    comment_link: Selector,
}

impl HnParser {
    pub fn new() -> crate::Result<Self> {
        Ok(Self {
            story_row: selector(STORY_ROW)?,
            story_link: selector(STORY_LINK)?,
            comment_link: selector(COMMENT_LINK)?,
        })
    }

    fn parse_row(&self, row: ElementRef<'_>) -> Option<Story> {
        let id = row.value().attr("id")?.trim();
        if id.is_empty() {
            return None;
        }

        let link = row.select(&self.story_link).next()?;
        let url = link.value().attr("href")?.trim();
        if url.is_empty() {
            return None;
        }

        let title = link.text().collect::<String>().trim().to_string();

        Some(Story {
            id: id.to_string(),
            title,
            url: url.to_string(),
        })
    }
}

impl PageParser for HnParser {
    fn parse_front_page(&self, html: &str) -> Vec<Story> {
        let document = Html::parse_document(html);

        let stories: Vec<Story> = document
            .select(&self.story_row)
            .filter_map(|row| {
                let story = self.parse_row(row);
                if story.is_none() {
                    tracing::trace!("Skipping story row without id or link");
                }
                story
            })
            .collect();
        stories
    }

    fn parse_thread_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let links: Vec<String> = document
            .select(&self.comment_link)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty() && !href.starts_with('#'))
            .map(str::to_string)
            .collect();
        links
    }
}

fn selector(css: &str) -> crate::Result<Selector> {
    Selector::parse(css).map_err(|e| ArchiverError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}
