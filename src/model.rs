//! Records produced by the extraction pipeline.
//!
//! Every field is a plain string. JSON output keeps the site's camelCase field names.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Unknown Title";
pub const DEFAULT_AUTHOR: &str = "Unknown Author";
pub const DEFAULT_SUMMARY: &str = "No summary available";
pub const DEFAULT_LINK: &str = "#";
pub const DEFAULT_CHAPTER_TITLE: &str = "Chapter";
pub const DEFAULT_ORDER_NUMBER: &str = "0";

/// One search-result row.
///
/// `link` is taken from the listing as-is and may be relative or point at a foreign host;
/// [title_page_url](crate::scraper::title_page_url) normalizes it before the title page is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    pub title: String,
    pub link: String,
    pub author: String,
    pub summary: String,
}

impl TitleRecord {
    /// A record carrying only a link, with every other field at its default.
    pub fn from_link(link: impl Into<String>) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            link: link.into(),
            author: DEFAULT_AUTHOR.to_string(),
            summary: DEFAULT_SUMMARY.to_string(),
        }
    }
}

/// One entry of a title's chapter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    pub chapter_number: String,
    /// Absolute URL of the chapter reader page.
    pub chapter_link: String,
    pub chapter_title: String,
    pub chapter_read_time: String,
    /// Integer-like sort key. Never displayed.
    pub order_number: String,
}

impl ChapterRecord {
    /// A record carrying only a reader URL, for fetching images of a known chapter.
    pub fn from_link(link: impl Into<String>) -> Self {
        Self {
            chapter_number: String::new(),
            chapter_link: link.into(),
            chapter_title: DEFAULT_CHAPTER_TITLE.to_string(),
            chapter_read_time: String::new(),
            order_number: DEFAULT_ORDER_NUMBER.to_string(),
        }
    }
}

/// One page image of a chapter. `src` is exactly what the markup carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub src: String,
}
