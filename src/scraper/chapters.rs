//! Title page: URL normalization and chapter extraction.

use reqwest::Url;

use crate::model::{ChapterRecord, DEFAULT_CHAPTER_TITLE, DEFAULT_ORDER_NUMBER};
use crate::scraper::document::{attr_of, first, first_text, resolve_href, Document};
use crate::scraper::error::ScraperError;
use crate::scraper::selectors::CompiledChapters;

/// Path part of a title link: any leading `http(s)://host` is dropped and a leading `/` ensured.
pub fn title_path(link: &str) -> String {
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .map(|after_scheme| {
            after_scheme
                .find('/')
                .map(|slash| &after_scheme[slash..])
                .unwrap_or("")
        })
        .unwrap_or(link);
    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}

/// Title page on the canonical origin, whatever host the link carried.
pub fn title_page_url(origin: &str, link: &str) -> String {
    format!("{}{}", origin.trim_end_matches('/'), title_path(link))
}

/// Second path segment of a title link (`/manga/<id>/...`).
pub fn title_id(link: &str) -> Result<String, ScraperError> {
    title_path(link)
        .split('/')
        .filter(|s| !s.is_empty())
        .nth(1)
        .map(String::from)
        .ok_or_else(|| ScraperError::MissingTitleId {
            link: link.to_string(),
        })
}

/// One [ChapterRecord] per chapter-list item, in document order.
///
/// Links resolve against `base` (the title page). The order number falls back to the chapter
/// number, then to `"0"`.
pub fn extract_chapters(
    doc: &Document,
    rules: &CompiledChapters,
    base: &Url,
) -> Vec<ChapterRecord> {
    doc.select_all(&rules.item)
        .map(|item| {
            let chapter_number = attr_of(item, &rules.number_attr).unwrap_or_default();
            let order_number = attr_of(item, &rules.order_attr)
                .or_else(|| Some(chapter_number.clone()).filter(|n| !n.is_empty()))
                .unwrap_or_else(|| DEFAULT_ORDER_NUMBER.to_string());
            let href = first(item, &rules.link)
                .and_then(|a| attr_of(a, &rules.link_attr))
                .unwrap_or_default();
            let chapter_link = resolve_href(base, &href).unwrap_or_else(|| base.to_string());
            ChapterRecord {
                chapter_number,
                chapter_link,
                chapter_title: first_text(item, &rules.title)
                    .unwrap_or_else(|| DEFAULT_CHAPTER_TITLE.to_string()),
                chapter_read_time: first_text(item, &rules.read_time).unwrap_or_default(),
                order_number,
            }
        })
        .collect()
}
