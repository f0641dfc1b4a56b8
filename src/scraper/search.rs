//! Search results page: URL construction and title extraction.

use percent_encoding::utf8_percent_encode;

use crate::model::{TitleRecord, DEFAULT_AUTHOR, DEFAULT_LINK, DEFAULT_SUMMARY, DEFAULT_TITLE};
use crate::scraper::client::URI_COMPONENT;
use crate::scraper::document::{first_attr, first_text, Document};
use crate::scraper::selectors::CompiledSearch;

/// `{origin}/search/?search={query}` with the query percent-encoded.
pub fn search_url(origin: &str, query: &str) -> String {
    format!(
        "{}/search/?search={}",
        origin.trim_end_matches('/'),
        utf8_percent_encode(query, URI_COMPONENT)
    )
}

/// One [TitleRecord] per listing item, in document order. No items is an empty vector.
pub fn extract_titles(doc: &Document, rules: &CompiledSearch) -> Vec<TitleRecord> {
    doc.select_all(&rules.item)
        .map(|item| TitleRecord {
            title: first_text(item, &rules.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            link: first_attr(item, &rules.link, &rules.link_attr)
                .unwrap_or_else(|| DEFAULT_LINK.to_string()),
            author: first_text(item, &rules.author).unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            summary: first_attr(item, &rules.summary, &rules.summary_attr)
                .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
        })
        .collect()
}
