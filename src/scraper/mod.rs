//! Fetching and extraction for the manga site.
//!
//! Pages are fetched as text, parsed into a [Document] and handed to one of three
//! extractors driven by a [SelectorSet].

mod client;
mod error;

pub mod chapters;
pub mod document;
pub mod images;
pub mod search;
pub mod selectors;
pub mod sequence;

pub use chapters::{extract_chapters, title_id, title_page_url};
pub use client::{
    relay_url, FetchHtml, HtmlClient, HtmlClientBuilder, Route, DEFAULT_RELAY_PREFIX,
};
pub use document::Document;
pub use error::ScraperError;
pub use images::extract_images;
pub use search::{extract_titles, search_url};
pub use selectors::{CompiledSelectors, SelectorSet};
pub use sequence::{parse_order_key, sort_newest_first};

/// Canonical site origin. Title pages are always fetched from here.
pub const DEFAULT_ORIGIN: &str = "https://www.mgeko.cc";

/// Route each page kind takes by default: search pages direct, title and chapter pages relayed.
pub const SEARCH_ROUTE: Route = Route::Direct;
pub const TITLE_ROUTE: Route = Route::Relayed;
pub const CHAPTER_ROUTE: Route = Route::Relayed;
