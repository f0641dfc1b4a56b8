//! mangascrape: search a manga site and list chapters and page images by scraping its HTML.

pub mod cli;
pub mod config;
pub mod logging;
pub mod model;
pub mod scraper;
pub mod session;

// Re-exports for CLI and consumers.
pub use model::{ChapterRecord, ImageRecord, TitleRecord};
pub use scraper::{
    FetchHtml, HtmlClient, HtmlClientBuilder, Route, ScraperError, SelectorSet, DEFAULT_ORIGIN,
};
pub use session::{Flow, FlowState, Pending, Session, Ticket};
