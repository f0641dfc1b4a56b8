//! Navigation state: search results, the selected title's chapters and the selected chapter's images.
//!
//! Each flow is an explicit state machine, `Idle -> Loading -> Populated | Empty | Failed`.
//! Starting a request discards the flow's previous records and issues a [Ticket]; a
//! completion is applied only if its ticket is still the latest one for that flow.

use reqwest::Url;

use crate::model::{ChapterRecord, ImageRecord, TitleRecord};
use crate::scraper::{
    extract_chapters, extract_images, extract_titles, search_url, sort_newest_first, title_id,
    title_page_url, CompiledSelectors, Document, FetchHtml, Route, ScraperError, CHAPTER_ROUTE,
    SEARCH_ROUTE, TITLE_ROUTE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState<T> {
    /// Nothing requested yet.
    Idle,
    Loading,
    Populated(Vec<T>),
    /// The page loaded but the container selector matched nothing.
    Empty,
    /// Fetch or parse failed. Shown to the user like `Empty`.
    Failed(String),
}

impl<T> FlowState<T> {
    pub fn records(&self) -> &[T] {
        match self {
            FlowState::Populated(records) => records,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FlowState::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FlowState::Failed(_))
    }
}

/// Sequence number of one request within one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// One flow's state plus the number of its latest request.
#[derive(Debug)]
pub struct Flow<T> {
    name: &'static str,
    state: FlowState<T>,
    latest: u64,
}

impl<T> Flow<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: FlowState::Idle,
            latest: 0,
        }
    }

    pub fn state(&self) -> &FlowState<T> {
        &self.state
    }

    /// Enter `Loading`, dropping any held records.
    pub fn begin(&mut self) -> Ticket {
        self.latest += 1;
        self.state = FlowState::Loading;
        Ticket(self.latest)
    }

    /// Apply an outcome. Returns false, leaving state untouched, when `ticket` is stale.
    pub fn complete(&mut self, ticket: Ticket, outcome: Result<Vec<T>, ScraperError>) -> bool {
        if ticket.0 != self.latest {
            tracing::debug!(
                flow = self.name,
                ticket = ticket.0,
                latest = self.latest,
                "dropping stale result"
            );
            return false;
        }
        self.state = match outcome {
            Ok(records) if records.is_empty() => {
                tracing::info!(flow = self.name, "no {} found", self.name);
                FlowState::Empty
            }
            Ok(records) => {
                tracing::debug!(flow = self.name, count = records.len(), "found {}", self.name);
                FlowState::Populated(records)
            }
            Err(e) => {
                tracing::warn!(flow = self.name, error = %e, "fetching {} failed", self.name);
                FlowState::Failed(e.to_string())
            }
        };
        true
    }

    /// Back to `Idle`. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.latest += 1;
        self.state = FlowState::Idle;
    }
}

/// A request that has been started but not completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub ticket: Ticket,
    /// Page URL on the target site (before any relay wrapping).
    pub url: String,
    pub route: Route,
}

/// Page-level controller. One mutation entry point per user action.
pub struct Session<F> {
    fetcher: F,
    origin: String,
    selectors: CompiledSelectors,
    query: Option<String>,
    selected_title: Option<TitleRecord>,
    selected_chapter: Option<ChapterRecord>,
    titles: Flow<TitleRecord>,
    chapters: Flow<ChapterRecord>,
    images: Flow<ImageRecord>,
}

impl<F: FetchHtml> Session<F> {
    pub fn new(fetcher: F, origin: impl Into<String>, selectors: CompiledSelectors) -> Self {
        Self {
            fetcher,
            origin: origin.into().trim_end_matches('/').to_string(),
            selectors,
            query: None,
            selected_title: None,
            selected_chapter: None,
            titles: Flow::new("titles"),
            chapters: Flow::new("chapters"),
            images: Flow::new("images"),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The selected title, with its link rewritten to the full title page URL.
    pub fn selected_title(&self) -> Option<&TitleRecord> {
        self.selected_title.as_ref()
    }

    pub fn selected_chapter(&self) -> Option<&ChapterRecord> {
        self.selected_chapter.as_ref()
    }

    pub fn titles(&self) -> &FlowState<TitleRecord> {
        self.titles.state()
    }

    pub fn chapters(&self) -> &FlowState<ChapterRecord> {
        self.chapters.state()
    }

    pub fn images(&self) -> &FlowState<ImageRecord> {
        self.images.state()
    }

    /// Search and extract titles. Clears every flow and selection first.
    pub fn search(&mut self, query: &str) -> &FlowState<TitleRecord> {
        let pending = self.begin_search(query);
        let body = self.fetcher.fetch_html(&pending.url, pending.route);
        self.finish_search(pending, body);
        self.titles.state()
    }

    pub fn begin_search(&mut self, query: &str) -> Pending {
        self.query = Some(query.to_string());
        self.selected_title = None;
        self.selected_chapter = None;
        self.chapters.reset();
        self.images.reset();
        let ticket = self.titles.begin();
        Pending {
            ticket,
            url: search_url(&self.origin, query),
            route: SEARCH_ROUTE,
        }
    }

    pub fn finish_search(&mut self, pending: Pending, body: Result<String, ScraperError>) -> bool {
        let outcome =
            body.map(|html| extract_titles(&Document::parse(&html), &self.selectors.search));
        self.titles.complete(pending.ticket, outcome)
    }

    /// Select a title and load its chapters, newest first.
    ///
    /// A link without a title id is rejected before anything is fetched or cleared.
    pub fn select_title(
        &mut self,
        title: &TitleRecord,
    ) -> Result<&FlowState<ChapterRecord>, ScraperError> {
        let pending = self.begin_title(title)?;
        let body = self.fetcher.fetch_html(&pending.url, pending.route);
        self.finish_title(pending, body);
        Ok(self.chapters.state())
    }

    pub fn begin_title(&mut self, title: &TitleRecord) -> Result<Pending, ScraperError> {
        let id = title_id(&title.link)?;
        let page_url = title_page_url(&self.origin, &title.link);
        Url::parse(&page_url).map_err(|e| ScraperError::InvalidUrl {
            input: page_url.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(id = %id, url = %page_url, "selected title");
        self.selected_title = Some(TitleRecord {
            link: page_url.clone(),
            ..title.clone()
        });
        self.selected_chapter = None;
        self.images.reset();
        let ticket = self.chapters.begin();
        Ok(Pending {
            ticket,
            url: page_url,
            route: TITLE_ROUTE,
        })
    }

    pub fn finish_title(&mut self, pending: Pending, body: Result<String, ScraperError>) -> bool {
        let rules = &self.selectors.chapters;
        let outcome = body.and_then(|html| {
            let base = Url::parse(&pending.url).map_err(|e| ScraperError::InvalidUrl {
                input: pending.url.clone(),
                reason: e.to_string(),
            })?;
            let mut list = extract_chapters(&Document::parse(&html), rules, &base);
            sort_newest_first(&mut list);
            Ok(list)
        });
        self.chapters.complete(pending.ticket, outcome)
    }

    /// Select a chapter and load its page images.
    pub fn select_chapter(&mut self, chapter: &ChapterRecord) -> &FlowState<ImageRecord> {
        let pending = self.begin_chapter(chapter);
        let body = self.fetcher.fetch_html(&pending.url, pending.route);
        self.finish_chapter(pending, body);
        self.images.state()
    }

    pub fn begin_chapter(&mut self, chapter: &ChapterRecord) -> Pending {
        self.selected_chapter = Some(chapter.clone());
        let ticket = self.images.begin();
        Pending {
            ticket,
            url: chapter.chapter_link.clone(),
            route: CHAPTER_ROUTE,
        }
    }

    pub fn finish_chapter(&mut self, pending: Pending, body: Result<String, ScraperError>) -> bool {
        let outcome =
            body.map(|html| extract_images(&Document::parse(&html), &self.selectors.images));
        self.images.complete(pending.ticket, outcome)
    }
}
