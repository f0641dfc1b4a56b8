//! Parsed HTML document and the small set of reads the extractors need.
//!
//! Parsing is lenient (html5ever): malformed markup becomes a best-effort tree, scripts
//! never run and nothing is fetched.

use reqwest::Url;
use scraper::html::Select;
use scraper::{ElementRef, Html, Selector};

/// A parsed page.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(raw: &str) -> Self {
        Self {
            html: Html::parse_document(raw),
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn select_all<'a, 'b>(&'a self, selector: &'b Selector) -> Select<'a, 'b> {
        self.html.select(selector)
    }
}

/// Trimmed text content; `None` when empty after trimming.
pub fn text_of(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First descendant of `scope` matching `selector`.
pub fn first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// Trimmed text of the first descendant matching `selector`.
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    first(scope, selector).and_then(text_of)
}

/// Attribute value as written; `None` when missing or empty.
pub fn attr_of(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Attribute of the first descendant matching `selector`.
pub fn first_attr(scope: ElementRef<'_>, selector: &Selector, name: &str) -> Option<String> {
    first(scope, selector).and_then(|e| attr_of(e, name))
}

/// Resolve `href` against `base`. An empty href resolves to `base` itself.
pub fn resolve_href(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(|u| u.to_string())
}
