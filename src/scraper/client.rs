//! Blocking HTML fetcher with an optional relay prefix.
//!
//! Direct and relayed requests share one client; a relayed request percent-encodes the
//! target URL and appends it to the relay prefix.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::scraper::error::ScraperError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; mangascrape/0.1; +https://github.com/mangascrape)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 10;

/// Public relay that returns the raw body of `url`.
pub const DEFAULT_RELAY_PREFIX: &str = "https://api.allorigins.win/raw?url=";

/// Characters left alone by JavaScript's `encodeURIComponent`.
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// How a request reaches the target site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    /// Through the relay when one is configured, otherwise direct.
    Relayed,
}

/// Source of raw HTML. Implemented by [HtmlClient]; tests plug in recorded pages.
pub trait FetchHtml {
    fn fetch_html(&mut self, url: &str, route: Route) -> Result<String, ScraperError>;
}

/// `{prefix}{encodeURIComponent(target)}`.
pub fn relay_url(prefix: &str, target: &str) -> String {
    format!("{}{}", prefix, utf8_percent_encode(target, URI_COMPONENT))
}

/// Blocking HTTP client used by every flow.
#[derive(Debug)]
pub struct HtmlClient {
    inner: reqwest::blocking::Client,
    relay_prefix: Option<String>,
    accept_error_status: bool,
}

impl HtmlClient {
    /// Build a client with default User-Agent, timeout and relay.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> HtmlClientBuilder {
        HtmlClientBuilder::default()
    }

    pub fn relay_prefix(&self) -> Option<&str> {
        self.relay_prefix.as_deref()
    }

    /// URL actually requested for `url` on `route`.
    pub fn request_url(&self, url: &str, route: Route) -> String {
        match (route, self.relay_prefix.as_deref()) {
            (Route::Relayed, Some(prefix)) => relay_url(prefix, url),
            _ => url.to_string(),
        }
    }

    /// GET `url` and return the body as text.
    ///
    /// A non-2xx status is an error unless the client was built with `accept_error_status`,
    /// in which case the error page body is returned like any other.
    pub fn get_text(&self, url: &str, route: Route) -> Result<String, ScraperError> {
        let target = self.request_url(url, route);
        tracing::debug!(url = %target, ?route, "fetching");
        let response = self
            .inner
            .get(&target)
            .send()
            .map_err(|e| ScraperError::Network {
                url: target.clone(),
                source: e,
            })?;
        let status = response.status();
        if !status.is_success() {
            if !self.accept_error_status {
                return Err(ScraperError::HttpStatus {
                    status: status.as_u16(),
                    url: target,
                });
            }
            tracing::warn!(status = status.as_u16(), url = %target, "parsing error response body");
        }
        response.text().map_err(|e| ScraperError::BodyRead {
            url: target,
            source: e,
        })
    }
}

impl FetchHtml for HtmlClient {
    fn fetch_html(&mut self, url: &str, route: Route) -> Result<String, ScraperError> {
        self.get_text(url, route)
    }
}

/// Builder for [HtmlClient] with optional User-Agent, timeout and relay settings.
#[derive(Debug)]
pub struct HtmlClientBuilder {
    user_agent: Option<String>,
    timeout_secs: u64,
    relay_prefix: Option<String>,
    accept_error_status: bool,
}

impl Default for HtmlClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            relay_prefix: Some(DEFAULT_RELAY_PREFIX.to_string()),
            accept_error_status: false,
        }
    }
}

impl HtmlClientBuilder {
    /// Set a custom User-Agent. If not set, a browser-like default is used.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set request timeout in seconds. Default 30.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Relay prefix for [Route::Relayed]; `None` sends relayed requests direct.
    pub fn relay_prefix(mut self, prefix: Option<String>) -> Self {
        self.relay_prefix = prefix.filter(|p| !p.trim().is_empty());
        self
    }

    /// Parse bodies of non-2xx responses instead of failing.
    pub fn accept_error_status(mut self, accept: bool) -> Self {
        self.accept_error_status = accept;
        self
    }

    pub fn build(self) -> Result<HtmlClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(HtmlClient {
            inner,
            relay_prefix: self.relay_prefix,
            accept_error_status: self.accept_error_status,
        })
    }
}
