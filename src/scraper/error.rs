//! Shared error type for fetching and extraction.

use thiserror::Error;

/// Failures a flow can end in. An empty selector match is not one of them.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Could not find a title id in link '{link}' (expected /<section>/<id>/...).")]
    MissingTitleId { link: String },

    // HTTP and network
    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead { url: String, source: reqwest::Error },

    // Parsing
    #[error("Could not parse selector rule {rule:?}: {message}")]
    Parse { rule: String, message: String },
}
