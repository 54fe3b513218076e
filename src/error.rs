// src/error.rs
// =============================================================================
// Error types for the crawl engine.
//
// Only transport failures ever reach the caller (inside a CrawlResult). Every
// other kind is logged and the offending target, redirect or token is skipped.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// Connection, DNS, TLS or timeout failure while fetching a URL
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response headers did not arrive within the response-header timeout
    #[error("no response headers from {url} within {seconds}s")]
    HeaderTimeout { url: String, seconds: u64 },

    /// Neither https nor http answered for a seed given without a scheme
    #[error("could not determine a scheme for {0}")]
    SchemeUnresolved(String),

    /// A seed target that is not a valid URL
    #[error("invalid target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// A seed target that parsed but has no host to crawl
    #[error("target '{0}' has no host")]
    MissingHost(String),

    /// A 3xx response whose Location header is missing or unusable
    #[error("redirect from {url} has no usable Location header")]
    InvalidRedirect { url: String },

    /// Options rejected by validation
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The HTTP client could not be built (bad proxy, TLS backend failure)
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl CrawlError {
    pub(crate) fn transport(url: &url::Url, source: reqwest::Error) -> Self {
        CrawlError::Transport {
            url: url.to_string(),
            source,
        }
    }
}
