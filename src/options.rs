// src/options.rs
// =============================================================================
// Configuration consumed by the crawl engine.
//
// Options can be built in code (every field is public), deserialized from
// JSON, or produced by the CLI. Zero/empty values mean "use the default";
// set_defaults_missing() fills them in and validate() rejects values the
// engine cannot work with.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::CrawlError;

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 7;
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
pub const DEFAULT_SIMILARITY_THRESHOLD: u8 = 97;
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
pub const DEFAULT_USER_AGENT: &str = concat!("pathcrawl/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Host patterns to crawl (seed hosts are added automatically)
    pub include: Vec<String>,
    /// Host patterns never to crawl, even when included
    pub exclude: Vec<String>,
    /// Number of concurrent workers
    pub concurrency: usize,
    /// Whole-request timeout in seconds
    pub timeout: u64,
    /// Time allowed for response headers to arrive, in seconds
    pub response_header_timeout: u64,
    /// Delay before each request, in milliseconds
    pub delay: u64,
    /// Random extra delay added to `delay`, in milliseconds (0..jitter)
    pub delay_jitter: u64,
    pub user_agent: String,
    /// Proxy URL; `http://` is assumed when no scheme is given
    pub proxy: Option<String>,
    /// DNS servers as `ip` or `ip:port`
    pub resolvers: Vec<String>,
    /// 0 = errors only, 1 = info, 2 = debug
    pub verbose: u8,
    pub silence: bool,
    /// Seconds without a dispatch before the run ends
    pub idle_timeout: u64,
    pub max_redirects: usize,
    /// Similarity score (0-100) at or above which two bodies are duplicates
    pub similarity_threshold: u8,
    pub accept_invalid_certs: bool,
    /// Bound on URLs waiting in the frontier intake
    pub queue_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT_SECS,
            response_header_timeout: DEFAULT_TIMEOUT_SECS,
            delay: 0,
            delay_jitter: 0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            resolvers: Vec::new(),
            verbose: 0,
            silence: false,
            idle_timeout: DEFAULT_IDLE_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            accept_invalid_certs: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Options {
    /// Replaces zero or empty values with their defaults.
    pub fn set_defaults_missing(&mut self) {
        if self.concurrency == 0 {
            self.concurrency = DEFAULT_CONCURRENCY;
        }
        if self.timeout == 0 {
            self.timeout = DEFAULT_TIMEOUT_SECS;
        }
        if self.response_header_timeout == 0 {
            self.response_header_timeout = self.timeout;
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = DEFAULT_USER_AGENT.to_string();
        }
        if self.idle_timeout == 0 {
            self.idle_timeout = DEFAULT_IDLE_TIMEOUT_SECS;
        }
        if self.max_redirects == 0 {
            self.max_redirects = DEFAULT_MAX_REDIRECTS;
        }
        if self.similarity_threshold == 0 {
            self.similarity_threshold = DEFAULT_SIMILARITY_THRESHOLD;
        }
        if self.queue_capacity == 0 {
            self.queue_capacity = DEFAULT_QUEUE_CAPACITY;
        }
        if let Some(proxy) = &self.proxy {
            let proxy = proxy.trim();
            self.proxy = if proxy.is_empty() {
                None
            } else if proxy.contains("://") {
                Some(proxy.to_string())
            } else {
                Some(format!("http://{}", proxy))
            };
        }
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.similarity_threshold > 100 {
            return Err(CrawlError::InvalidOptions(format!(
                "similarity threshold must be within 0-100, got {}",
                self.similarity_threshold
            )));
        }

        if let Some(proxy) = &self.proxy {
            url::Url::parse(proxy).map_err(|e| {
                CrawlError::InvalidOptions(format!("invalid proxy '{}': {}", proxy, e))
            })?;
        }

        for resolver in &self.resolvers {
            if parse_resolver(resolver).is_none() {
                return Err(CrawlError::InvalidOptions(format!(
                    "invalid resolver '{}': expected ip or ip:port",
                    resolver
                )));
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn response_header_timeout(&self) -> Duration {
        Duration::from_secs(self.response_header_timeout)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }
}

/// Parses a resolver given as `ip` (port 53 assumed) or `ip:port`.
pub(crate) fn parse_resolver(raw: &str) -> Option<SocketAddr> {
    let raw = raw.trim();
    if let Ok(addr) = raw.parse::<SocketAddr>() {
        return Some(addr);
    }
    raw.parse::<IpAddr>().ok().map(|ip| SocketAddr::new(ip, 53))
}
