// src/lib.rs
// =============================================================================
// pathcrawl: a concurrent crawler that discovers every in-scope URL reachable
// from a set of seed hosts.
//
// Links are mined heuristically from any response body (quoted literals that
// look like paths) and from robots.txt directives. Re-fetching, alias URLs,
// crawl traps and near-duplicate pages are all suppressed.
// =============================================================================

pub mod crawl;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod options;
pub mod resolve;
pub mod scope;
pub mod trap;

pub use crawl::{CrawlResult, Crawler, Summary};
pub use error::CrawlError;
pub use options::Options;
pub use scope::Scope;
