// src/crawl/mod.rs
// =============================================================================
// This module runs the crawl itself.
//
// Pieces:
// - frontier: the queue of pending URLs, dispatch-time filtering, and
//   deciding when the crawl is over
// - worker: fetch → (redirect → fetch)* → extract → re-inject
// - state: the visited sets and fingerprint index shared by everything
// - crawler: wires the above together behind Crawler::run
//
// Discovery fan-out is not limited by the number of workers: every link
// found is submitted from its own task, and the bounded intake channel is
// what holds them back.
// =============================================================================

mod crawler;
mod frontier;
mod result;
mod state;
mod worker;

pub use crawler::{Crawler, Summary};
pub use frontier::{Dispatcher, Frontier, WorkQueue};
pub use result::CrawlResult;
pub use state::CrawlState;
