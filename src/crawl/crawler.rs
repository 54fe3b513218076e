// src/crawl/crawler.rs
// =============================================================================
// The crawl entry point.
//
// Usage:
//   let (crawler, mut results) = Crawler::new(options)?;
//   tokio::spawn(async move { while let Some(r) = results.recv().await { ... } });
//   crawler.run(["example.com"]).await;
//
// Results arrive on an unbounded channel while the crawl is running, so the
// caller should drain it concurrently. The channel closes once run()
// returns.
// =============================================================================

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use url::Url;

use super::frontier::Frontier;
use super::result::CrawlResult;
use super::state::CrawlState;
use super::worker::{Delay, Worker};
use crate::error::CrawlError;
use crate::fetch::Fetcher;
use crate::options::Options;
use crate::resolve::{authority, canonicalize, has_scheme};
use crate::scope::Scope;

/// Counts reported when a run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Seeds that could be turned into URLs
    pub seeds: usize,
    /// URLs handed to workers
    pub dispatched: usize,
    /// Distinct canonical URLs fetched (including redirect hops)
    pub fetched: usize,
}

pub struct Crawler {
    options: Options,
    state: Arc<CrawlState>,
    fetcher: Fetcher,
    results: mpsc::UnboundedSender<CrawlResult>,
}

impl Crawler {
    /// Validates the options and prepares a crawl. Nothing is fetched yet.
    pub fn new(
        mut options: Options,
    ) -> Result<(Self, mpsc::UnboundedReceiver<CrawlResult>), CrawlError> {
        options.set_defaults_missing();
        options.validate()?;

        let scope = Scope::new();
        for pattern in &options.include {
            scope.add_include(pattern);
        }
        for pattern in &options.exclude {
            scope.add_exclude(pattern);
        }

        let fetcher = Fetcher::new(&options)?;
        let state = Arc::new(CrawlState::new(scope, options.similarity_threshold));
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        let crawler = Crawler {
            options,
            state,
            fetcher,
            results: results_tx,
        };
        Ok((crawler, results_rx))
    }

    /// Crawls from the given hosts or URLs until no work is left or the
    /// frontier goes idle.
    pub async fn run<I, S>(self, targets: I) -> Summary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets: Vec<String> = targets
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        // A single target is crawled by a single worker
        let workers = if targets.len() == 1 {
            1
        } else {
            self.options.concurrency
        };

        let seeds: Vec<Url> = stream::iter(targets.iter())
            .map(|target| self.seed(target))
            .buffered(self.options.concurrency)
            .filter_map(|seed| async move {
                match seed {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!("Skipping target: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        let (frontier, dispatcher, queue) = Frontier::new(
            self.state.clone(),
            self.options.queue_capacity,
            self.options.idle_timeout(),
        );

        for seed in &seeds {
            info!("Starting crawl at {}", seed);
            frontier.submit(seed.clone());
        }

        let dispatcher = tokio::spawn(dispatcher.run());

        let delay = Delay::from_millis(self.options.delay, self.options.delay_jitter);
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    queue: queue.clone(),
                    frontier: frontier.clone(),
                    state: self.state.clone(),
                    fetcher: self.fetcher.clone(),
                    results: self.results.clone(),
                    delay,
                    max_redirects: self.options.max_redirects,
                };
                tokio::spawn(worker.run())
            })
            .collect();

        // Workers must not keep the crawl alive through this handle
        drop(frontier);

        let dispatched = match dispatcher.await {
            Ok(count) => count,
            Err(e) => {
                error!("Dispatcher task failed: {}", e);
                0
            }
        };

        for handle in futures::future::join_all(handles).await {
            if let Err(e) = handle {
                error!("Worker task failed: {}", e);
            }
        }

        let summary = Summary {
            seeds: seeds.len(),
            dispatched,
            fetched: self.state.identity.len(),
        };
        info!(
            "Crawl finished: {} seeds, {} dispatched, {} fetched",
            summary.seeds, summary.dispatched, summary.fetched
        );
        summary
    }

    // Turns a target into a canonical seed URL and puts its host in scope
    async fn seed(&self, target: &str) -> Result<Url, CrawlError> {
        let raw = if has_scheme(target) {
            target.to_string()
        } else {
            let scheme = self.fetcher.probe_scheme(target).await?;
            format!("{}://{}", scheme, target)
        };

        let url = canonicalize(&raw).map_err(|source| CrawlError::InvalidTarget {
            target: target.to_string(),
            source,
        })?;

        let host = authority(&url);
        if host.is_empty() {
            return Err(CrawlError::MissingHost(target.to_string()));
        }
        self.state.scope.add_include(&host);

        Ok(url)
    }
}
