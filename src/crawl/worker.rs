// src/crawl/worker.rs
// =============================================================================
// The worker pipeline.
//
// Each worker takes one URL at a time from the dispatch queue and runs it
// through a small state machine:
//
//   Fetch ──3xx──► Fetch ──3xx──► ... (at most max_redirects fetches)
//     │
//     └─other──► Extract ──► submit children ──► done
//
// Before the first fetch the URL must have a host, must not look like a
// crawl trap and must not be redundant with something already visited. A
// root URL ("/") also schedules the host's robots.txt.
//
// After every fetch the URL is checked again: another worker may have
// fetched an alias meanwhile, or the body may be a near-duplicate of a page
// already seen on this host. Either way the chain stops quietly.
// =============================================================================

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use super::frontier::{Frontier, WorkQueue};
use super::result::CrawlResult;
use super::state::CrawlState;
use crate::extract::extract;
use crate::fetch::Fetcher;
use crate::resolve::{authority, resolve_tokens};
use crate::trap::is_trapped;

/// Pause before each request: `base` plus up to `jitter` extra.
#[derive(Debug, Clone, Copy)]
pub struct Delay {
    base: Duration,
    jitter: Duration,
}

impl Delay {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn from_millis(base: u64, jitter: u64) -> Self {
        Self::new(Duration::from_millis(base), Duration::from_millis(jitter))
    }

    fn next(&self) -> Duration {
        // Jitter is drawn in whole milliseconds; anything shorter adds nothing
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base;
        }
        let extra = rand::thread_rng().gen_range(0..jitter_ms);
        self.base + Duration::from_millis(extra)
    }

    async fn wait(&self) {
        let pause = self.next();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}

// Outcome of one fetch in the redirect loop
enum Step {
    Follow(Url),
    Stop,
}

pub struct Worker {
    pub id: usize,
    pub queue: WorkQueue,
    pub frontier: Frontier,
    pub state: Arc<CrawlState>,
    pub fetcher: Fetcher,
    pub results: mpsc::UnboundedSender<CrawlResult>,
    pub delay: Delay,
    pub max_redirects: usize,
}

impl Worker {
    pub async fn run(self) {
        loop {
            // Hold the lock only while waiting, not while processing
            let next = self.queue.lock().await.recv().await;
            let Some(url) = next else { break };

            self.process(url).await;
            self.frontier.complete();
        }

        debug!("Worker {} stopped", self.id);
    }

    async fn process(&self, url: Url) {
        debug!("Processing {}", url);

        if url.host_str().is_none() {
            debug!("Skipping {}: no host", url);
            return;
        }
        if is_trapped(url.path()) {
            info!("Skipping {}: looks like a crawl trap", url);
            return;
        }
        if self.state.identity.is_redundant(&url) {
            debug!("Skipping {}: already visited", url);
            return;
        }

        if matches!(url.path(), "" | "/") {
            self.schedule_robots(&url);
        }

        let mut current = url;
        for _ in 0..self.max_redirects {
            match self.step(&current).await {
                Step::Follow(next) => current = next,
                Step::Stop => return,
            }
        }

        info!("Redirect limit reached at {}", current);
    }

    fn schedule_robots(&self, url: &Url) {
        let host = authority(url);
        if !self.state.claim_robots(&host) {
            return;
        }

        match Url::parse(&format!("{}://{}/robots.txt", url.scheme(), host)) {
            Ok(robots) => {
                debug!("Scheduling {}", robots);
                self.frontier.submit(robots);
            }
            Err(e) => debug!("Cannot build robots.txt URL for {}: {}", url, e),
        }
    }

    async fn step(&self, url: &Url) -> Step {
        let Some(ticket) = self.state.identity.claim(url) else {
            debug!("Skipping {}: already fetched", url);
            return Step::Stop;
        };

        self.delay.wait().await;

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                info!("Error requesting {}: {}", url, e);
                self.emit(CrawlResult::failure(url, e));
                return Step::Stop;
            }
        };

        if self.state.identity.is_redundant_before(url, ticket) {
            info!("Skipping {}: an alias was fetched first", url);
            return Step::Stop;
        }
        if self
            .state
            .fingerprints
            .check_and_record(&authority(url), &page.body)
        {
            info!("Skipping {}: similar content already processed", url);
            return Step::Stop;
        }

        self.emit(CrawlResult::response(url, page.status.as_u16()));

        if page.is_redirect() {
            return match page.location(url) {
                Ok(next) => Step::Follow(next),
                Err(e) => {
                    warn!("{}", e);
                    Step::Stop
                }
            };
        }

        let body = String::from_utf8_lossy(&page.body);
        let links = resolve_tokens(url, extract(url.path(), &body));
        debug!("Found {} candidate URLs on {}", links.len(), url);
        for link in links {
            self.frontier.submit(link);
        }

        Step::Stop
    }

    fn emit(&self, result: CrawlResult) {
        // The caller may stop listening; the crawl carries on regardless
        let _ = self.results.send(result);
    }
}
