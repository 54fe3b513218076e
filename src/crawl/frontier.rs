// src/crawl/frontier.rs
// =============================================================================
// The frontier: where discovered URLs wait until a worker is free.
//
//   producers ──submit()──► intake (bounded) ──► Dispatcher ──► dispatch (1) ──► workers
//
// - Any number of producers (seeds, workers re-injecting links, robots.txt
//   scheduling) call submit(). Each submission is sent from its own small
//   task, so a producer never waits on a full intake.
// - The Dispatcher filters at dispatch time: out-of-scope or already-visited
//   URLs are dropped there. The same URL may be submitted many times; only
//   the first dispatch counts.
//
// When does the crawl end?
// - In-flight counter: +1 per submission, -1 when the dispatcher drops a URL
//   or a worker finishes one. Workers submit children *before* finishing, so
//   zero means nothing is left to discover.
// - Idle timeout: no dispatch for `idle_timeout`. This is the backstop for
//   stalled producers and is what ends a run whose counter never drains.
//
// Whichever fires first closes the dispatch channel, which stops the workers.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};
use url::Url;

use super::state::CrawlState;
use crate::resolve::{authority, canonicalize};

/// Receiving end of the dispatch channel, shared by all workers.
pub type WorkQueue = Arc<Mutex<mpsc::Receiver<Url>>>;

/// Producer handle. Cheap to clone; every worker holds one.
#[derive(Clone)]
pub struct Frontier {
    intake: mpsc::Sender<Url>,
    in_flight: Arc<watch::Sender<usize>>,
}

impl Frontier {
    /// Creates the frontier, its dispatcher, and the queue workers read from.
    pub fn new(
        state: Arc<CrawlState>,
        capacity: usize,
        idle_timeout: Duration,
    ) -> (Frontier, Dispatcher, WorkQueue) {
        let (intake_tx, intake_rx) = mpsc::channel(capacity.max(1));
        let (dispatch_tx, dispatch_rx) = mpsc::channel(1);
        let (in_flight_tx, in_flight_rx) = watch::channel(0usize);

        let frontier = Frontier {
            intake: intake_tx,
            in_flight: Arc::new(in_flight_tx),
        };

        let dispatcher = Dispatcher {
            intake: intake_rx,
            dispatch: dispatch_tx,
            in_flight: in_flight_rx,
            frontier: frontier.clone(),
            state,
            idle_timeout,
        };

        (frontier, dispatcher, Arc::new(Mutex::new(dispatch_rx)))
    }

    /// Queues a URL for crawling. The URL is canonicalized first; URLs that
    /// fail to canonicalize are dropped.
    pub fn submit(&self, url: Url) {
        let url = match canonicalize(url.as_str()) {
            Ok(url) => url,
            Err(e) => {
                debug!("Not queueing {}: {}", url, e);
                return;
            }
        };

        self.in_flight.send_modify(|n| *n += 1);

        let intake = self.intake.clone();
        let in_flight = self.in_flight.clone();
        tokio::spawn(async move {
            // Fails only once the dispatcher has stopped
            if intake.send(url).await.is_err() {
                in_flight.send_modify(|n| *n = n.saturating_sub(1));
            }
        });
    }

    /// Marks one submitted URL as fully handled.
    pub fn complete(&self) {
        self.in_flight.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// URLs submitted but not yet fully handled.
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }
}

pub struct Dispatcher {
    intake: mpsc::Receiver<Url>,
    dispatch: mpsc::Sender<Url>,
    in_flight: watch::Receiver<usize>,
    frontier: Frontier,
    state: Arc<CrawlState>,
    idle_timeout: Duration,
}

impl Dispatcher {
    /// Feeds workers until the crawl is finished. Returns the number of
    /// URLs dispatched.
    pub async fn run(mut self) -> usize {
        let mut deadline = Instant::now() + self.idle_timeout;
        let mut dispatched = 0usize;

        loop {
            tokio::select! {
                received = self.intake.recv() => {
                    // The frontier held by self keeps the intake open
                    let Some(url) = received else { break };

                    if !self.admits(&url) {
                        self.frontier.complete();
                        continue;
                    }

                    if self.dispatch.send(url).await.is_err() {
                        break;
                    }
                    dispatched += 1;
                    deadline = Instant::now() + self.idle_timeout;
                }
                _ = sleep_until(deadline) => {
                    info!(
                        "No URL dispatched for {}s, stopping ({} still in flight)",
                        self.idle_timeout.as_secs(),
                        self.frontier.in_flight()
                    );
                    break;
                }
                _ = drained(&mut self.in_flight) => {
                    debug!("Frontier drained, stopping");
                    break;
                }
            }
        }

        debug!("Dispatcher finished after {} dispatches", dispatched);
        dispatched
    }

    fn admits(&self, url: &Url) -> bool {
        let host = authority(url);
        if !self.state.scope.is_in_scope(&host) {
            debug!("Out of scope: {}", url);
            return false;
        }
        if self.state.identity.contains(url.as_str()) {
            debug!("Already visited: {}", url);
            return false;
        }
        true
    }
}

async fn drained(in_flight: &mut watch::Receiver<usize>) {
    // An error means every Frontier is gone, which is also the end
    let _ = in_flight.wait_for(|n| *n == 0).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;

    fn state(include: &[&str]) -> Arc<CrawlState> {
        let scope = Scope::new();
        for pattern in include {
            scope.add_include(pattern);
        }
        Arc::new(CrawlState::new(scope, 97))
    }

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_empty_frontier_stops_immediately() {
        let (_frontier, dispatcher, _queue) =
            Frontier::new(state(&[]), 16, Duration::from_secs(30));

        let dispatched = tokio::time::timeout(Duration::from_secs(2), dispatcher.run())
            .await
            .unwrap();
        assert_eq!(dispatched, 0);
    }

    #[tokio::test]
    async fn test_filters_scope_and_visited() {
        let state = state(&["example.com"]);
        state
            .identity
            .claim(&canonicalize("http://example.com/seen").unwrap());

        let (frontier, dispatcher, queue) =
            Frontier::new(state.clone(), 16, Duration::from_secs(30));

        frontier.submit(url("http://example.com/seen"));
        frontier.submit(url("http://other.com/x"));
        frontier.submit(url("http://example.com/new"));

        let handle = tokio::spawn(dispatcher.run());

        let got = queue.lock().await.recv().await.unwrap();
        assert_eq!(got.as_str(), "http://example.com/new");
        frontier.complete();

        let dispatched = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dispatched, 1);
        assert_eq!(frontier.in_flight(), 0);
        assert!(queue.lock().await.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_idle_timeout_ends_run_with_work_outstanding() {
        let (frontier, dispatcher, queue) =
            Frontier::new(state(&[]), 16, Duration::from_millis(200));

        frontier.submit(url("http://example.com/"));
        let handle = tokio::spawn(dispatcher.run());

        // Take the URL but never complete it
        let _taken = queue.lock().await.recv().await.unwrap();

        let dispatched = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dispatched, 1);
        assert_eq!(frontier.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_urls_are_canonicalized_on_submit() {
        let (frontier, dispatcher, queue) =
            Frontier::new(state(&[]), 16, Duration::from_secs(30));

        frontier.submit(url("HTTP://Example.COM:80/a/./b/"));
        let handle = tokio::spawn(dispatcher.run());

        let got = queue.lock().await.recv().await.unwrap();
        assert_eq!(got.as_str(), "http://example.com/a/b");
        frontier.complete();
        handle.await.unwrap();
    }
}
