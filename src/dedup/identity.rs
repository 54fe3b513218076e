// src/dedup/identity.rs
// =============================================================================
// URL identity deduplication.
//
// Every canonical URL that is about to be fetched is *claimed* here first.
// Claims are atomic, so a canonical URL is fetched at most once per run, and
// each claim gets an increasing ticket number.
//
// Beyond exact matches, URLs are grouped by their query-less form
// (scheme://host/path):
// - a URL without a query is redundant if that exact path was visited
//   without a query before
// - a URL with a query is redundant if the path was visited at all before,
//   with or without a query. /search?id=1&sort=desc is an alias of an
//   earlier /search?id=1&sort=asc, and so is any other parameter
//   combination on the same path.
//
// "Before" is measured in tickets, so after fetching, a URL can ask whether
// something claimed *earlier* makes it redundant without matching itself.
// =============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use url::Url;

/// Order in which a URL was claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct PathVisits {
    /// First claim of the path without a query
    bare: Option<u64>,
    /// First claim of the path in any form
    first: Option<u64>,
}

#[derive(Debug, Default)]
struct Visited {
    next: u64,
    canonical: HashMap<String, u64>,
    paths: HashMap<String, PathVisits>,
}

#[derive(Debug, Default)]
pub struct IdentityIndex {
    visited: Mutex<Visited>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact membership of a canonical URL string.
    pub fn contains(&self, canonical: &str) -> bool {
        self.visited.lock().canonical.contains_key(canonical)
    }

    pub fn len(&self) -> usize {
        self.visited.lock().canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks `url` as visited. Returns `None` if it already was.
    pub fn claim(&self, url: &Url) -> Option<Ticket> {
        let mut visited = self.visited.lock();
        if visited.canonical.contains_key(url.as_str()) {
            return None;
        }

        let ticket = visited.next;
        visited.next += 1;
        visited.canonical.insert(url.to_string(), ticket);

        let entry = visited.paths.entry(path_key(url)).or_default();
        if url.query().is_none() {
            entry.bare.get_or_insert(ticket);
        }
        entry.first.get_or_insert(ticket);

        Some(Ticket(ticket))
    }

    /// Whether anything visited so far makes `url` redundant.
    pub fn is_redundant(&self, url: &Url) -> bool {
        if self.contains(url.as_str()) {
            return true;
        }
        self.redundant_before(url, u64::MAX)
    }

    /// Whether a URL claimed before `ticket` makes `url` redundant.
    pub fn is_redundant_before(&self, url: &Url, ticket: Ticket) -> bool {
        self.redundant_before(url, ticket.0)
    }

    fn redundant_before(&self, url: &Url, limit: u64) -> bool {
        let visited = self.visited.lock();
        let Some(entry) = visited.paths.get(&path_key(url)) else {
            return false;
        };

        let earlier = |ticket: Option<u64>| ticket.is_some_and(|t| t < limit);
        if url.query().is_none() {
            earlier(entry.bare)
        } else {
            earlier(entry.first)
        }
    }
}

fn path_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_query(None);
    key.set_fragment(None);
    key.into()
}
