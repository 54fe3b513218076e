// src/crawl/state.rs
// =============================================================================
// Shared state for one crawl run.
//
// Everything the dispatcher and the workers need to agree on lives here and
// is handed to them behind one Arc when the run starts. Nothing is global, so
// two crawls in the same process (or two tests) never see each other's data.
// =============================================================================

use dashmap::DashSet;

use crate::dedup::{FingerprintIndex, IdentityIndex};
use crate::scope::Scope;

pub struct CrawlState {
    /// Hosts allowed or refused by include/exclude rules
    pub scope: Scope,
    /// Every canonical URL claimed for fetching, plus alias lookup
    pub identity: IdentityIndex,
    /// Authorities (host[:port]) whose robots.txt has been scheduled
    pub robots_hosts: DashSet<String>,
    /// Body fingerprints of accepted pages, per authority
    pub fingerprints: FingerprintIndex,
}

impl CrawlState {
    pub fn new(scope: Scope, similarity_threshold: u8) -> Self {
        Self {
            scope,
            identity: IdentityIndex::new(),
            robots_hosts: DashSet::new(),
            fingerprints: FingerprintIndex::new(similarity_threshold),
        }
    }

    /// Marks the authority's robots.txt as scheduled. Returns false if it
    /// already was.
    pub fn claim_robots(&self, authority: &str) -> bool {
        self.robots_hosts.insert(authority.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robots_claimed_once_per_authority() {
        let state = CrawlState::new(Scope::new(), 97);
        assert!(state.claim_robots("example.com"));
        assert!(!state.claim_robots("example.com"));
        assert!(state.claim_robots("example.com:8080"));
    }
}
