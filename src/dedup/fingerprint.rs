// src/dedup/fingerprint.rs
// =============================================================================
// Content-similarity deduplication.
//
// Sites happily serve the same page under endless URLs (session ids, sort
// orders, soft 404s). Each accepted body gets a SimHash fingerprint: every
// 8-byte shingle of the body is hashed and votes on each of the 64 bits, so
// bodies that share most of their shingles end up with fingerprints that
// differ in very few bits.
//
// similarity = (64 - differing bits) * 100 / 64
//
// A body whose similarity to any earlier body *on the same host* reaches the
// threshold is a near-duplicate and is not processed further.
// =============================================================================

use dashmap::DashMap;
use xxhash_rust::xxh3::xxh3_64;

/// Bodies shorter than this carry too little signal and are never
/// fingerprinted (so they never count as duplicates).
pub const MIN_BODY_LEN: usize = 4096;

const SHINGLE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(body: &[u8]) -> Option<Self> {
        if body.len() < MIN_BODY_LEN {
            return None;
        }

        let mut votes = [0i64; 64];
        for shingle in body.windows(SHINGLE_LEN) {
            let hash = xxh3_64(shingle);
            for (bit, vote) in votes.iter_mut().enumerate() {
                if (hash >> bit) & 1 == 1 {
                    *vote += 1;
                } else {
                    *vote -= 1;
                }
            }
        }

        let bits = votes
            .iter()
            .enumerate()
            .filter(|(_, vote)| **vote > 0)
            .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit));

        Some(Fingerprint(bits))
    }

    /// Similarity score from 0 (opposite) to 100 (identical).
    pub fn similarity(&self, other: &Fingerprint) -> u8 {
        let differing = (self.0 ^ other.0).count_ones();
        ((64 - differing) * 100 / 64) as u8
    }
}

/// Fingerprints of accepted bodies, per host.
pub struct FingerprintIndex {
    hosts: DashMap<String, Vec<Fingerprint>>,
    threshold: u8,
}

impl FingerprintIndex {
    pub fn new(threshold: u8) -> Self {
        Self {
            hosts: DashMap::new(),
            threshold,
        }
    }

    /// Returns true if `body` is a near-duplicate of a body already accepted
    /// for `host`; otherwise records it and returns false.
    ///
    /// The host's entry stays locked between comparison and insert, so two
    /// workers cannot both accept the same near-duplicate.
    pub fn check_and_record(&self, host: &str, body: &[u8]) -> bool {
        let Some(fingerprint) = Fingerprint::of(body) else {
            return false;
        };

        let mut known = self.hosts.entry(host.to_string()).or_default();
        if known
            .iter()
            .any(|seen| seen.similarity(&fingerprint) >= self.threshold)
        {
            return true;
        }

        known.push(fingerprint);
        false
    }

    pub fn len(&self, host: &str) -> usize {
        self.hosts.get(host).map_or(0, |known| known.len())
    }
}
