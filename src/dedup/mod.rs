// src/dedup/mod.rs
// =============================================================================
// The two independent deduplication layers:
// - identity: "have we already requested this URL, or an alias of it?"
// - fingerprint: "have we already seen this content on this host?"
//
// Identity is checked before a request goes out; the fingerprint only once a
// body is in hand.
// =============================================================================

mod fingerprint;
mod identity;

pub use fingerprint::{Fingerprint, FingerprintIndex, MIN_BODY_LEN};
pub use identity::{IdentityIndex, Ticket};
