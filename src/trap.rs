// src/trap.rs
// =============================================================================
// Crawl trap detection.
//
// Calendars, faceted navigation and broken relative links produce paths like
// /2024/01/2024/01/2024/01/... that never end. Such paths are recognised by
// how often their own segments reappear inside them, before any request is
// made.
// =============================================================================

/// Paths with fewer segments than this are never considered traps.
pub const MIN_TRAP_SEGMENTS: usize = 10;

/// Average number of times each segment must reappear in the path.
pub const REPETITION_THRESHOLD: usize = 3;

/// Returns true if `path` repeats its own segments often enough to look like
/// an endless link structure.
///
/// The path is split on `/` (the leading empty segment counts towards the
/// total). Every non-empty segment after the first contributes the number of
/// times it occurs as a substring of the whole path.
pub fn is_trapped(path: &str) -> bool {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() < MIN_TRAP_SEGMENTS {
        return false;
    }

    let total: usize = parts[1..]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| path.matches(part).count())
        .sum();

    total / parts.len() >= REPETITION_THRESHOLD
}
