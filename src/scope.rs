// src/scope.rs
// =============================================================================
// Host-level allow/deny decisions.
//
// Patterns may be:
// - an exact host            example.com
// - a host with port         127.0.0.1:8080
// - a wildcard suffix        *.example.com   (matches sub.example.com only)
// - a full URL               https://example.com/path   (reduced to its host)
//
// Excludes always win. An empty include list admits every host that is not
// excluded.
// =============================================================================

use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct Scope {
    includes: RwLock<Vec<String>>,
    excludes: RwLock<Vec<String>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_include(&self, pattern: &str) {
        if let Some(pattern) = normalize_pattern(pattern) {
            let mut includes = self.includes.write();
            if !includes.contains(&pattern) {
                includes.push(pattern);
            }
        }
    }

    pub fn add_exclude(&self, pattern: &str) {
        if let Some(pattern) = normalize_pattern(pattern) {
            let mut excludes = self.excludes.write();
            if !excludes.contains(&pattern) {
                excludes.push(pattern);
            }
        }
    }

    /// `host` may carry a port (`127.0.0.1:8080`); patterns without a port
    /// match any port on that host.
    pub fn is_in_scope(&self, host: &str) -> bool {
        let host = host.trim().to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }

        if self.excludes.read().iter().any(|p| matches(p, &host)) {
            return false;
        }

        let includes = self.includes.read();
        includes.is_empty() || includes.iter().any(|p| matches(p, &host))
    }
}

fn normalize_pattern(pattern: &str) -> Option<String> {
    let mut pattern = pattern.trim().to_ascii_lowercase();
    if let Some((_, rest)) = pattern.split_once("://") {
        pattern = rest.to_string();
    }
    if let Some(idx) = pattern.find(['/', '?', '#']) {
        pattern.truncate(idx);
    }
    let pattern = pattern.trim_end_matches('.').to_string();
    if pattern.is_empty() {
        None
    } else {
        Some(pattern)
    }
}

fn matches(pattern: &str, host: &str) -> bool {
    let hostname = strip_port(host);

    if let Some(suffix) = pattern.strip_prefix("*.") {
        return hostname.len() > suffix.len()
            && hostname.ends_with(suffix)
            && hostname.as_bytes()[hostname.len() - suffix.len() - 1] == b'.';
    }

    if has_port(pattern) {
        pattern == host
    } else {
        pattern == hostname
    }
}

fn strip_port(host: &str) -> &str {
    // IPv6 literals keep their brackets: [::1]:8080 -> [::1]
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

fn has_port(pattern: &str) -> bool {
    strip_port(pattern).len() != pattern.len()
}
