// src/extract/mod.rs
// =============================================================================
// Candidate token extraction from response bodies.
//
// Submodules:
// - paths: quoted-literal scraping for any body (HTML, JS, JSON, CSS...)
// - robots: Allow/Disallow mining for robots.txt
//
// Both produce lazy, finite iterators of unique strings. The tokens are raw:
// turning them into absolute URLs is the resolver's job.
// =============================================================================

mod paths;
mod robots;

pub use paths::{classify, scrape_paths, PathTokens, TokenClass};
pub use robots::{scrape_robots, RobotsTokens};

/// Tokens from one response body, produced by whichever heuristic fits it.
pub enum Tokens<'a> {
    Paths(PathTokens<'a>),
    Robots(RobotsTokens<'a>),
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match self {
            Tokens::Paths(tokens) => tokens.next(),
            Tokens::Robots(tokens) => tokens.next(),
        }
    }
}

pub fn is_robots_path(path: &str) -> bool {
    path.ends_with("robots.txt")
}

/// Picks the heuristic from the path the body was fetched from.
pub fn extract<'a>(source_path: &str, body: &'a str) -> Tokens<'a> {
    if is_robots_path(source_path) {
        Tokens::Robots(scrape_robots(body))
    } else {
        Tokens::Paths(scrape_paths(body))
    }
}
