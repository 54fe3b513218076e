// src/extract/robots.rs
// =============================================================================
// robots.txt scraping.
//
// robots.txt is mined for paths, not obeyed: every Allow/Disallow directive
// names a path that exists (or existed) on the host, which makes it a cheap
// source of URLs the HTML never links to.
//
//   Disallow: /admin/*.php$    ->  /admin/
//   Allow: /search?            ->  /search
//   Disallow: /*               ->  (dropped, too short)
// =============================================================================

use std::collections::HashSet;
use std::str::Lines;

pub struct RobotsTokens<'a> {
    lines: Lines<'a>,
    seen: HashSet<String>,
}

pub fn scrape_robots(body: &str) -> RobotsTokens<'_> {
    RobotsTokens {
        lines: body.lines(),
        seen: HashSet::new(),
    }
}

impl Iterator for RobotsTokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for line in self.lines.by_ref() {
            let Some(value) = directive_value(line) else {
                continue;
            };

            let path = clean_directive_path(value);
            if path.len() > 1 && self.seen.insert(path.clone()) {
                return Some(path);
            }
        }
        None
    }
}

// Returns whatever follows `Allow:` or `Disallow:` on the line
fn directive_value(line: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets intact
    let lower = line.to_ascii_lowercase();
    let idx = lower.find("allow:")?;
    Some(&line[idx + "allow:".len()..])
}

fn clean_directive_path(value: &str) -> String {
    let value = match value.find('#') {
        Some(idx) => &value[..idx],
        None => value,
    };

    let path: String = value.trim().chars().filter(|c| *c != '*' && *c != '$').collect();
    let path = path.strip_suffix('?').unwrap_or(&path);

    collapse_extension_segment(path)
}

// `/dir/.php` (left behind by `/dir/*.php`) becomes `/dir/`
fn collapse_extension_segment(path: &str) -> String {
    if let Some(idx) = path.rfind("/.") {
        let ext = &path[idx + 2..];
        if !ext.is_empty()
            && ext
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return format!("{}/", &path[..idx]);
        }
    }
    path.to_string()
}
