// src/extract/paths.rs
// =============================================================================
// Generic path scraping.
//
// Links hide everywhere in a response: href/src attributes, inline scripts,
// JSON blobs, CSS url() strings. Instead of parsing any of those formats we
// look at every quoted string literal ("..." or '...') in the raw body and
// keep the ones whose contents look like a URL or a path.
//
// A literal is accepted when it belongs to one of these token classes,
// checked in priority order:
//
//   AbsoluteUrl   https://cdn.example.com/x.js   //cdn.example.com/x.js
//   RootedPath    /api/v1/users                  \/escaped\/json
//   RelativePath  ./img/logo.png                 ../index.html
//   FileName      js/app.min.js?v=3              static/style.css#top
//   LongPath      api/users/list
//   BareDomain    example.com                    app.bundle.js
//   BarePath      admin/
// =============================================================================

use std::collections::HashSet;

/// The shape of an accepted quoted literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    AbsoluteUrl,
    RootedPath,
    RelativePath,
    FileName,
    LongPath,
    BareDomain,
    BarePath,
}

// First character after a leading `/`, `./` or `../` may not be one of these
const FIRST_FORBIDDEN: &[char] = &[
    '"', '\'', '>', '<', ',', ';', '|', '*', '(', ')', '%', '$', '^', '/', '\\', '[', ']',
];
// ...and no later character may be one of these
const REST_FORBIDDEN: &[char] = &['"', '\'', '>', '<', ',', ';', '|', '(', ')'];

/// Classifies the contents of a quoted literal (quotes already removed).
pub fn classify(candidate: &str) -> Option<TokenClass> {
    if candidate.is_empty() {
        return None;
    }
    if is_absolute_url(candidate) {
        return Some(TokenClass::AbsoluteUrl);
    }
    if let Some(rest) = candidate
        .strip_prefix('/')
        .or_else(|| candidate.strip_prefix("\\/"))
    {
        if is_path_body(rest) {
            return Some(TokenClass::RootedPath);
        }
    }
    if let Some(rest) = candidate
        .strip_prefix("../")
        .or_else(|| candidate.strip_prefix("./"))
    {
        if is_path_body(rest) {
            return Some(TokenClass::RelativePath);
        }
    }
    if is_file_name(candidate) {
        return Some(TokenClass::FileName);
    }
    if is_long_path(candidate) {
        return Some(TokenClass::LongPath);
    }
    if is_bare_domain(candidate) {
        return Some(TokenClass::BareDomain);
    }
    if is_bare_path(candidate) {
        return Some(TokenClass::BarePath);
    }
    None
}

/// Lazy iterator over the unique path-like literals of a body.
///
/// Each literal is yielded once, in order of first appearance. The iterator
/// is not restartable; call `scrape_paths` again to rescan.
pub struct PathTokens<'a> {
    body: &'a str,
    pos: usize,
    seen: HashSet<&'a str>,
}

pub fn scrape_paths(body: &str) -> PathTokens<'_> {
    PathTokens {
        body,
        pos: 0,
        seen: HashSet::new(),
    }
}

impl<'a> Iterator for PathTokens<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let bytes = self.body.as_bytes();

        while let Some(open) = find_quote(bytes, self.pos) {
            let Some(close) = find_quote(bytes, open + 1) else {
                break;
            };

            let candidate = &self.body[open + 1..close];
            if classify(candidate).is_some() {
                // The closing quote is consumed with the match
                self.pos = close + 1;
                if self.seen.insert(candidate) {
                    return Some(candidate.to_string());
                }
            } else {
                // The closing quote may open the next literal
                self.pos = close;
            }
        }

        self.pos = bytes.len();
        None
    }
}

fn find_quote(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|b| *b == b'"' || *b == b'\'')
        .map(|offset| from + offset)
}

// [A-Za-z0-9_-/]
fn is_word_or_slash(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '/'
}

fn is_path_body(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some(first) if !FIRST_FORBIDDEN.contains(&first) => {
            chars.all(|c| !REST_FORBIDDEN.contains(&c))
        }
        _ => false,
    }
}

fn is_absolute_url(candidate: &str) -> bool {
    let Some(rest) = strip_scheme_prefix(candidate) else {
        return false;
    };

    // The host part needs a dot followed by at least two letters
    let authority = rest.split('/').next().unwrap_or("");
    authority.char_indices().any(|(i, c)| {
        c == '.'
            && i >= 1
            && authority[i + 1..]
                .chars()
                .take(2)
                .filter(|c| c.is_ascii_alphabetic())
                .count()
                == 2
    })
}

// Strips `scheme://`, `scheme:\/\/` or a leading `//`.
fn strip_scheme_prefix(candidate: &str) -> Option<&str> {
    if let Some(rest) = candidate.strip_prefix("//") {
        return Some(rest);
    }

    let (scheme, rest) = candidate.split_once(':')?;
    if scheme.is_empty() || scheme.len() > 10 || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let rest = rest.strip_prefix('\\').unwrap_or(rest);
    let rest = rest.strip_prefix('/')?;
    let rest = rest.strip_prefix('\\').unwrap_or(rest);
    rest.strip_prefix('/')
}

// Splits off an optional `?query`, `#fragment` (or `|...`) tail.
fn split_tail(candidate: &str) -> Option<(&str, &str)> {
    match candidate.find(['?', '#', '|']) {
        Some(idx) => {
            let tail = &candidate[idx..];
            if tail[1..].contains(['"', '\'', '|']) {
                None
            } else {
                Some((&candidate[..idx], tail))
            }
        }
        None => Some((candidate, "")),
    }
}

// A slash somewhere after the first character
fn has_inner_slash(head: &str) -> bool {
    head.char_indices().any(|(i, c)| c == '/' && i >= 1)
}

fn is_file_name(candidate: &str) -> bool {
    let Some((head, _)) = split_tail(candidate) else {
        return false;
    };
    let Some((stem, ext)) = head.rsplit_once('.') else {
        return false;
    };

    !stem.is_empty()
        && stem.chars().all(is_word_or_slash)
        && has_inner_slash(stem)
        && !ext.is_empty()
        && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_long_path(candidate: &str) -> bool {
    let Some((head, _)) = split_tail(candidate) else {
        return false;
    };
    if head.is_empty() || !head.chars().all(is_word_or_slash) {
        return false;
    }

    // The first inner slash leaves the longest remainder
    match head[1..].find('/') {
        Some(idx) => head.len() - (idx + 1) - 1 >= 3,
        None => false,
    }
}

fn is_bare_domain(candidate: &str) -> bool {
    let mut labels = candidate.split('.');
    let first = labels.next().unwrap_or("");
    if first.is_empty()
        || !first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return false;
    }

    let mut rest = labels.peekable();
    rest.peek().is_some()
        && rest.all(|label| {
            !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn is_bare_path(candidate: &str) -> bool {
    candidate.len() >= 2 && candidate.ends_with('/') && candidate.chars().all(is_word_or_slash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(body: &str) -> Vec<String> {
        scrape_paths(body).collect()
    }

    #[test]
    fn test_classes() {
        assert_eq!(classify("https://example.com/x"), Some(TokenClass::AbsoluteUrl));
        assert_eq!(classify("//cdn.example.com/a.js"), Some(TokenClass::AbsoluteUrl));
        assert_eq!(classify("https:\\/\\/example.com"), Some(TokenClass::AbsoluteUrl));
        assert_eq!(classify("/about.html"), Some(TokenClass::RootedPath));
        assert_eq!(classify("\\/api\\/users"), Some(TokenClass::RootedPath));
        assert_eq!(classify("../index.html"), Some(TokenClass::RelativePath));
        assert_eq!(classify("./img/logo.png"), Some(TokenClass::RelativePath));
        assert_eq!(classify("js/app.js?v=3"), Some(TokenClass::FileName));
        assert_eq!(classify("api/users/list"), Some(TokenClass::LongPath));
        assert_eq!(classify("example.com"), Some(TokenClass::BareDomain));
        assert_eq!(classify("admin/"), Some(TokenClass::BarePath));
    }

    #[test]
    fn test_rejected_literals() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("hello world"), None);
        assert_eq!(classify("/"), None);
        assert_eq!(classify("/*comment"), None);
        assert_eq!(classify("a/b"), None);
        assert_eq!(classify("text-center"), None);
        assert_eq!(classify("https://localhost/x"), None);
    }

    #[test]
    fn test_scrapes_attributes_and_scripts() {
        let body = r#"
            <a href="/about.html">About</a>
            <img src='./img/logo.png'>
            <script>fetch("api/users/list").then(x => x)</script>
            <div class="container">hi</div>
        "#;
        let tokens = collect(body);
        assert_eq!(tokens, vec!["/about.html", "./img/logo.png", "api/users/list"]);
    }

    #[test]
    fn test_deduplicates() {
        let body = r#"<a href="/a/">x</a><a href="/a/">y</a><a href='/a/'>z</a>"#;
        assert_eq!(collect(body), vec!["/a/"]);
    }

    #[test]
    fn test_closing_quote_can_open_next_literal() {
        // `" x "` is rejected, so its closing quote starts the next candidate
        let body = r#"" x "/next/page""#;
        assert_eq!(collect(body), vec!["/next/page"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(collect(r#"<a href="/never-closed>"#).is_empty());
    }
}
