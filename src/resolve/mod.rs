// src/resolve/mod.rs
// =============================================================================
// Turns raw candidate tokens into absolute, canonical URLs.
//
// The extractor hands us whatever looked like a path inside a quoted string:
// "/about", "js/app.js", "//cdn.example.com/x", "example.com", "../up"...
// resolve_token() decides what absolute URL each one most likely points to,
// using the page it was found on as the base, then canonicalizes it.
//
// This is deliberately NOT RFC 3986 reference resolution (Url::join): a bare
// word found on /docs is treated as a directory below /docs, which is how
// scripts and routers in the wild tend to build their URLs.
// =============================================================================

mod canonical;
mod text;

pub use canonical::canonicalize;
pub use text::{
    has_file_extension, has_query_params, has_scheme, is_media_type, is_printable_text,
    is_valid_domain,
};

use tracing::debug;
use url::Url;

/// `scheme://host[:port]` of a URL.
pub fn origin(url: &Url) -> String {
    format!("{}://{}", url.scheme(), authority(url))
}

/// `host[:port]` of a URL (empty when it has no host).
pub fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// Whether a token should be ignored before resolving it against `base`.
pub fn should_skip(base: &Url, token: &str) -> bool {
    let host = authority(base);

    token.is_empty()
        || token == host
        || host.ends_with(token)
        || is_media_type(token)
        || !is_printable_text(token)
        // Two or more dots in the base path: assume it's a file, don't descend
        || base.path().matches('.').count() >= 2
}

/// Applies the resolution rules in order; the first one that matches wins.
pub fn format_url(base: &Url, token: &str) -> String {
    let mut path = token.replace('\\', "");

    if !path.starts_with('/') && !has_scheme(&path) && path.contains('.') {
        path.insert(0, '/');
    }

    if has_scheme(&path) || is_valid_domain(&path) || path.starts_with("//") {
        return path;
    }

    let origin = origin(base);

    if path.contains('.') {
        return if path.starts_with('/') {
            format!("{}{}", origin, path)
        } else {
            format!("{}/{}", base.as_str(), path)
        };
    }

    if path.starts_with('/') {
        return format!("{}{}/", origin, path);
    }

    if has_file_extension(&path) || has_query_params(&path) {
        return format!("{}{}/{}", origin, base.path(), path);
    }

    format!("{}{}/{}/", origin, base.path(), path)
}

/// Resolves one token into zero, one or two canonical URLs.
///
/// A token that looks like a bare domain is also tried as a path below the
/// base URL, since `"example.com"` in a page may be either.
pub fn resolve_token(base: &Url, token: &str) -> Vec<Url> {
    if should_skip(base, token) {
        return Vec::new();
    }

    let mut raw = Vec::with_capacity(2);
    if is_valid_domain(token) {
        raw.push(format!("{}/{}", base.as_str(), token));
    }
    raw.push(format_url(base, token));

    raw.into_iter()
        .filter_map(|candidate| {
            let absolute = make_absolute(base, &candidate);
            match canonicalize(&absolute) {
                Ok(url) => Some(url),
                Err(e) => {
                    debug!("Dropping candidate {} from {}: {}", absolute, base, e);
                    None
                }
            }
        })
        .collect()
}

/// Resolves every token from one page, dropping failures.
pub fn resolve_tokens<I>(base: &Url, tokens: I) -> Vec<Url>
where
    I: IntoIterator<Item = String>,
{
    tokens
        .into_iter()
        .flat_map(|token| resolve_token(base, &token))
        .collect()
}

// Protocol-relative and bare-domain results borrow the base scheme
fn make_absolute(base: &Url, candidate: &str) -> String {
    if candidate.starts_with("//") {
        format!("{}:{}", base.scheme(), candidate)
    } else if has_scheme(candidate) {
        candidate.to_string()
    } else {
        format!("{}://{}", base.scheme(), candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn resolved(base_url: &str, token: &str) -> Vec<String> {
        resolve_token(&base(base_url), token)
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn test_rooted_file() {
        assert_eq!(
            resolved("http://example.com/", "/about.html"),
            vec!["http://example.com/about.html"]
        );
    }

    #[test]
    fn test_dotted_token_gets_rooted() {
        assert_eq!(
            resolved("http://example.com/docs", "js/app.js"),
            vec!["http://example.com/js/app.js"]
        );
    }

    #[test]
    fn test_absolute_and_protocol_relative() {
        assert_eq!(
            resolved("https://example.com/", "https://other.com/x"),
            vec!["https://other.com/x"]
        );
        assert_eq!(
            resolved("https://example.com/", "//cdn.example.net/lib"),
            vec!["https://cdn.example.net/lib"]
        );
    }

    #[test]
    fn test_rooted_directory() {
        assert_eq!(
            format_url(&base("http://example.com/a"), "/admin"),
            "http://example.com/admin/"
        );
    }

    #[test]
    fn test_relative_directory_and_params() {
        assert_eq!(
            format_url(&base("http://example.com/docs"), "guide"),
            "http://example.com/docs/guide/"
        );
        assert_eq!(
            format_url(&base("http://example.com/docs"), "search?q=x"),
            "http://example.com/docs/search?q=x"
        );
        assert_eq!(
            resolved("http://example.com/docs", "guide"),
            vec!["http://example.com/docs/guide"]
        );
    }

    #[test]
    fn test_bare_domain_emits_both_forms() {
        // The dotted token is rooted before the domain rule sees it
        let urls = resolved("http://example.com/page", "partner.org");
        assert_eq!(
            urls,
            vec![
                "http://example.com/page/partner.org",
                "http://example.com/partner.org"
            ]
        );
    }

    #[test]
    fn test_backslashes_stripped() {
        assert_eq!(
            resolved("http://example.com/", "\\/api\\/v1\\/users"),
            vec!["http://example.com/api/v1/users"]
        );
    }

    #[test]
    fn test_skipped_tokens() {
        let b = base("http://example.com/");
        assert!(should_skip(&b, ""));
        assert!(should_skip(&b, "example.com"));
        assert!(should_skip(&b, ".com"));
        assert!(should_skip(&b, "image/png"));
        assert!(should_skip(&b, "/a\u{1}b"));
        assert!(should_skip(&base("http://example.com/jquery.min.js"), "/x"));
        assert!(!should_skip(&b, "/about"));
    }

    #[test]
    fn test_deterministic() {
        let b = base("http://example.com/docs/");
        for token in ["/a.html", "guide", "../up", "x.org", "//h.io/p", "q?a=1"] {
            assert_eq!(resolve_token(&b, token), resolve_token(&b, token));
        }
    }
}
