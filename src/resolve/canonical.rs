// src/resolve/canonical.rs
// =============================================================================
// URL canonicalization.
//
// Two spellings of the same resource must produce the same string, otherwise
// the visited set lets duplicates through. Parsing with the `url` crate
// already handles the mechanical part (lowercase scheme and host, default
// ports, numeric IPv4 hosts like 0x7f.1, dot segments, escaping of characters
// that must be escaped); the rest is done here:
//
// - leading/trailing/repeated dots in the host are removed
// - repeated slashes in the path are collapsed
// - percent-escapes are uppercased, escapes of unreserved characters decoded
// - a single trailing slash is removed (except for the root path)
// - query parameters are sorted by name (values keep their order)
//
// canonicalize(canonicalize(x)) == canonicalize(x).
// =============================================================================

use url::form_urlencoded;
use url::Url;

pub fn canonicalize(raw: &str) -> Result<Url, url::ParseError> {
    let escaped = raw.trim().replace('\\', "%5C");
    let mut url = Url::parse(&escaped)?;

    if let Some(host) = url.host_str() {
        let cleaned = clean_host_dots(host);
        if cleaned != host {
            url.set_host(Some(&cleaned))?;
        }
    }

    let path = normalize_path(url.path());
    if path != url.path() {
        url.set_path(&path);
    }

    match url.query() {
        Some(query) if query.is_empty() => url.set_query(None),
        Some(_) => {
            let sorted = sorted_query(&url);
            url.set_query(Some(&sorted));
        }
        None => {}
    }

    Ok(url)
}

fn clean_host_dots(host: &str) -> String {
    host.split('.')
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

fn normalize_path(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }

    let mut normalized = normalize_escapes(&collapsed);
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

// %7e -> ~, %2f -> %2F
fn normalize_escapes(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                let decoded = hi * 16 + lo;
                if is_unreserved(decoded) {
                    out.push(decoded as char);
                } else {
                    out.push('%');
                    out.push(bytes[i + 1].to_ascii_uppercase() as char);
                    out.push(bytes[i + 2].to_ascii_uppercase() as char);
                }
                i += 3;
                continue;
            }
        }

        // Multi-byte characters are already escaped by the parser, so the
        // remaining bytes are ASCII
        out.push(bytes[i] as char);
        i += 1;
    }

    out
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn sorted_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(raw: &str) -> String {
        canonicalize(raw).unwrap().to_string()
    }

    #[test]
    fn test_case_and_default_port() {
        assert_eq!(canon("HTTP://Example.COM:80/Path"), "http://example.com/Path");
        assert_eq!(canon("https://example.com:443/"), "https://example.com/");
        assert_eq!(canon("https://example.com:8443/"), "https://example.com:8443/");
    }

    #[test]
    fn test_numeric_hosts() {
        assert_eq!(canon("http://0x7f000001/"), "http://127.0.0.1/");
        assert_eq!(canon("http://2130706433/"), "http://127.0.0.1/");
        assert_eq!(canon("http://0177.0.0.1/"), "http://127.0.0.1/");
    }

    #[test]
    fn test_host_dots() {
        assert_eq!(canon("http://www.example.com./a"), "http://www.example.com/a");
    }

    #[test]
    fn test_path_cleanup() {
        assert_eq!(canon("http://example.com//a///b/"), "http://example.com/a/b");
        assert_eq!(canon("http://example.com/a/./b/../c"), "http://example.com/a/c");
        assert_eq!(canon("http://example.com"), "http://example.com/");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(canon("http://example.com/%7euser/%2f"), "http://example.com/~user/%2F");
        assert_eq!(canon("http://example.com/a b"), "http://example.com/a%20b");
        assert_eq!(canon("http://example.com/a\\b"), "http://example.com/a%5Cb");
    }

    #[test]
    fn test_query_sorted() {
        assert_eq!(
            canon("http://example.com/s?sort=asc&id=1&id=0"),
            "http://example.com/s?id=1&id=0&sort=asc"
        );
        assert_eq!(canon("http://example.com/s?"), "http://example.com/s");
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            "HTTP://Example.COM:80//a/./b/../c/?z=1&a=%7e",
            "http://example.com/%7euser/a%2fb/",
            "https://example.com/s?q=a+b&flag",
            "http://example.com/path#frag",
        ] {
            let once = canon(raw);
            assert_eq!(canon(&once), once, "not idempotent for {}", raw);
        }
    }
}
