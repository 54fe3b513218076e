// src/resolve/text.rs
// Small string predicates used while resolving candidate tokens.

const MEDIA_PREFIXES: &[&str] = &[
    "audio/",
    "application/",
    "font/",
    "image/",
    "multipart/",
    "text/",
    "video/",
];

/// `scheme://` with an RFC 3986 scheme name.
pub fn has_scheme(s: &str) -> bool {
    match s.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// A syntactically valid DNS name with an alphabetic top-level label,
/// e.g. `example.com` or `cdn.example.co.uk`.
pub fn is_valid_domain(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = s.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    let tld = labels[labels.len() - 1];
    labels_ok && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// The last path segment (ignoring query and fragment) ends in `.ext`.
pub fn has_file_extension(s: &str) -> bool {
    let path = s.split(['?', '#']).next().unwrap_or("");
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

pub fn has_query_params(s: &str) -> bool {
    matches!(s.split_once('?'), Some((_, query)) if !query.is_empty())
}

/// MIME types such as `image/png` show up in quoted literals all the time.
pub fn is_media_type(s: &str) -> bool {
    MEDIA_PREFIXES.iter().any(|prefix| s.starts_with(prefix))
}

/// Rejects tokens carrying control characters or decoding garbage, which
/// come from binary bodies rather than real links.
pub fn is_printable_text(s: &str) -> bool {
    !s.chars().any(|c| c.is_control() || c == '\u{FFFD}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://example.com"));
        assert!(has_scheme("git+ssh://host/repo"));
        assert!(!has_scheme("//cdn.example.com"));
        assert!(!has_scheme("/path://x"));
        assert!(!has_scheme("mailto:me@example.com"));
    }

    #[test]
    fn test_is_valid_domain() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("a-b.example.co.uk"));
        assert!(!is_valid_domain("localhost"));
        assert!(!is_valid_domain("127.0.0.1"));
        assert!(!is_valid_domain("-bad.com"));
        assert!(!is_valid_domain("/about.html"));
        assert!(!is_valid_domain("example..com"));
    }

    #[test]
    fn test_has_file_extension() {
        assert!(has_file_extension("/js/app.min.js"));
        assert!(has_file_extension("report.pdf?download=1"));
        assert!(!has_file_extension("/docs/"));
        assert!(!has_file_extension("/.hidden"));
        assert!(!has_file_extension("/v1.2/users"));
    }

    #[test]
    fn test_media_and_printable() {
        assert!(is_media_type("image/png"));
        assert!(is_media_type("application/json"));
        assert!(!is_media_type("/images/logo.png"));
        assert!(is_printable_text("/a/b?c=d"));
        assert!(!is_printable_text("/a\u{0}b"));
        assert!(!is_printable_text("\u{FFFD}\u{FFFD}"));
    }
}
