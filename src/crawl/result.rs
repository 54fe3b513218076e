// src/crawl/result.rs
// =============================================================================
// What the crawl reports back: one record per fetch attempt or redirect hop.
// =============================================================================

use serde::{Serialize, Serializer};

use crate::error::CrawlError;

#[derive(Debug, Serialize)]
pub struct CrawlResult {
    /// The URL that was requested (canonical form)
    pub url: String,
    /// HTTP status code, or 0 when the request itself failed
    pub status: u16,
    /// Transport failure, if any
    #[serde(serialize_with = "error_message")]
    pub error: Option<CrawlError>,
}

impl CrawlResult {
    pub fn response(url: &url::Url, status: u16) -> Self {
        Self {
            url: url.to_string(),
            status,
            error: None,
        }
    }

    pub fn failure(url: &url::Url, error: CrawlError) -> Self {
        Self {
            url: url.to_string(),
            status: 0,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

fn error_message<S: Serializer>(error: &Option<CrawlError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let url = url::Url::parse("http://example.com/a").unwrap();
        let ok = serde_json::to_value(CrawlResult::response(&url, 200)).unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"url": "http://example.com/a", "status": 200, "error": null})
        );

        let failed = CrawlResult::failure(
            &url,
            CrawlError::HeaderTimeout {
                url: url.to_string(),
                seconds: 3,
            },
        );
        assert!(failed.is_error());
        let value = serde_json::to_value(failed).unwrap();
        assert_eq!(value["status"], 0);
        assert_eq!(
            value["error"],
            "no response headers from http://example.com/a within 3s"
        );
    }
}
