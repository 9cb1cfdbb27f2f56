//! Page fetching with charset auto-detection.
//!
//! Thin wrapper over reqwest. A non-200 response is still returned with
//! its body (callers are allowed to run extraction on error pages);
//! only network-level failures surface as [`FetchError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Fixed per-request timeout for detail fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport-level fetch failure.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out for {url}")]
    Timeout { url: String },
    #[error("request failed for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A fetched page: HTTP status plus the decoded body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub html: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over page retrieval so the pipeline can be exercised
/// without a network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<FetchedPage, FetchError>;
}

/// Real HTTP fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the fixed detail-extraction timeout.
    pub fn new() -> Self {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    /// Create a fetcher with an explicit timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(build_header_map(headers))
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(url, e))?;

        debug!(url, status, bytes = body.len(), "fetched page");
        Ok(FetchedPage {
            status,
            html: decode_body(&body),
        })
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: e,
        }
    }
}

/// Build a reqwest header map, silently dropping entries the HTTP layer
/// cannot represent (the sanitizer has already removed the obvious ones).
fn build_header_map(headers: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            map.insert(name, value);
        }
    }
    map
}

/// Decode body bytes by sniffing the content.
///
/// Declared charsets are ignored on purpose: the sites this tool targets
/// routinely mislabel their encoding.
fn decode_body(body: &[u8]) -> String {
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_body("héllo <b>world</b>".as_bytes()), "héllo <b>world</b>");
    }

    #[test]
    fn test_decode_gbk_despite_no_label() {
        // "新闻" encoded as GBK
        let gbk: &[u8] = &[0xD0, 0xC2, 0xCE, 0xC5];
        let mut body = b"<html><body>".to_vec();
        body.extend_from_slice(gbk);
        body.extend_from_slice(b"</body></html>");
        let decoded = decode_body(&body);
        assert!(decoded.contains("新闻"), "got: {}", decoded);
    }

    #[test]
    fn test_build_header_map_skips_invalid() {
        let map = build_header_map(&[
            ("User-Agent".to_string(), "test".to_string()),
            ("Bad Name".to_string(), "x".to_string()),
            ("X-Ok".to_string(), "y".to_string()),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("user-agent").unwrap(), "test");
    }

    #[test]
    fn test_status_classification() {
        let page = FetchedPage {
            status: 404,
            html: "<html>not found</html>".to_string(),
        };
        assert!(!page.is_success());
        // The body is still there for the caller to extract from.
        assert!(!page.html.is_empty());
    }
}
