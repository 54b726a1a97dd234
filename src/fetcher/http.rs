//! HTTP implementation of the fetcher

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, redirect};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::fetcher::{ContentKind, Fetch, FetchConfig, FetchError, Fetched};

/// Check that a URL has both a scheme and a host
///
/// # Arguments
///
/// * `url` - The URL to validate
///
/// # Returns
///
/// The parsed URL, or `FetchError::InvalidUrl`
pub fn validate_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    if parsed.scheme().is_empty() || parsed.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::InvalidUrl(url.to_string()));
    }
    Ok(parsed)
}

/// Fetches documents over HTTP with redirect following and a hard timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a fetcher from configuration
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&config.accept)
                .map_err(|e| FetchError::Unexpected(format!("invalid Accept header: {}", e)))?,
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).map_err(|e| {
                FetchError::Unexpected(format!("invalid Accept-Language header: {}", e))
            })?,
        );

        let client = ReqwestClient::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Unexpected(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// The configuration this fetcher was built with
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

impl Fetch for HttpFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        let parsed = validate_url(url)?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(FetchError::from)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Request for {} was rejected", url);
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let kind = ContentKind::detect(content_type.as_deref(), url);

        // HTML is decoded with the charset from Content-Type (UTF-8 by default).
        let content = match kind {
            ContentKind::Pdf => response.bytes().await.map_err(FetchError::from)?.to_vec(),
            ContentKind::Html | ContentKind::Unknown => {
                response.text().await.map_err(FetchError::from)?.into_bytes()
            }
        };
        debug!(?kind, bytes = content.len(), "Fetched {}", url);

        Ok(Fetched {
            url: url.to_string(),
            content,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(
            FetchConfig::builder()
                .timeout(Duration::from_secs(5))
                .max_redirects(3)
                .build(),
        )
        .unwrap()
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/page").is_ok());
        assert!(matches!(
            validate_url("example.com/page"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("mailto:someone@example.com"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(validate_url(""), Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_request() {
        let err = fetcher().fetch("not a url").await.unwrap_err();
        assert_eq!(err, FetchError::InvalidUrl("relative URL without a base".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_html_and_send_browser_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/article")
            .match_header("user-agent", mockito::Matcher::Regex("Mozilla/5.0".to_string()))
            .match_header("accept-language", "en-US,en;q=0.5")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html><body><p>hello</p></body></html>")
            .create_async()
            .await;

        let fetched = fetcher()
            .fetch(&format!("{}/article", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(fetched.kind, ContentKind::Html);
        assert!(String::from_utf8_lossy(&fetched.content).contains("hello"));
    }

    #[tokio::test]
    async fn test_fetch_detects_pdf_by_header() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/download")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let fetched = fetcher()
            .fetch(&format!("{}/download", server.url()))
            .await
            .unwrap();
        assert_eq!(fetched.kind, ContentKind::Pdf);
    }

    #[tokio::test]
    async fn test_html_is_decoded_with_declared_charset() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/latin")
            .with_status(200)
            .with_header("content-type", "text/html; charset=windows-1252")
            .with_body(b"<html><body><p>caf\xe9 cr\xe8me</p></body></html>".as_slice())
            .create_async()
            .await;

        let fetched = fetcher()
            .fetch(&format!("{}/latin", server.url()))
            .await
            .unwrap();

        let html = String::from_utf8(fetched.content).unwrap();
        assert!(html.contains("café crème"), "got {}", html);
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        use std::io::Write;

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/slow")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(1500));
                w.write_all(b"<html><body><p>too late</p></body></html>")
            })
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(
            FetchConfig::builder()
                .timeout(Duration::from_millis(200))
                .build(),
        )
        .unwrap();

        let err = fetcher
            .fetch(&format!("{}/slow", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }

    #[tokio::test]
    async fn test_status_codes_are_classified() {
        let mut server = mockito::Server::new_async().await;
        for code in [403, 404, 429, 503, 500] {
            server
                .mock("GET", format!("/status/{}", code).as_str())
                .with_status(code)
                .create_async()
                .await;
        }

        let fetcher = fetcher();
        for code in [403u16, 404, 429, 503, 500] {
            let err = fetcher
                .fetch(&format!("{}/status/{}", server.url(), code))
                .await
                .unwrap_err();
            assert_eq!(err, FetchError::HttpStatus(code));
        }
    }

    #[tokio::test]
    async fn test_redirect_loop_is_classified() {
        let mut server = mockito::Server::new_async().await;
        let location = format!("{}/loop", server.url());
        server
            .mock("GET", "/loop")
            .with_status(302)
            .with_header("location", &location)
            .expect_at_least(1)
            .create_async()
            .await;

        let err = fetcher().fetch(&location).await.unwrap_err();
        assert_eq!(err, FetchError::TooManyRedirects);
    }

    #[tokio::test]
    async fn test_connection_refused_is_classified() {
        // Port 9 (discard) is closed on test machines.
        let err = fetcher().fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, FetchError::Connection(_)), "got {:?}", err);
    }
}
