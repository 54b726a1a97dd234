//! # Acquisition Module
//!
//! Acquisition is fetch + extract + retry for one URL. It never fails past
//! its boundary: every URL produces exactly one `AcquisitionResult` holding
//! either text or a classified error.
//!
//! ## Behaviour
//!
//! - Any error triggers a retry after a fixed delay, up to `retry_count`
//!   extra attempts. On exhaustion the last attempt's error is returned as-is.
//! - URLs are independent; `acquire_all` runs them concurrently under a
//!   semaphore and returns results in input order, not completion order.
//! - `status_map` turns results into the per-URL status strings reported to
//!   the caller.

use futures::future;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::error::ErrorKind;
use crate::extractor::{ExtractionError, extract};
use crate::fetcher::{ContentKind, Fetch, FetchError};
use crate::processor::PipelineConfig;

/// Why acquiring a URL failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl AcquisitionError {
    /// The taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AcquisitionError::Fetch(e) => e.kind(),
            AcquisitionError::Extraction(e) => e.kind(),
        }
    }
}

/// The outcome of acquiring one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionResult {
    /// The requested URL
    pub url: String,

    /// The detected document kind, `Unknown` if the fetch failed
    pub kind: ContentKind,

    /// Extracted text, or the classified failure of the final attempt
    pub outcome: Result<String, AcquisitionError>,

    /// Number of attempts made
    pub attempts: u32,
}

impl AcquisitionResult {
    pub fn text(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }

    pub fn error(&self) -> Option<&AcquisitionError> {
        self.outcome.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The extracted text, or the failure as a crate error
    pub fn into_text(self) -> crate::Result<String> {
        Ok(self.outcome?)
    }

    /// Status entry for this URL
    pub fn status(&self) -> LinkStatus {
        match &self.outcome {
            Ok(_) => LinkStatus::Accessed,
            Err(e) => LinkStatus::Failed {
                kind: e.kind(),
                reason: e.to_string(),
            },
        }
    }
}

/// Access status of one URL, as shown to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LinkStatus {
    Accessed,
    Failed { kind: ErrorKind, reason: String },
}

impl LinkStatus {
    pub fn is_accessed(&self) -> bool {
        matches!(self, LinkStatus::Accessed)
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkStatus::Accessed => write!(f, "accessed"),
            LinkStatus::Failed { reason, .. } => write!(f, "{}", reason),
        }
    }
}

/// Per-URL status, ordered by URL
pub type StatusMap = BTreeMap<String, LinkStatus>;

/// Build the status map for a set of acquisition results
pub fn status_map(results: &[AcquisitionResult]) -> StatusMap {
    results
        .iter()
        .map(|result| (result.url.clone(), result.status()))
        .collect()
}

async fn acquire_once<F: Fetch>(
    fetcher: &F,
    url: &str,
    max_len: usize,
) -> (ContentKind, Result<String, AcquisitionError>) {
    let fetched = match fetcher.fetch(url).await {
        Ok(fetched) => fetched,
        Err(e) => return (ContentKind::Unknown, Err(e.into())),
    };
    let kind = fetched.kind;
    (kind, extract(&fetched, max_len).map_err(AcquisitionError::from))
}

/// Fetch and extract one URL with the configured retry policy
///
/// # Arguments
///
/// * `fetcher` - The fetcher to use
/// * `url` - The URL to acquire
/// * `config` - Supplies `retry_count`, `retry_delay` and `max_extracted_text_length`
///
/// # Returns
///
/// A well-formed result; errors are carried inside it, never returned
#[instrument(skip(fetcher, config))]
pub async fn acquire<F: Fetch>(fetcher: &F, url: &str, config: &PipelineConfig) -> AcquisitionResult {
    let max_attempts = config.retry_count.saturating_add(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let (kind, outcome) = acquire_once(fetcher, url, config.max_extracted_text_length).await;

        match &outcome {
            Ok(text) => {
                debug!(attempts, chars = text.chars().count(), "Acquired {}", url);
            }
            Err(e) if attempts < max_attempts => {
                warn!(attempt = attempts, error = %e, "Acquisition failed, retrying {}", url);
                tokio::time::sleep(config.retry_delay).await;
                continue;
            }
            Err(e) => {
                warn!(attempts, kind = ?e.kind(), "Giving up on {}: {}", url, e);
            }
        }

        return AcquisitionResult {
            url: url.to_string(),
            kind,
            outcome,
            attempts,
        };
    }
}

/// Acquire every URL concurrently, returning results in input order
#[instrument(skip(fetcher, urls, config), fields(urls = urls.len()))]
pub async fn acquire_all<F: Fetch>(
    fetcher: &F,
    urls: &[String],
    config: &PipelineConfig,
) -> Vec<AcquisitionResult> {
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));

    let tasks = urls.iter().map(|url| {
        let semaphore = semaphore.clone();
        async move {
            // The semaphore is never closed, so acquire only fails if it is.
            let _permit = semaphore.acquire_owned().await.ok();
            acquire(fetcher, url, config).await
        }
    });

    let results = future::join_all(tasks).await;
    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!("Acquired {}/{} URLs", succeeded, results.len());
    results
}

/// A candidate result from the search collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub link: String,

    #[serde(default)]
    pub snippet: String,

    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "google".to_string()
}

/// Read search hits from a JSON array file
pub async fn read_hits(path: impl AsRef<Path>) -> crate::Result<Vec<SearchHit>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Candidate URLs from search hits, in hit order, skipping empty links
pub fn urls_from_hits(hits: &[SearchHit]) -> Vec<String> {
    hits.iter()
        .map(|hit| hit.link.trim())
        .filter(|link| !link.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drop repeated URLs, keeping the first occurrence
pub fn dedupe_urls(urls: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.iter()
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::Fetched;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays a queue of outcomes per URL; the last one repeats forever.
    struct ScriptedFetcher {
        script: Mutex<HashMap<String, Vec<Result<Fetched, FetchError>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(entries: Vec<(&str, Vec<Result<Fetched, FetchError>>)>) -> Self {
            Self {
                script: Mutex::new(
                    entries
                        .into_iter()
                        .map(|(url, outcomes)| (url.to_string(), outcomes))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls_for(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    impl Fetch for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            let mut script = self.script.lock().unwrap();
            let outcomes = script.get_mut(url).expect("unscripted url");
            if outcomes.len() > 1 {
                outcomes.remove(0)
            } else {
                outcomes[0].clone()
            }
        }
    }

    fn html(url: &str, body: &str) -> Result<Fetched, FetchError> {
        Ok(Fetched {
            url: url.to_string(),
            content: format!("<html><body><article><p>{}</p></article></body></html>", body)
                .into_bytes(),
            kind: ContentKind::Html,
        })
    }

    fn config() -> PipelineConfig {
        PipelineConfig::builder()
            .retry_delay(Duration::from_millis(1))
            .build()
    }

    #[tokio::test]
    async fn test_retry_then_succeed() {
        let url = "https://example.com/flaky";
        let fetcher = ScriptedFetcher::new(vec![(
            url,
            vec![
                Err(FetchError::Timeout),
                html(url, "Recovered content on the second attempt."),
            ],
        )]);

        let result = acquire(&fetcher, url, &config()).await;

        assert_eq!(result.text(), Some("Recovered content on the second attempt."));
        assert_eq!(result.kind, ContentKind::Html);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let url = "https://example.com/broken";
        let fetcher = ScriptedFetcher::new(vec![(
            url,
            vec![Err(FetchError::Timeout), Err(FetchError::HttpStatus(503))],
        )]);

        let result = acquire(&fetcher, url, &config()).await;

        assert_eq!(
            result.error(),
            Some(&AcquisitionError::Fetch(FetchError::HttpStatus(503)))
        );
        assert_eq!(result.kind, ContentKind::Unknown);
        assert_eq!(fetcher.calls_for(url), 2);
    }

    #[tokio::test]
    async fn test_retry_count_is_configurable() {
        let url = "https://example.com/down";
        let fetcher = ScriptedFetcher::new(vec![(url, vec![Err(FetchError::HttpStatus(500))])]);

        let no_retry = PipelineConfig::builder().retry_count(0).build();
        acquire(&fetcher, url, &no_retry).await;
        assert_eq!(fetcher.calls_for(url), 1);

        let three = PipelineConfig::builder()
            .retry_count(3)
            .retry_delay(Duration::from_millis(1))
            .build();
        let result = acquire(&fetcher, url, &three).await;
        assert_eq!(result.attempts, 4);
        assert_eq!(fetcher.calls_for(url), 5);
    }

    #[tokio::test]
    async fn test_extraction_failures_are_retried_and_contained() {
        let url = "https://example.com/app";
        let fetcher = ScriptedFetcher::new(vec![(
            url,
            vec![Ok(Fetched {
                url: url.to_string(),
                content: b"<html><body><script>app()</script></body></html>".to_vec(),
                kind: ContentKind::Html,
            })],
        )]);

        let result = acquire(&fetcher, url, &config()).await;

        assert_eq!(result.attempts, 2);
        assert_eq!(result.kind, ContentKind::Html);
        assert_eq!(
            result.error().map(AcquisitionError::kind),
            Some(ErrorKind::NoExtractableContent)
        );
    }

    #[tokio::test]
    async fn test_acquire_all_preserves_input_order() {
        let urls = vec![
            "https://a.example/".to_string(),
            "https://b.example/".to_string(),
            "https://c.example/".to_string(),
        ];
        let fetcher = ScriptedFetcher::new(vec![
            ("https://a.example/", vec![html("https://a.example/", "Alpha page content here.")]),
            ("https://b.example/", vec![Err(FetchError::HttpStatus(404))]),
            ("https://c.example/", vec![html("https://c.example/", "Gamma page content here.")]),
        ]);

        let results = acquire_all(&fetcher, &urls, &config()).await;

        let order: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(order, vec!["https://a.example/", "https://b.example/", "https://c.example/"]);

        let statuses = status_map(&results);
        assert_eq!(statuses["https://a.example/"], LinkStatus::Accessed);
        assert_eq!(
            statuses["https://b.example/"].to_string(),
            "Page not found. The URL might be invalid or the content has been removed."
        );
    }

    #[tokio::test]
    async fn test_acquire_served_pdf() {
        use crate::extractor::sample_pdf;
        use crate::fetcher::{FetchConfig, HttpFetcher};

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/paper")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(sample_pdf(&["Hello first page", "Second page text"]))
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(
            FetchConfig::builder()
                .timeout(Duration::from_secs(5))
                .build(),
        )
        .unwrap();
        let url = format!("{}/paper", server.url());

        let result = acquire(&fetcher, &url, &config()).await;

        mock.assert_async().await;
        assert_eq!(result.kind, ContentKind::Pdf);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.text(), Some("Hello first page Second page text"));
        assert_eq!(result.status(), LinkStatus::Accessed);
    }

    #[tokio::test]
    async fn test_read_hits_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hits.json");
        std::fs::write(&path, r#"[{"title": "One", "link": "https://one.example"}]"#).unwrap();

        let hits = read_hits(&path).await.unwrap();
        assert_eq!(urls_from_hits(&hits), vec!["https://one.example".to_string()]);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(read_hits(&path).await, Err(crate::Error::Json(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(read_hits(&missing).await, Err(crate::Error::Io(_))));
    }

    #[tokio::test]
    async fn test_into_text_maps_failures_to_crate_errors() {
        let url = "https://example.com/gone";
        let fetcher = ScriptedFetcher::new(vec![(url, vec![Err(FetchError::HttpStatus(404))])]);
        let no_retry = PipelineConfig::builder().retry_count(0).build();

        let err = acquire(&fetcher, url, &no_retry).await.into_text().unwrap_err();
        assert!(matches!(err, crate::Error::Fetch(FetchError::HttpStatus(404))));

        let ok = acquire(
            &ScriptedFetcher::new(vec![(url, vec![html(url, "Still here after all.")])]),
            url,
            &no_retry,
        )
        .await;
        assert_eq!(ok.into_text().unwrap(), "Still here after all.");
    }

    #[test]
    fn test_urls_from_hits_and_dedupe() {
        let hits: Vec<SearchHit> = serde_json::from_str(
            r#"[
                {"title": "One", "link": "https://one.example", "snippet": "first"},
                {"title": "Empty", "link": "  "},
                {"title": "Two", "link": "https://two.example", "source": "bing"},
                {"title": "One again", "link": "https://one.example"}
            ]"#,
        )
        .unwrap();

        assert_eq!(hits[0].source, "google");
        let urls = urls_from_hits(&hits);
        assert_eq!(urls.len(), 3);
        assert_eq!(
            dedupe_urls(&urls),
            vec!["https://one.example".to_string(), "https://two.example".to_string()]
        );
    }

    #[test]
    fn test_status_serializes_as_tagged_json() {
        let failed = LinkStatus::Failed {
            kind: ErrorKind::HttpStatus(403),
            reason: "Access forbidden. The website has blocked our request.".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"]["code"], 403);
        assert_eq!(serde_json::to_value(LinkStatus::Accessed).unwrap()["status"], "accessed");
    }
}
