//! # Document Fetcher Module
//!
//! This module retrieves the raw bytes behind a candidate URL and classifies
//! what kind of document came back. It is the first stage of acquisition and
//! deliberately does nothing else: no retries, no parsing, no caching.
//!
//! ## Key Components
//!
//! - `Fetch`: the seam the acquisition layer depends on
//! - `HttpFetcher`: `reqwest`-backed implementation with a browser-like header set
//! - `FetchConfig`: timeout, redirect limit and header configuration
//! - `FetchError`: closed failure taxonomy with user-facing messages
//! - `ContentKind`: HTML vs PDF, decided from the `Content-Type` header or a
//!   `.pdf` path suffix, never by sniffing bytes
//!
//! ## Failure Classification
//!
//! Malformed URLs fail before any network traffic. Transport failures are
//! classified as timeouts, redirect loops, HTTP status errors (with distinct
//! messages for 403, 404, 429 and 503), connection errors, or unexpected.

mod config;
mod error;
mod http;

pub use config::{FetchConfig, FetchConfigBuilder};
pub use error::FetchError;
pub use http::{HttpFetcher, validate_url};

use serde::{Deserialize, Serialize};
use std::future::Future;

/// The kind of document a URL resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    Pdf,
    /// The fetch failed before the kind could be determined
    Unknown,
}

impl ContentKind {
    /// Detect the kind from a response's content type and its URL
    ///
    /// A content type mentioning `pdf` or a URL path ending in `.pdf` selects
    /// PDF; everything else is treated as HTML.
    pub fn detect(content_type: Option<&str>, url: &str) -> Self {
        let header_says_pdf = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("pdf"))
            .unwrap_or(false);

        let path_says_pdf = url::Url::parse(url)
            .map(|u| u.path().to_ascii_lowercase().ends_with(".pdf"))
            .unwrap_or_else(|_| url.to_ascii_lowercase().ends_with(".pdf"));

        if header_says_pdf || path_says_pdf {
            ContentKind::Pdf
        } else {
            ContentKind::Html
        }
    }
}

/// A successfully fetched document
#[derive(Debug, Clone)]
pub struct Fetched {
    /// The URL that was requested
    pub url: String,

    /// The response body: raw bytes for PDF, UTF-8 text for HTML
    pub content: Vec<u8>,

    /// The detected document kind
    pub kind: ContentKind,
}

/// Retrieve a document for a URL
///
/// Implementations perform at most one request per call.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Fetched, FetchError>> + Send;
}
