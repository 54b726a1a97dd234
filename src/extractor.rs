//! # Text Extraction Module
//!
//! Turns fetched documents into plain, whitespace-normalized text.
//!
//! ## Key Components
//!
//! - `extract_html`: readability-style main-content extraction using `scraper`
//! - `extract_pdf`: page-by-page PDF text extraction; a page that fails to
//!   parse contributes nothing instead of aborting the document
//! - `normalize_text`: whitespace collapsing and the lossy length cap shared
//!   by both paths
//! - `ExtractionError`: typed failures with user-facing explanations
//!
//! Output length is capped by a hard character cut. The cut is not
//! sentence-aware, so the tail of a long document is silently lost.

mod error;
mod html;
mod normalize;
mod pdf;

pub use error::ExtractionError;
pub use html::{EXCLUDED_ELEMENTS, extract_html};
pub use normalize::{normalize_text, truncate_chars};
pub use pdf::{assemble_pages, extract_pdf};

#[cfg(test)]
pub(crate) use pdf::sample_pdf;

use crate::fetcher::{ContentKind, Fetched};

/// Extract text from a fetched document according to its kind
///
/// Unknown content is treated as HTML. HTML content is expected to be UTF-8
/// already; invalid sequences are replaced rather than rejected.
pub fn extract(fetched: &Fetched, max_len: usize) -> Result<String, ExtractionError> {
    match fetched.kind {
        ContentKind::Pdf => extract_pdf(&fetched.content, max_len),
        ContentKind::Html | ContentKind::Unknown => {
            let html = String::from_utf8_lossy(&fetched.content);
            extract_html(&html, &fetched.url, max_len)
        }
    }
}
