//! Error types for the extractor module

use crate::error::ErrorKind;
use thiserror::Error;

/// Error type for text extraction
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// Readability pass recovered nothing from an HTML page
    #[error(
        "No content could be extracted. This might be due to:\n- Website blocking content extraction\n- JavaScript-heavy website\n- Empty or non-text content"
    )]
    NoExtractableContent,

    /// The PDF has zero pages
    #[error("PDF appears to be empty")]
    EmptyDocument,

    /// Every PDF page yielded empty text
    #[error("PDF contains no extractable text. It might be scanned images or protected.")]
    NoExtractableText,

    /// The PDF could not be parsed at all
    #[error("PDF extraction error: {0}")]
    Pdf(String),
}

impl ExtractionError {
    /// The taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::NoExtractableContent => ErrorKind::NoExtractableContent,
            ExtractionError::EmptyDocument => ErrorKind::EmptyDocument,
            ExtractionError::NoExtractableText => ErrorKind::NoExtractableText,
            ExtractionError::Pdf(_) => ErrorKind::Unexpected,
        }
    }
}
