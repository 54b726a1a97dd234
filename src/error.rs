//! Error types for the synopsis crate

use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::extractor::ExtractionError;
use crate::fetcher::FetchError;
use crate::processor::ProcessError;
use crate::storage::StorageError;

/// Result type for synopsis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for synopsis operations
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching a document failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Extracting text from a fetched document failed
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Chunking, summarization or synthesis failed
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Report storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File or terminal I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AcquisitionError> for Error {
    fn from(err: AcquisitionError) -> Self {
        match err {
            AcquisitionError::Fetch(e) => Error::Fetch(e),
            AcquisitionError::Extraction(e) => Error::Extraction(e),
        }
    }
}

/// Closed taxonomy of failure classes surfaced to callers.
///
/// Every module error maps onto exactly one kind, so callers can match
/// exhaustively instead of parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "code")]
pub enum ErrorKind {
    InvalidUrl,
    Timeout,
    TooManyRedirects,
    HttpStatus(u16),
    ConnectionError,
    NoExtractableContent,
    EmptyDocument,
    NoExtractableText,
    ConfigError,
    AllChunksFailed,
    MalformedCompletion,
    Unexpected,
}

impl Error {
    /// The taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Fetch(e) => e.kind(),
            Error::Extraction(e) => e.kind(),
            Error::Process(e) => e.kind(),
            Error::Storage(_) | Error::Json(_) | Error::Io(_) => ErrorKind::Unexpected,
        }
    }
}
