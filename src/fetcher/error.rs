//! Error types for the fetcher module

use crate::error::ErrorKind;
use thiserror::Error;

/// Error type for fetch operations
///
/// The display strings are user-facing: they end up verbatim in the
/// per-URL status map of a report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// URL lacks a scheme or host
    #[error("Invalid URL format")]
    InvalidUrl(String),

    /// The request exceeded its timeout
    #[error("Request timed out. The website took too long to respond.")]
    Timeout,

    /// The redirect limit was exceeded
    #[error("Too many redirects. The website might be trying to prevent automated access.")]
    TooManyRedirects,

    /// The server answered with a non-success status
    #[error("{}", status_message(*.0))]
    HttpStatus(u16),

    /// DNS, TCP, TLS or body transfer failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Anything else
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

fn status_message(code: u16) -> String {
    match code {
        403 => "Access forbidden. The website has blocked our request.".to_string(),
        404 => "Page not found. The URL might be invalid or the content has been removed."
            .to_string(),
        429 => "Too many requests. The website has rate-limited our access.".to_string(),
        503 => "Service unavailable. The website might be temporarily down or blocking automated access."
            .to_string(),
        _ => format!("HTTP error {}: The website returned an error.", code),
    }
}

impl FetchError {
    /// The taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            FetchError::Timeout => ErrorKind::Timeout,
            FetchError::TooManyRedirects => ErrorKind::TooManyRedirects,
            FetchError::HttpStatus(code) => ErrorKind::HttpStatus(*code),
            FetchError::Connection(_) => ErrorKind::ConnectionError,
            FetchError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_redirect() {
            FetchError::TooManyRedirects
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            FetchError::Connection(err.to_string())
        } else {
            FetchError::Unexpected(err.to_string())
        }
    }
}
