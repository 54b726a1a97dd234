//! Error types for the processor module

use crate::error::ErrorKind;
use crate::model::LlmError;
use thiserror::Error;

/// Error type for chunking, summarization and synthesis
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProcessError {
    /// Configuration violates an invariant
    #[error("Configuration error: {0}")]
    Config(String),

    /// No chunk produced a usable summary
    #[error("All {attempted} chunks failed to summarize; no usable source text remained")]
    AllChunksFailed {
        /// Chunks that were attempted (zero when no source text survived acquisition)
        attempted: usize,
    },

    /// A structured completion did not match its schema
    #[error("Malformed completion: {0}")]
    MalformedCompletion(String),

    /// A completion call failed or timed out
    #[error("{0}")]
    Llm(#[from] LlmError),
}

impl ProcessError {
    /// The taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::Config(_) => ErrorKind::ConfigError,
            ProcessError::AllChunksFailed { .. } => ErrorKind::AllChunksFailed,
            ProcessError::MalformedCompletion(_) => ErrorKind::MalformedCompletion,
            ProcessError::Llm(LlmError::Timeout(_)) => ErrorKind::Timeout,
            ProcessError::Llm(LlmError::Completion(_)) => ErrorKind::Unexpected,
        }
    }
}
