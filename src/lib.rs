//! # Synopsis - Multi-source Report Generation for Rust
//!
//! This crate fetches web documents, extracts their readable text and
//! condenses everything into one structured report with a bounded
//! map-reduce summarization loop over a language model.
//!
//! ## Features
//!
//! - HTML main-content extraction and page-by-page PDF extraction
//! - Per-URL retry with classified, human-readable failures
//! - Overlapping chunking along paragraph, sentence and word boundaries
//! - Map-reduce summarization with a hard cap on condensation rounds
//! - Structured report synthesis validated against a JSON Schema
//! - Rate-limited Gemini access through `rig`
//! - Async API with Tokio
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::num::NonZeroU32;
//! use synopsis::fetcher::{FetchConfig, HttpFetcher};
//! use synopsis::model::{Client, DEFAULT_MODEL};
//! use synopsis::pipeline::ReportPipeline;
//! use synopsis::processor::PipelineConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = HttpFetcher::new(FetchConfig::default())?;
//!     let client = Client::new_gemini("your-api-key", DEFAULT_MODEL, NonZeroU32::new(15).unwrap());
//!     let pipeline = ReportPipeline::new(fetcher, client, PipelineConfig::default())?;
//!
//!     let urls = vec!["https://www.rust-lang.org/".to_string()];
//!     let run = pipeline.run("What is Rust?", &urls).await?;
//!
//!     println!("{}", run.report.title);
//!     for (url, status) in &run.statuses {
//!         println!("{}: {}", url, status);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
pub mod markdown;
pub mod model;

pub mod acquisition;
pub mod extractor;
pub mod fetcher;
pub mod pipeline;
pub mod processor;
pub mod storage;

pub use error::{Error, ErrorKind, Result};

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::acquisition::{AcquisitionResult, LinkStatus, SearchHit, StatusMap};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::pipeline::{PipelineFailure, ReportPipeline, ReportRun};
    pub use crate::processor::{PipelineConfig, Report};
}
