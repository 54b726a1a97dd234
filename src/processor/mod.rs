//! Content processor module
//!
//! This module turns acquired text into a report: overlap chunking, the
//! bounded map-reduce summarizer, and the structured completion prompts it
//! relies on.

mod chunking;
mod config;
mod error;
mod llm_integration;
mod report;
mod summarizer;

pub use chunking::{Chunk, SEPARATORS, reassemble, split_text};
pub use config::{ChunkOptions, PipelineConfig, PipelineConfigBuilder};
pub use error::ProcessError;
pub use llm_integration::{
    complete_with_timeout, condense_text, format_instructions, parse_structured, summarize_chunk,
    synthesize_report,
};
pub use report::{ACCESSED, ChunkDigest, Report};
pub use summarizer::{
    CondensationRound, PARAGRAPH_SEPARATOR, PartialSummary, RunTrace, Stage, Summary,
    SummaryFailure, collect_sources, map_chunks, summarize,
};

