//! # Pipeline Configuration Module
//!
//! Configuration for chunking, condensation and acquisition, with a builder
//! in the same style as the fetcher configuration. All sizes are measured in
//! characters, not bytes or tokens.
//!
//! ## Key Components
//!
//! - `ChunkOptions`: chunk size and overlap for the splitter
//! - `PipelineConfig`: every knob the pipeline accepts
//! - `PipelineConfigBuilder`: fluent construction
//!
//! The condensation budget and retry count are plain configuration; nothing
//! derives them from the model's context size.

use std::time::Duration;

use crate::processor::error::ProcessError;

/// Configuration for splitting text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Maximum size of each chunk in characters
    pub chunk_size: usize,

    /// Characters repeated from the end of the previous chunk
    pub overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: 6000,
            overlap: 300,
        }
    }
}

impl ChunkOptions {
    /// Reject sizes the splitter cannot honour
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.chunk_size == 0 {
            return Err(ProcessError::Config("chunk size must be positive".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(ProcessError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Configuration for the whole pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Options for chunking source text
    pub chunk_options: ChunkOptions,

    /// Combined summary size at which condensation stops
    pub condensation_budget: usize,

    /// Upper bound on condensation rounds
    pub max_condensation_rounds: usize,

    /// Timeout applied to every completion call
    pub per_request_timeout: Duration,

    /// Extra acquisition attempts after the first failure
    pub retry_count: u32,

    /// Delay before each acquisition retry
    pub retry_delay: Duration,

    /// Cap on extracted text per URL
    pub max_extracted_text_length: usize,

    /// Maximum concurrent fetches or completion calls
    pub concurrency: usize,

    /// Sampling temperature for all completion calls
    pub temperature: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_options: ChunkOptions::default(),
            condensation_budget: 6000,
            max_condensation_rounds: 3,
            per_request_timeout: Duration::from_secs(60),
            retry_count: 1,
            retry_delay: Duration::from_secs(1),
            max_extracted_text_length: 20_000,
            concurrency: 5,
            temperature: 0.2,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Check every invariant the pipeline relies on
    pub fn validate(&self) -> Result<(), ProcessError> {
        self.chunk_options.validate()?;
        if self.condensation_budget == 0 {
            return Err(ProcessError::Config(
                "condensation budget must be positive".to_string(),
            ));
        }
        if self.max_extracted_text_length == 0 {
            return Err(ProcessError::Config(
                "max extracted text length must be positive".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ProcessError::Config("concurrency must be positive".to_string()));
        }
        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    pub fn chunk_options(mut self, chunk_options: ChunkOptions) -> Self {
        self.config.chunk_options = chunk_options;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_options.chunk_size = chunk_size;
        self
    }

    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_options.overlap = overlap;
        self
    }

    pub fn condensation_budget(mut self, budget: usize) -> Self {
        self.config.condensation_budget = budget;
        self
    }

    pub fn max_condensation_rounds(mut self, rounds: usize) -> Self {
        self.config.max_condensation_rounds = rounds;
        self
    }

    pub fn per_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.per_request_timeout = timeout;
        self
    }

    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.config.retry_count = retry_count;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.config.retry_delay = retry_delay;
        self
    }

    pub fn max_extracted_text_length(mut self, max_len: usize) -> Self {
        self.config.max_extracted_text_length = max_len;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Build the configuration without validating it
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
