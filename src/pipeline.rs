//! # Report Pipeline
//!
//! Wires acquisition and summarization together behind one call. The
//! fetcher, completion service and configuration are injected once at
//! construction; a run either returns a complete, validated report with the
//! status map, or a failure that still carries the status map. No partial
//! report is ever returned.
//!
//! Dropping the future returned by [`ReportPipeline::run`] cancels every
//! in-flight fetch and completion call, since nothing is spawned.

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::acquisition::{AcquisitionResult, LinkStatus, StatusMap, acquire_all, dedupe_urls, status_map};
use crate::error::Error;
use crate::fetcher::Fetch;
use crate::model::CompletionService;
use crate::processor::{PipelineConfig, ProcessError, Report, RunTrace, summarize};

/// A successful run
#[derive(Debug, Clone)]
pub struct ReportRun {
    /// The validated report
    pub report: Report,

    /// Access status of every requested URL
    pub statuses: StatusMap,

    /// Per-URL acquisition results in request order
    pub acquisitions: Vec<AcquisitionResult>,

    /// Summarizer trace
    pub trace: RunTrace,
}

impl ReportRun {
    /// URLs that could not be read, with their status
    pub fn failures(&self) -> impl Iterator<Item = (&String, &LinkStatus)> {
        self.statuses
            .iter()
            .filter(|(_, status)| !status.is_accessed())
    }
}

/// A failed run; the status map is still available to the caller
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    pub error: ProcessError,
    pub statuses: StatusMap,
    pub trace: RunTrace,
}

impl From<PipelineFailure> for Error {
    fn from(failure: PipelineFailure) -> Self {
        Error::Process(failure.error)
    }
}

/// Acquisition followed by map-reduce summarization
#[derive(Debug, Clone)]
pub struct ReportPipeline<F, S> {
    fetcher: F,
    service: S,
    config: PipelineConfig,
}

impl<F, S> ReportPipeline<F, S>
where
    F: Fetch,
    S: CompletionService,
{
    /// Create a pipeline, rejecting invalid configuration up front
    pub fn new(fetcher: F, service: S, config: PipelineConfig) -> Result<Self, ProcessError> {
        config.validate()?;
        Ok(Self {
            fetcher,
            service,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Acquire URLs without summarizing
    pub async fn acquire(&self, urls: &[String]) -> Vec<AcquisitionResult> {
        acquire_all(&self.fetcher, &dedupe_urls(urls), &self.config).await
    }

    /// Run the whole pipeline
    ///
    /// # Arguments
    ///
    /// * `query` - The research query; prompt context only
    /// * `urls` - Candidate URLs; duplicates are dropped
    #[instrument(skip(self, urls), fields(urls = urls.len()))]
    pub async fn run(&self, query: &str, urls: &[String]) -> Result<ReportRun, PipelineFailure> {
        let acquisitions = self.acquire(urls).await;
        let statuses = status_map(&acquisitions);

        for (url, status) in statuses.iter().filter(|(_, s)| !s.is_accessed()) {
            warn!("{} was not accessed: {}", url, status);
        }

        match summarize(&self.service, &self.config, query, &acquisitions, &statuses).await {
            Ok(summary) => {
                info!("Report \"{}\" generated", summary.report.title);
                Ok(ReportRun {
                    report: summary.report,
                    statuses,
                    acquisitions,
                    trace: summary.trace,
                })
            }
            Err(failure) => Err(PipelineFailure {
                error: failure.error,
                statuses,
                trace: failure.trace,
            }),
        }
    }
}
