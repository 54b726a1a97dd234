//! # Map-Reduce Summarizer
//!
//! Drives the summarization state machine:
//!
//! ```text
//! Collecting -> Chunking -> Mapping -> Checking -> (Condensing -> Checking)* -> Synthesizing -> Done
//! ```
//!
//! with `Failed` reachable from any state. Chunk failures in a round are
//! contained; only an empty mapping result or a failed synthesis ends the
//! run. Condensation is bounded by `max_condensation_rounds` and stops
//! early when a round does not shrink its input, so the loop terminates no
//! matter how the model behaves.

use futures::future;
use serde::Serialize;
use std::future::Future;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::acquisition::{AcquisitionResult, StatusMap};
use crate::model::CompletionService;
use crate::processor::chunking::{Chunk, split_text};
use crate::processor::config::{ChunkOptions, PipelineConfig};
use crate::processor::error::ProcessError;
use crate::processor::llm_integration::{condense_text, summarize_chunk, synthesize_report};
use crate::processor::report::Report;

/// Separator placed between source texts and between summaries
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// States of the summarizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Collecting,
    Chunking,
    Mapping,
    Checking,
    Condensing,
    Synthesizing,
    Done,
    Failed,
}

/// Result of summarizing one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSummary {
    /// Index of the chunk this summary came from
    pub source_chunk_index: usize,

    /// The summary text, or why the chunk failed
    pub outcome: Result<String, ProcessError>,
}

impl PartialSummary {
    pub fn failed(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn text(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }
}

/// Trace record of one condensation round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CondensationRound {
    pub round_number: usize,
    pub input_length: usize,
    pub output_length: usize,
    pub chunks: usize,
    pub failed_chunks: usize,
}

/// Everything the summarizer did during one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunTrace {
    /// Every state entered, in order
    pub stages: Vec<Stage>,

    /// Condensation rounds, in order
    pub rounds: Vec<CondensationRound>,

    /// Chunks sent to the mapping round
    pub chunks_attempted: usize,

    /// Mapping chunks that produced no summary
    pub chunks_failed: usize,
}

impl RunTrace {
    fn enter(&mut self, stage: Stage) {
        debug!(?stage, "Entering stage");
        self.stages.push(stage);
    }

    /// The state the run ended in
    pub fn last_stage(&self) -> Option<Stage> {
        self.stages.last().copied()
    }
}

/// A finished run
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub report: Report,
    pub trace: RunTrace,
}

/// A failed run; no report is ever produced alongside it
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct SummaryFailure {
    pub error: ProcessError,
    pub trace: RunTrace,
}

/// Summarize acquired sources into a validated report
///
/// # Arguments
///
/// * `service` - The completion service
/// * `config` - Pipeline configuration
/// * `query` - Research query, used only as synthesis prompt context
/// * `sources` - Acquisition results in URL list order
/// * `statuses` - Status map of the same URLs
///
/// # Returns
///
/// The report with its links reconciled against `statuses`, or the error
/// that ended the run; both carry the trace
#[instrument(skip_all, fields(sources = sources.len()))]
pub async fn summarize<S: CompletionService>(
    service: &S,
    config: &PipelineConfig,
    query: &str,
    sources: &[AcquisitionResult],
    statuses: &StatusMap,
) -> Result<Summary, SummaryFailure> {
    let mut trace = RunTrace::default();

    match run(service, config, query, sources, statuses, &mut trace).await {
        Ok(report) => {
            trace.enter(Stage::Done);
            info!(
                "Report ready after {} condensation rounds ({} of {} chunks failed)",
                trace.rounds.len(),
                trace.chunks_failed,
                trace.chunks_attempted
            );
            Ok(Summary { report, trace })
        }
        Err(error) => {
            warn!(error = %error, "Summarization failed");
            trace.enter(Stage::Failed);
            Err(SummaryFailure { error, trace })
        }
    }
}

async fn run<S: CompletionService>(
    service: &S,
    config: &PipelineConfig,
    query: &str,
    sources: &[AcquisitionResult],
    statuses: &StatusMap,
    trace: &mut RunTrace,
) -> Result<Report, ProcessError> {
    config.validate()?;

    trace.enter(Stage::Collecting);
    let collected = collect_sources(sources);

    trace.enter(Stage::Chunking);
    let chunks = split_text(&collected, &config.chunk_options)?;
    if chunks.is_empty() {
        return Err(ProcessError::AllChunksFailed { attempted: 0 });
    }

    trace.enter(Stage::Mapping);
    let partials = map_chunks(service, config, &chunks).await;
    trace.chunks_attempted = partials.len();
    trace.chunks_failed = partials.iter().filter(|p| p.failed()).count();

    let summaries: Vec<&str> = partials.iter().filter_map(PartialSummary::text).collect();
    if summaries.is_empty() {
        return Err(ProcessError::AllChunksFailed {
            attempted: partials.len(),
        });
    }
    let mut combined = summaries.join(PARAGRAPH_SEPARATOR);
    let mut stalled = false;

    loop {
        trace.enter(Stage::Checking);
        let length = combined.chars().count();
        if length <= config.condensation_budget {
            debug!("Combined summary of {} chars is within budget", length);
            break;
        }
        if stalled {
            warn!("Condensation stopped shrinking at {} chars; synthesizing best effort", length);
            break;
        }
        if trace.rounds.len() >= config.max_condensation_rounds {
            warn!(
                "Condensation cap of {} rounds reached at {} chars; synthesizing best effort",
                config.max_condensation_rounds, length
            );
            break;
        }

        trace.enter(Stage::Condensing);
        let round_number = trace.rounds.len() + 1;
        let (condensed, round) = condense_round(service, config, &combined, round_number).await?;
        stalled = round.output_length >= round.input_length;
        if !stalled {
            combined = condensed;
        }
        trace.rounds.push(round);
    }

    trace.enter(Stage::Synthesizing);
    let mut report = synthesize_report(service, query, &combined, statuses, config).await?;
    report.reconcile_links(statuses);
    Ok(report)
}

/// Join successful source texts in input order
pub fn collect_sources(sources: &[AcquisitionResult]) -> String {
    sources
        .iter()
        .filter_map(AcquisitionResult::text)
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}

/// Summarize every chunk independently, returning results in chunk order
#[instrument(skip_all, fields(chunks = chunks.len()))]
pub async fn map_chunks<S: CompletionService>(
    service: &S,
    config: &PipelineConfig,
    chunks: &[Chunk],
) -> Vec<PartialSummary> {
    let tasks = chunks.iter().map(|chunk| async move {
        let outcome = summarize_chunk(service, &chunk.text, config).await;
        if let Err(e) = &outcome {
            warn!(chunk = chunk.index, error = %e, "Chunk summarization failed");
        }
        PartialSummary {
            source_chunk_index: chunk.index,
            outcome,
        }
    });

    run_bounded(config.concurrency, tasks).await
}

/// Condense an oversized text once
///
/// The text is re-chunked without overlap so a round never inflates it. A
/// chunk whose call fails keeps its input text.
#[instrument(skip(service, config, text), fields(text_len = text.len()))]
async fn condense_round<S: CompletionService>(
    service: &S,
    config: &PipelineConfig,
    text: &str,
    round_number: usize,
) -> Result<(String, CondensationRound), ProcessError> {
    let options = ChunkOptions {
        chunk_size: config.chunk_options.chunk_size,
        overlap: 0,
    };
    let chunks = split_text(text, &options)?;

    let tasks = chunks.iter().map(|chunk| async move {
        match condense_text(service, &chunk.text, config).await {
            Ok(condensed) => (condensed, false),
            Err(e) => {
                warn!(chunk = chunk.index, error = %e, "Condensation failed; keeping input");
                (chunk.text.trim().to_string(), true)
            }
        }
    });
    let results = run_bounded(config.concurrency, tasks).await;

    let failed_chunks = results.iter().filter(|(_, failed)| *failed).count();
    let condensed = results
        .into_iter()
        .map(|(text, _)| text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR);

    let round = CondensationRound {
        round_number,
        input_length: text.chars().count(),
        output_length: condensed.chars().count(),
        chunks: chunks.len(),
        failed_chunks,
    };
    info!(
        "Condensation round {}: {} -> {} chars",
        round.round_number, round.input_length, round.output_length
    );
    Ok((condensed, round))
}

/// Await every task with at most `limit` running at once, keeping input order
async fn run_bounded<T, Fut>(limit: usize, tasks: impl IntoIterator<Item = Fut>) -> Vec<T>
where
    Fut: Future<Output = T>,
{
    let semaphore = Semaphore::new(limit.max(1));
    let semaphore = &semaphore;

    future::join_all(tasks.into_iter().map(|task| async move {
        let _permit = semaphore.acquire().await;
        task.await
    }))
    .await
}
