//! LLM integration functionality for the processor module
//!
//! Three prompt shapes are used: a structured per-chunk summary, a plain
//! condensation prompt, and the structured final report. Structured calls
//! embed a JSON Schema of the target type and are parsed with `serde_json`.

use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, trace};

use crate::acquisition::StatusMap;
use crate::model::{CompletionCall, CompletionService, LlmError};
use crate::processor::PipelineConfig;
use crate::processor::error::ProcessError;
use crate::processor::report::{ChunkDigest, Report};

pub(crate) const CHUNK_PREAMBLE: &str = "You are an expert research assistant. Summarize the provided \
text faithfully. Keep every concrete fact, figure and name that matters. Do not add \
information that is not in the text.";

pub(crate) const CONDENSE_PREAMBLE: &str = "Compress the following text without adding information. \
Return only the compressed text.";

pub(crate) const REPORT_PREAMBLE: &str = "You are an expert in report generation. Generate a concise and \
informative report based on the provided researched data. The report may include bullet \
points where they help. Ensure clarity and coherence in the summary. The detailed summary \
should be between 500 and 800 words.";

/// Format instructions for a structured completion of `T`
pub fn format_instructions<T: JsonSchema>() -> String {
    let schema = schema_for!(T);
    let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_default();
    format!(
        "The output must be a single JSON object that conforms to the JSON schema below.\n\
         ```json\n{}\n```\n\
         Return only the JSON object, without any other text.",
        schema_json
    )
}

/// Parse a structured completion, tolerating code fences and surrounding prose
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, ProcessError> {
    let candidate = json_candidate(raw);
    serde_json::from_str(candidate).map_err(|e| {
        trace!("Unparseable completion: {}", raw);
        ProcessError::MalformedCompletion(format!("response does not match schema: {}", e))
    })
}

fn json_candidate(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
        text = body.trim_end().strip_suffix("```").unwrap_or(body).trim();
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Run one completion under a timeout
pub async fn complete_with_timeout<S: CompletionService>(
    service: &S,
    call: CompletionCall,
    timeout: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(timeout, service.complete(call)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(timeout)),
    }
}

/// Summarize one chunk in isolation
///
/// # Arguments
///
/// * `service` - The completion service
/// * `text` - The chunk text
/// * `config` - Timeout and temperature
///
/// # Returns
///
/// The chunk summary; parse failures and empty summaries are errors
#[instrument(skip(service, text, config), fields(text_len = text.len()))]
pub async fn summarize_chunk<S: CompletionService>(
    service: &S,
    text: &str,
    config: &PipelineConfig,
) -> Result<String, ProcessError> {
    let prompt = format!(
        "{}\n\nText:\n{}",
        format_instructions::<ChunkDigest>(),
        text
    );
    let call = CompletionCall::new(CHUNK_PREAMBLE, prompt).with_temperature(config.temperature);
    let raw = complete_with_timeout(service, call, config.per_request_timeout).await?;

    let digest: ChunkDigest = parse_structured(&raw)?;
    let summary = digest.detailed_summary.trim();
    if summary.is_empty() {
        return Err(ProcessError::MalformedCompletion(
            "chunk summary is empty".to_string(),
        ));
    }

    debug!("Summarized chunk into {} chars", summary.len());
    Ok(summary.to_string())
}

/// Compress text without a schema
#[instrument(skip(service, text, config), fields(text_len = text.len()))]
pub async fn condense_text<S: CompletionService>(
    service: &S,
    text: &str,
    config: &PipelineConfig,
) -> Result<String, ProcessError> {
    let call = CompletionCall::new(CONDENSE_PREAMBLE, text).with_temperature(config.temperature);
    let condensed = complete_with_timeout(service, call, config.per_request_timeout).await?;

    let condensed = condensed.trim();
    if condensed.is_empty() {
        return Err(ProcessError::MalformedCompletion(
            "condensed text is empty".to_string(),
        ));
    }
    Ok(condensed.to_string())
}

/// Issue the final structured report call
///
/// # Arguments
///
/// * `service` - The completion service
/// * `query` - The research query, used only as prompt context
/// * `text` - The condensed research text
/// * `statuses` - Access status of every requested URL
/// * `config` - Timeout and temperature
#[instrument(skip(service, text, statuses, config), fields(text_len = text.len()))]
pub async fn synthesize_report<S: CompletionService>(
    service: &S,
    query: &str,
    text: &str,
    statuses: &StatusMap,
    config: &PipelineConfig,
) -> Result<Report, ProcessError> {
    let links = statuses
        .iter()
        .map(|(url, status)| format!("- {}: {}", url, status))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "{}\n\nQuery: {}\n\nLinks:\n{}\n\nResearched data:\n{}",
        format_instructions::<Report>(),
        query,
        links,
        text
    );
    let call = CompletionCall::new(REPORT_PREAMBLE, prompt).with_temperature(config.temperature);
    let raw = complete_with_timeout(service, call, config.per_request_timeout).await?;

    let report: Report = parse_structured(&raw)?;
    report.validate()?;
    debug!("Synthesized report of {} words", report.word_count());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::LinkStatus;
    use crate::model::mock_model::ScriptedCompletion;

    fn config() -> PipelineConfig {
        PipelineConfig::builder()
            .per_request_timeout(Duration::from_millis(200))
            .build()
    }

    #[test]
    fn test_format_instructions_embed_schema_fields() {
        let instructions = format_instructions::<Report>();
        assert!(instructions.contains("\"detailed_summary\""));
        assert!(instructions.contains("\"links\""));
        assert!(instructions.contains("\"title\""));
    }

    #[test]
    fn test_parse_structured_handles_fences_and_prose() {
        let fenced = "```json\n{\"detailed_summary\": \"fenced\"}\n```";
        let digest: ChunkDigest = parse_structured(fenced).unwrap();
        assert_eq!(digest.detailed_summary, "fenced");

        let chatty = "Here you go: {\"detailed_summary\": \"chatty\"} Hope this helps.";
        let digest: ChunkDigest = parse_structured(chatty).unwrap();
        assert_eq!(digest.detailed_summary, "chatty");

        assert!(matches!(
            parse_structured::<ChunkDigest>("no json here"),
            Err(ProcessError::MalformedCompletion(_))
        ));
    }

    #[tokio::test]
    async fn test_summarize_chunk_returns_summary() {
        let service = ScriptedCompletion::new(|_| {
            Ok(r#"{"title": "ignored", "detailed_summary": " A summary. ", "links": {}}"#.to_string())
        });

        let summary = summarize_chunk(&service, "chunk text", &config()).await.unwrap();

        assert_eq!(summary, "A summary.");
        let calls = service.calls();
        assert!(calls[0].prompt.contains("chunk text"));
        assert!(calls[0].prompt.contains("JSON schema"));
    }

    #[tokio::test]
    async fn test_summarize_chunk_times_out() {
        let service = ScriptedCompletion::new(|_| Ok("{}".to_string()))
            .with_latency(Duration::from_secs(5));

        let err = summarize_chunk(&service, "chunk", &config()).await.unwrap_err();
        assert_eq!(
            err,
            ProcessError::Llm(LlmError::Timeout(Duration::from_millis(200)))
        );
    }

    #[tokio::test]
    async fn test_condense_uses_plain_prompt() {
        let service = ScriptedCompletion::new(|_| Ok("short".to_string()));

        let condensed = condense_text(&service, "a much longer text", &config())
            .await
            .unwrap();

        assert_eq!(condensed, "short");
        let calls = service.calls();
        assert_eq!(calls[0].prompt, "a much longer text");
        assert!(calls[0].preamble.contains("without adding information"));
    }

    #[tokio::test]
    async fn test_synthesis_prompt_carries_query_and_statuses() {
        let service = ScriptedCompletion::new(|_| {
            Ok(r#"{"title": "T", "detailed_summary": "S", "links": {}}"#.to_string())
        });
        let statuses = StatusMap::from([("https://a.example".to_string(), LinkStatus::Accessed)]);

        let report = synthesize_report(&service, "rust adoption", "text", &statuses, &config())
            .await
            .unwrap();

        assert_eq!(report.title, "T");
        let prompt = &service.calls()[0].prompt;
        assert!(prompt.contains("Query: rust adoption"));
        assert!(prompt.contains("- https://a.example: accessed"));
    }

    #[tokio::test]
    async fn test_synthesis_rejects_schema_mismatch() {
        let service = ScriptedCompletion::new(|_| Ok(r#"{"title": "only a title"}"#.to_string()));

        let err = synthesize_report(&service, "q", "text", &StatusMap::new(), &config())
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::MalformedCompletion(_)));
    }
}
