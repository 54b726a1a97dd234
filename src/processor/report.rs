//! Report types produced by structured completions

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::acquisition::StatusMap;
use crate::processor::error::ProcessError;

/// Status string recorded for every URL that contributed text
pub const ACCESSED: &str = "accessed";

/// The final structured report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    /// The title of the report
    pub title: String,

    /// A detailed, long-form summary of the researched data in 500 to 800 words
    pub detailed_summary: String,

    /// Map from each source URL used to generate the report to its access status
    pub links: BTreeMap<String, String>,
}

impl Report {
    /// Reject reports with missing content
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.title.trim().is_empty() {
            return Err(ProcessError::MalformedCompletion(
                "report title is empty".to_string(),
            ));
        }
        if self.detailed_summary.trim().is_empty() {
            return Err(ProcessError::MalformedCompletion(
                "report summary is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the model's link map with the URLs that were actually read
    ///
    /// Keys become exactly the accessed URLs of `statuses`. Anything the model
    /// invented, and every failed URL, is dropped; failures are reported
    /// through the status map instead.
    pub fn reconcile_links(&mut self, statuses: &StatusMap) {
        self.links = statuses
            .iter()
            .filter(|(_, status)| status.is_accessed())
            .map(|(url, _)| (url.clone(), ACCESSED.to_string()))
            .collect();
    }

    /// Number of whitespace-separated words in the summary
    pub fn word_count(&self) -> usize {
        self.detailed_summary.split_whitespace().count()
    }
}

/// Per-chunk structured output
///
/// Shares the report shape, but only the summary is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChunkDigest {
    /// A short title for this part of the text
    #[serde(default)]
    pub title: String,

    /// A faithful summary of this part of the text
    pub detailed_summary: String,

    /// Source URLs mentioned in this part of the text
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}
