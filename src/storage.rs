//! Report persistence hand-off
//!
//! Finished reports are written as pretty-printed JSON, one file per run,
//! together with the status map. This is a hand-off format for whatever
//! store sits downstream, not a schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{io, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::acquisition::StatusMap;
use crate::processor::Report;

const MAX_SLUG_LEN: usize = 48;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base path for storage
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(".synopsis/reports"),
        }
    }
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid report id: {0}")]
    InvalidId(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

type Result<T> = std::result::Result<T, StorageError>;

/// One stored run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// File stem, `<timestamp>-<slug>`
    pub id: String,

    /// The query the report answers
    pub query: String,

    pub created_at: DateTime<Utc>,

    pub report: Report,

    /// Access status of every requested URL
    pub statuses: StatusMap,
}

impl ReportRecord {
    /// Create a record stamped with the current time
    pub fn new(query: &str, report: Report, statuses: StatusMap) -> Self {
        Self::at(Utc::now(), query, report, statuses)
    }

    /// Create a record with an explicit timestamp
    pub fn at(created_at: DateTime<Utc>, query: &str, report: Report, statuses: StatusMap) -> Self {
        let id = format!("{}-{}", created_at.format("%Y%m%dT%H%M%SZ"), slugify(query));
        Self {
            id,
            query: query.to_string(),
            created_at,
            report,
            statuses,
        }
    }
}

/// Lowercase ASCII slug of a query, `report` when nothing is left
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug.to_string()
    }
}

/// Storage manager for report records
#[derive(Debug, Clone, Default)]
pub struct ReportStore {
    config: StorageConfig,
}

impl ReportStore {
    /// Create a new store with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new store with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Path of the file holding `id`
    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(StorageError::InvalidId(id.to_string()));
        }
        Ok(self.config.base_path.join(format!("{}.json", id)))
    }

    async fn ensure_directories(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write a record, returning the file path
    pub async fn save(&self, record: &ReportRecord) -> Result<PathBuf> {
        let path = self.path_for(&record.id)?;
        self.ensure_directories(&path).await?;

        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).await?;
        debug!("Stored report at {}", path.display());
        Ok(path)
    }

    /// Load a record by id
    pub async fn load(&self, id: &str) -> Result<ReportRecord> {
        let path = self.path_for(id)?;
        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let json = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Every readable record, oldest first
    pub async fn list(&self) -> Result<Vec<ReportRecord>> {
        let base_path = &self.config.base_path;
        if !fs::try_exists(base_path).await? {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut dir_entries = fs::read_dir(base_path).await?;
        while let Some(entry) = dir_entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.load(id).await {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable report {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }
}
