//! Persistence of startup records and pipeline reports
//!
//! Storage location (`RESOLUTES_STORE_DIR`, default `.resolutes/`):
//! - `startups/<id>.json` - one record per `save_startup` call
//! - `reports/<name>.json` - latest pipeline report per startup name
//!
//! A persistence failure never invalidates a report that was already
//! produced; callers log it and carry on.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::FinalReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted(RecordId),
    Updated,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Corrupt record at {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Invalid startup name: {0:?}")]
    InvalidName(String),
}

/// Structured document profile of a startup, kept with the text it was extracted from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupRecord {
    pub id: RecordId,
    pub startup_name: String,
    pub extracted_text: String,
    pub analysis: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: RecordId,
    pub startup_name: String,
    pub report: FinalReport,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn save_startup(
        &self,
        startup_name: &str,
        extracted_text: &str,
        analysis: &Value,
    ) -> Result<RecordId, PersistenceError>;

    /// Upsert keyed by startup name
    async fn save_pipeline_report(
        &self,
        startup_name: &str,
        report: &FinalReport,
    ) -> Result<SaveOutcome, PersistenceError>;

    async fn load_pipeline_report(
        &self,
        startup_name: &str,
    ) -> Result<Option<StoredReport>, PersistenceError>;

    fn name(&self) -> &str;
}

/// Lookup key for a startup name: lowercase, runs of anything outside
/// `[a-z0-9]` collapsed to a single `-`
pub fn record_key(startup_name: &str) -> Result<String, PersistenceError> {
    let mut key = String::new();
    for c in startup_name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            key.push(c);
        } else if !key.ends_with('-') && !key.is_empty() {
            key.push('-');
        }
    }
    let key = key.trim_end_matches('-').to_string();

    if key.is_empty() {
        return Err(PersistenceError::InvalidName(startup_name.to_string()));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key() {
        assert_eq!(record_key("Acme Robotics, Inc.").unwrap(), "acme-robotics-inc");
        assert_eq!(record_key("  ../../etc  ").unwrap(), "etc");
        assert_eq!(record_key("Zoë AI").unwrap(), "zo-ai");
    }

    #[test]
    fn test_record_key_rejects_symbols_only() {
        assert!(matches!(
            record_key("???"),
            Err(PersistenceError::InvalidName(_))
        ));
    }

    #[test]
    fn test_record_id_serializes_as_string() {
        let id = RecordId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, Value::String(id.to_string()));
    }
}
