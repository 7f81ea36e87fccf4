//! JSON-file store

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{
    record_key, PersistenceError, RecordId, ReportStore, SaveOutcome, StartupRecord, StoredReport,
};
use crate::analysis::FinalReport;

const STARTUPS_DIR: &str = "startups";
const REPORTS_DIR: &str = "reports";

pub struct FileStore {
    root: PathBuf,
    // Serializes the read-then-write of report upserts
    upsert: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            upsert: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn startup_path(&self, id: RecordId) -> PathBuf {
        self.root.join(STARTUPS_DIR).join(format!("{}.json", id))
    }

    fn report_path(&self, key: &str) -> PathBuf {
        self.root.join(REPORTS_DIR).join(format!("{}.json", key))
    }

    pub async fn load_startup(
        &self,
        id: RecordId,
    ) -> Result<Option<StartupRecord>, PersistenceError> {
        read_json(&self.startup_path(id)).await
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
    move |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Temp file in the same directory, then rename over the target
async fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), PersistenceError> {
    let content = serde_json::to_string_pretty(data)?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_error(parent))?;
    }

    let temp_path = path.with_extension(format!("{}.tmp", RecordId::new()));
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(io_error(&temp_path))?;

    if let Err(source) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| PersistenceError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

#[async_trait]
impl ReportStore for FileStore {
    async fn save_startup(
        &self,
        startup_name: &str,
        extracted_text: &str,
        analysis: &Value,
    ) -> Result<RecordId, PersistenceError> {
        let record = StartupRecord {
            id: RecordId::new(),
            startup_name: startup_name.to_string(),
            extracted_text: extracted_text.to_string(),
            analysis: analysis.clone(),
            created_at: Utc::now(),
        };

        let path = self.startup_path(record.id);
        atomic_write_json(&path, &record).await?;
        info!(id = %record.id, startup = startup_name, "Saved startup record");
        Ok(record.id)
    }

    async fn save_pipeline_report(
        &self,
        startup_name: &str,
        report: &FinalReport,
    ) -> Result<SaveOutcome, PersistenceError> {
        let key = record_key(startup_name)?;
        let path = self.report_path(&key);
        let _guard = self.upsert.lock().await;

        let now = Utc::now();
        let existing: Option<StoredReport> = read_json(&path).await?;
        let (stored, outcome) = match existing {
            Some(previous) => (
                StoredReport {
                    id: previous.id,
                    startup_name: startup_name.to_string(),
                    report: report.clone(),
                    created_at: previous.created_at,
                    updated_at: now,
                },
                SaveOutcome::Updated,
            ),
            None => {
                let id = RecordId::new();
                (
                    StoredReport {
                        id,
                        startup_name: startup_name.to_string(),
                        report: report.clone(),
                        created_at: now,
                        updated_at: now,
                    },
                    SaveOutcome::Inserted(id),
                )
            }
        };

        atomic_write_json(&path, &stored).await?;
        info!(
            startup = startup_name,
            key = %key,
            outcome = ?outcome,
            "Saved pipeline report"
        );
        Ok(outcome)
    }

    async fn load_pipeline_report(
        &self,
        startup_name: &str,
    ) -> Result<Option<StoredReport>, PersistenceError> {
        let key = record_key(startup_name)?;
        let path = self.report_path(&key);
        debug!(path = %path.display(), "Loading pipeline report");
        read_json(&path).await
    }

    fn name(&self) -> &str {
        "file"
    }
}
