//! In-memory store for tests and `--no-save` runs

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    record_key, PersistenceError, RecordId, ReportStore, SaveOutcome, StartupRecord, StoredReport,
};
use crate::analysis::FinalReport;

#[derive(Default)]
pub struct MemoryStore {
    startups: Mutex<Vec<StartupRecord>>,
    reports: Mutex<HashMap<String, StoredReport>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn startups(&self) -> Vec<StartupRecord> {
        self.startups.lock().unwrap().clone()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn save_startup(
        &self,
        startup_name: &str,
        extracted_text: &str,
        analysis: &Value,
    ) -> Result<RecordId, PersistenceError> {
        let id = RecordId::new();
        self.startups.lock().unwrap().push(StartupRecord {
            id,
            startup_name: startup_name.to_string(),
            extracted_text: extracted_text.to_string(),
            analysis: analysis.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn save_pipeline_report(
        &self,
        startup_name: &str,
        report: &FinalReport,
    ) -> Result<SaveOutcome, PersistenceError> {
        let key = record_key(startup_name)?;
        let now = Utc::now();
        let mut reports = self.reports.lock().unwrap();

        match reports.get_mut(&key) {
            Some(stored) => {
                stored.startup_name = startup_name.to_string();
                stored.report = report.clone();
                stored.updated_at = now;
                Ok(SaveOutcome::Updated)
            }
            None => {
                let id = RecordId::new();
                reports.insert(
                    key,
                    StoredReport {
                        id,
                        startup_name: startup_name.to_string(),
                        report: report.clone(),
                        created_at: now,
                        updated_at: now,
                    },
                );
                Ok(SaveOutcome::Inserted(id))
            }
        }
    }

    async fn load_pipeline_report(
        &self,
        startup_name: &str,
    ) -> Result<Option<StoredReport>, PersistenceError> {
        let key = record_key(startup_name)?;
        Ok(self.reports.lock().unwrap().get(&key).cloned())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::report::ReportMetadata;
    use serde_json::json;

    fn report(score: u32) -> FinalReport {
        FinalReport {
            analysis_metadata: ReportMetadata {
                company_name: "Acme".to_string(),
                analysis_date: "2026-10-16".to_string(),
                analysis_type: String::new(),
                agent: String::new(),
                confidence_level: String::new(),
                data_sources: vec![],
                analyzer_status: Default::default(),
            },
            sections: vec![],
            investment_summary: json!({"overall_score": score}),
            executive_summary: json!({}),
        }
    }

    #[tokio::test]
    async fn test_upsert_semantics() {
        let store = MemoryStore::new();

        assert!(matches!(
            store.save_pipeline_report("Acme", &report(3)).await.unwrap(),
            SaveOutcome::Inserted(_)
        ));
        assert_eq!(
            store.save_pipeline_report("ACME", &report(8)).await.unwrap(),
            SaveOutcome::Updated
        );
        assert_eq!(store.report_count(), 1);

        let loaded = store.load_pipeline_report("acme").await.unwrap().unwrap();
        assert_eq!(loaded.report.investment_summary["overall_score"], 8);
    }

    #[tokio::test]
    async fn test_startup_records_accumulate() {
        let store = MemoryStore::new();
        let a = store.save_startup("Acme", "t1", &json!({})).await.unwrap();
        let b = store.save_startup("Acme", "t2", &json!({})).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.startups().len(), 2);
    }
}
