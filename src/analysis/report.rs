//! The merged report produced once per pipeline run

use super::analyzer::AnalyzerStatus;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const METADATA_KEY: &str = "analysis_metadata";
pub const INVESTMENT_SUMMARY_KEY: &str = "investment_summary";
pub const EXECUTIVE_SUMMARY_KEY: &str = "executive_summary";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub company_name: String,
    pub analysis_date: String,
    #[serde(default)]
    pub analysis_type: String,
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub confidence_level: String,
    #[serde(default)]
    pub data_sources: Vec<String>,
    #[serde(default)]
    pub analyzer_status: BTreeMap<String, AnalyzerStatus>,
}

/// One analyzer's subtree, an empty object when it did not succeed
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSection {
    pub analyzer_id: String,
    pub content: Value,
}

impl DomainSection {
    pub fn placeholder(analyzer_id: &str) -> Self {
        Self {
            analyzer_id: analyzer_id.to_string(),
            content: Value::Object(Map::new()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(&self.content, Value::Object(map) if map.is_empty())
    }
}

/// Serialized as one flat object: metadata, each domain keyed by analyzer id
/// in configured order, then the two summaries
#[derive(Debug, Clone, PartialEq)]
pub struct FinalReport {
    pub analysis_metadata: ReportMetadata,
    pub sections: Vec<DomainSection>,
    pub investment_summary: Value,
    pub executive_summary: Value,
}

impl FinalReport {
    pub fn section(&self, analyzer_id: &str) -> Option<&Value> {
        self.sections
            .iter()
            .find(|s| s.analyzer_id == analyzer_id)
            .map(|s| &s.content)
    }

    pub fn company_name(&self) -> &str {
        &self.analysis_metadata.company_name
    }

    pub fn top_level_keys(&self) -> Vec<String> {
        let mut keys = vec![METADATA_KEY.to_string()];
        keys.extend(self.sections.iter().map(|s| s.analyzer_id.clone()));
        keys.push(INVESTMENT_SUMMARY_KEY.to_string());
        keys.push(EXECUTIVE_SUMMARY_KEY.to_string());
        keys
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for FinalReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len() + 3))?;
        map.serialize_entry(METADATA_KEY, &self.analysis_metadata)?;
        for section in &self.sections {
            map.serialize_entry(&section.analyzer_id, &section.content)?;
        }
        map.serialize_entry(INVESTMENT_SUMMARY_KEY, &self.investment_summary)?;
        map.serialize_entry(EXECUTIVE_SUMMARY_KEY, &self.executive_summary)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for FinalReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FinalReportVisitor)
    }
}

/// Reads entries in document order so domain sections keep the order they
/// were written in
struct FinalReportVisitor;

impl<'de> Visitor<'de> for FinalReportVisitor {
    type Value = FinalReport;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a report object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FinalReport, A::Error> {
        let mut analysis_metadata = None;
        let mut investment_summary = None;
        let mut executive_summary = None;
        let mut sections = Vec::new();

        while let Some(key) = access.next_key::<String>()? {
            match key.as_str() {
                METADATA_KEY => analysis_metadata = Some(access.next_value::<ReportMetadata>()?),
                INVESTMENT_SUMMARY_KEY => investment_summary = Some(access.next_value()?),
                EXECUTIVE_SUMMARY_KEY => executive_summary = Some(access.next_value()?),
                _ => sections.push(DomainSection {
                    analyzer_id: key,
                    content: access.next_value()?,
                }),
            }
        }

        let empty = || Value::Object(Map::new());
        Ok(FinalReport {
            analysis_metadata: analysis_metadata
                .ok_or_else(|| de::Error::missing_field(METADATA_KEY))?,
            sections,
            investment_summary: investment_summary.unwrap_or_else(empty),
            executive_summary: executive_summary.unwrap_or_else(empty),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> FinalReport {
        let mut status = BTreeMap::new();
        status.insert("team".to_string(), AnalyzerStatus::Success);
        status.insert("market".to_string(), AnalyzerStatus::Failed);

        FinalReport {
            analysis_metadata: ReportMetadata {
                company_name: "Acme Robotics".to_string(),
                analysis_date: "2026-01-15".to_string(),
                analysis_type: "Comprehensive Startup Analysis".to_string(),
                agent: "business_analysis_agent".to_string(),
                confidence_level: "Medium".to_string(),
                data_sources: vec!["Model knowledge".to_string()],
                analyzer_status: status,
            },
            sections: vec![
                DomainSection {
                    analyzer_id: "team".to_string(),
                    content: json!({"score": 80}),
                },
                DomainSection::placeholder("market"),
            ],
            investment_summary: json!({"overall_score": 70}),
            executive_summary: json!({}),
        }
    }

    #[test]
    fn test_serialized_key_order() {
        let text = serde_json::to_string(&report()).unwrap();
        let metadata = text.find("\"analysis_metadata\"").unwrap();
        let team = text.find("\"team\":").unwrap();
        let market = text.find("\"market\":").unwrap();
        let summary = text.find("\"investment_summary\"").unwrap();

        assert!(metadata < team && team < market && market < summary);
    }

    #[test]
    fn test_round_trip_preserves_sections() {
        let original = report();
        let text = original.to_json_pretty().unwrap();
        let parsed: FinalReport = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed.company_name(), "Acme Robotics");
        assert_eq!(parsed.section("team"), Some(&json!({"score": 80})));
        assert_eq!(parsed.sections.len(), 2);
        assert_eq!(parsed.investment_summary, original.investment_summary);
    }

    #[test]
    fn test_round_trip_keeps_configured_order() {
        let mut original = report();
        for id in ["product", "competitor", "finance"] {
            original
                .analysis_metadata
                .analyzer_status
                .insert(id.to_string(), AnalyzerStatus::Success);
            original.sections.push(DomainSection {
                analyzer_id: id.to_string(),
                content: json!({"score": 1}),
            });
        }

        let text = original.to_json_pretty().unwrap();
        let parsed: FinalReport = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed.top_level_keys(), original.top_level_keys());
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_missing_metadata_rejected() {
        let result: Result<FinalReport, _> = serde_json::from_value(json!({"team": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_placeholder_detection() {
        let report = report();
        assert!(!report.sections[0].is_placeholder());
        assert!(report.sections[1].is_placeholder());
    }

    #[test]
    fn test_top_level_keys() {
        let keys = report().top_level_keys();
        assert_eq!(
            keys,
            vec![
                "analysis_metadata",
                "team",
                "market",
                "investment_summary",
                "executive_summary"
            ]
        );
    }
}
