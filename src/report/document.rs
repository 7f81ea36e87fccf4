//! Layout-neutral report document built from a final report value
//!
//! Both the PDF and the text renderers consume the same block list, so the
//! section order and the placeholder rules live here only.

use serde_json::{Map, Value};

use crate::analysis::catalog::{COMPETITOR, FINANCE, MARKET, PRODUCT, TEAM, TRACTION};
use crate::analysis::report::{EXECUTIVE_SUMMARY_KEY, INVESTMENT_SUMMARY_KEY, METADATA_KEY};

pub const REPORT_TITLE: &str = "Investment Analysis Report";
pub const ERROR_TITLE: &str = "Analysis Report Generation Error";
pub const NOT_AVAILABLE: &str = "Not Available";
pub const NO_DATA: &str = "No data available";

/// Domain sections in print order: analyzer id, legacy key, heading prefix
const DOMAIN_SECTIONS: [(&str, &str, &str); 6] = [
    (TEAM, "team_analysis", "Team"),
    (MARKET, "market_analysis", "Market"),
    (PRODUCT, "product_analysis", "Product"),
    (TRACTION, "traction_analysis", "Traction"),
    (FINANCE, "financial_analysis", "Financial"),
    (COMPETITOR, "competitive_analysis", "Competitive"),
];

const EXECUTIVE_FIELDS: [(&str, &str); 5] = [
    ("business_model_summary", "Business Model"),
    ("market_opportunity", "Market Opportunity"),
    ("competitive_position", "Competitive Position"),
    ("financial_outlook", "Financial Outlook"),
    ("team_assessment", "Team Assessment"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Heading(String),
    Subheading(String),
    Paragraph(String),
    Field { label: String, value: String },
    Bullets(Vec<String>),
    PageBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    pub fn from_value(report: &Value, subject: &str) -> Self {
        let empty = Map::new();
        let root = report.as_object().unwrap_or(&empty);
        let mut blocks = Vec::new();

        overview(root, subject, &mut blocks);
        investment_summary(root, &mut blocks);
        executive_summary(root, &mut blocks);
        blocks.push(Block::PageBreak);

        for (id, legacy, name) in DOMAIN_SECTIONS {
            let section = root
                .get(id)
                .or_else(|| root.get(legacy))
                .and_then(Value::as_object);
            blocks.push(Block::Heading(format!("{} Analysis", name)));
            match section {
                Some(fields) if !fields.is_empty() => object_blocks(fields, &mut blocks),
                _ => blocks.push(Block::Paragraph(format!(
                    "{} analysis data not available.",
                    name
                ))),
            }
            blocks.push(Block::PageBreak);
        }
        blocks.pop();

        Self {
            title: format!("{}: {}", REPORT_TITLE, subject),
            blocks,
        }
    }

    /// Document shown when the analysis text is not a JSON object
    pub fn parse_error(raw: &str) -> Self {
        Self {
            title: ERROR_TITLE.to_string(),
            blocks: vec![
                Block::Title(ERROR_TITLE.to_string()),
                Block::Heading("Unable to parse analysis data. Raw response:".to_string()),
                Block::Paragraph(raw.to_string()),
            ],
        }
    }

    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading(h) => Some(h.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn overview(root: &Map<String, Value>, subject: &str, blocks: &mut Vec<Block>) {
    let empty = Map::new();
    let metadata = root
        .get(METADATA_KEY)
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let company = display_value(metadata.get("company_name"))
        .unwrap_or_else(|| fallback_subject(subject));

    blocks.push(Block::Title(REPORT_TITLE.to_string()));
    blocks.push(Block::Heading(company));
    blocks.push(Block::Subheading("Analysis Overview".to_string()));
    for (key, label) in [
        ("analysis_date", "Analysis Date"),
        ("analysis_type", "Analysis Type"),
        ("confidence_level", "Confidence Level"),
    ] {
        blocks.push(field(label, safe_get(metadata, key)));
    }

    let sources = list_items(metadata.get("data_sources"));
    let sources = if sources.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        sources.join(", ")
    };
    blocks.push(field("Data Sources", sources));

    if let Some(status) = metadata.get("analyzer_status").and_then(Value::as_object) {
        if !status.is_empty() {
            blocks.push(Block::Subheading("Analyzer Status".to_string()));
            for (id, value) in status {
                blocks.push(field(&humanize(id), safe_get_value(Some(value))));
            }
        }
    }
}

fn fallback_subject(subject: &str) -> String {
    if subject.trim().is_empty() {
        "Company Analysis".to_string()
    } else {
        subject.trim().to_string()
    }
}

fn investment_summary(root: &Map<String, Value>, blocks: &mut Vec<Block>) {
    let Some(summary) = root.get(INVESTMENT_SUMMARY_KEY).and_then(Value::as_object) else {
        return;
    };
    if summary.is_empty() {
        return;
    }

    blocks.push(Block::Heading("Investment Summary".to_string()));
    blocks.push(field(
        "Overall Score",
        format!("{}/10", safe_get(summary, "overall_score")),
    ));
    blocks.push(field(
        "Recommendation",
        safe_get(summary, "investment_recommendation"),
    ));
    blocks.push(field(
        "Investment Thesis",
        safe_get(summary, "investment_thesis"),
    ));

    blocks.push(Block::Subheading("Key Strengths:".to_string()));
    blocks.push(bullets(summary.get("key_strengths")));
    blocks.push(Block::Subheading("Key Risks:".to_string()));
    blocks.push(bullets(summary.get("key_risks")));
}

fn executive_summary(root: &Map<String, Value>, blocks: &mut Vec<Block>) {
    let Some(summary) = root.get(EXECUTIVE_SUMMARY_KEY).and_then(Value::as_object) else {
        return;
    };
    if summary.is_empty() {
        return;
    }

    blocks.push(Block::Heading("Executive Summary".to_string()));
    for (key, label) in EXECUTIVE_FIELDS {
        if let Some(value) = display_value(summary.get(key)) {
            blocks.push(Block::Subheading(format!("{}:", label)));
            blocks.push(Block::Paragraph(value));
        }
    }
}

/// Generic rendering for analyzer output of any shape
fn object_blocks(fields: &Map<String, Value>, blocks: &mut Vec<Block>) {
    for (key, value) in fields {
        let label = humanize(key);
        match value {
            Value::Array(items) if items.iter().any(Value::is_object) => {
                blocks.push(Block::Subheading(label));
                let lines: Vec<String> = items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(summarize_object)
                    .filter(|line| !line.is_empty())
                    .collect();
                blocks.push(if lines.is_empty() {
                    Block::Bullets(vec![NO_DATA.to_string()])
                } else {
                    Block::Bullets(lines)
                });
            }
            Value::Array(_) => {
                blocks.push(Block::Subheading(label));
                blocks.push(bullets(Some(value)));
            }
            Value::Object(nested) => {
                if nested.is_empty() {
                    continue;
                }
                blocks.push(Block::Subheading(label));
                object_blocks(nested, blocks);
            }
            scalar => {
                if let Some(text) = display_value(Some(scalar)) {
                    blocks.push(Block::Field { label, value: text });
                }
            }
        }
    }
}

fn summarize_object(object: &Map<String, Value>) -> String {
    object
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Array(_) => {
                    let items = list_items(Some(value));
                    (!items.is_empty()).then(|| items.join(", "))
                }
                other => display_value(Some(other)),
            }?;
            Some(format!("{}: {}", humanize(key), text))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn field(label: &str, value: String) -> Block {
    Block::Field {
        label: label.to_string(),
        value,
    }
}

fn bullets(value: Option<&Value>) -> Block {
    let items = list_items(value);
    if items.is_empty() {
        Block::Bullets(vec![NO_DATA.to_string()])
    } else {
        Block::Bullets(items)
    }
}

/// Template filler a model sometimes echoes back instead of a value
pub fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == "string" || trimmed == NOT_AVAILABLE
}

fn display_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if is_placeholder(s) => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        _ => None,
    }
}

fn safe_get(object: &Map<String, Value>, key: &str) -> String {
    safe_get_value(object.get(key))
}

fn safe_get_value(value: Option<&Value>) -> String {
    display_value(value).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn list_items(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| display_value(Some(item)))
            .collect(),
        Some(single) => display_value(Some(single)).into_iter().collect(),
        None => Vec::new(),
    }
}

/// `key_strengths` -> `Key Strengths`
pub fn humanize(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
