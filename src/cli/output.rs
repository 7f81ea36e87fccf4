//! Output formatting for analysis results
//!
//! JSON and YAML carry the final report exactly as it is persisted. The human
//! format adds a per-analyst status table ahead of the text rendering.

use anyhow::{Context, Result};

use crate::analysis::{AnalyzerStatus, FinalReport};
use crate::pipeline::PipelineRun;
use crate::report::{self, ReportInput};
use crate::store::StoredReport;

const RULE_WIDTH: usize = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_run(&self, run: &PipelineRun) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_json(&run.report),
            OutputFormat::Yaml => self.format_yaml(&run.report),
            OutputFormat::Human => Ok(self.format_run_human(run)),
        }
    }

    pub fn format_stored(&self, stored: &StoredReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_json(&stored.report),
            OutputFormat::Yaml => self.format_yaml(&stored.report),
            OutputFormat::Human => {
                let mut output = format!(
                    "Stored report for {} (id {}, updated {})\n\n",
                    stored.startup_name,
                    stored.id,
                    stored.updated_at.format("%Y-%m-%d %H:%M UTC")
                );
                output.push_str(&report::render_text(
                    &ReportInput::from(&stored.report),
                    &stored.startup_name,
                ));
                Ok(output)
            }
        }
    }

    fn format_json(&self, report: &FinalReport) -> Result<String> {
        report
            .to_json_pretty()
            .context("Failed to serialize report to JSON")
    }

    fn format_yaml(&self, report: &FinalReport) -> Result<String> {
        serde_yaml::to_string(report).context("Failed to serialize report to YAML")
    }

    fn format_run_human(&self, run: &PipelineRun) -> String {
        let mut output = String::new();
        let total = run.results.len();
        let succeeded = run.succeeded();

        if succeeded == total {
            output.push_str(&format!(
                "\u{2713} Investment Analysis: {}\n",
                run.report.company_name()
            ));
        } else {
            output.push_str(&format!(
                "\u{26A0} Investment Analysis: {} ({} of {} analysts succeeded)\n",
                run.report.company_name(),
                succeeded,
                total
            ));
        }
        output.push_str(&"\u{2501}".repeat(RULE_WIDTH));
        output.push_str("\n\n");

        output.push_str("Analysts:\n");
        let width = run.results.keys().map(|k| k.len()).max().unwrap_or(0);
        for (i, (id, result)) in run.results.iter().enumerate() {
            let connector = if i + 1 == total { "\u{2514}" } else { "\u{251C}" };
            let symbol = match result.status {
                AnalyzerStatus::Success => "\u{2713}",
                AnalyzerStatus::MalformedOutput => "\u{26A0}",
                AnalyzerStatus::Failed => "\u{2717}",
            };
            output.push_str(&format!(
                "{}\u{2500} {} {:<width$}  {:<16} {} attempt{}  {:.1}s",
                connector,
                symbol,
                id,
                result.status.to_string(),
                result.attempts,
                if result.attempts == 1 { "" } else { "s" },
                result.duration.as_secs_f64(),
                width = width
            ));
            if let Some(ref error) = result.error {
                output.push_str(&format!("  ({})", error));
            }
            output.push('\n');
        }

        let warnings: Vec<String> = run
            .results
            .iter()
            .flat_map(|(id, r)| r.warnings.iter().map(move |w| format!("{}: {}", id, w)))
            .collect();
        if !warnings.is_empty() {
            output.push_str("\n\u{26A0} Warnings:\n");
            for warning in &warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output.push('\n');
        output.push_str(&report::render_text(
            &ReportInput::from(&run.report),
            run.report.company_name(),
        ));
        output.push_str(&format!(
            "\nCompleted in {:.1}s\n",
            run.duration.as_secs_f64()
        ));

        output
    }
}
