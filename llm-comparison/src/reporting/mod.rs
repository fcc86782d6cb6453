//! Report rendering and artifacts

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use llm_labs::{Metric, Score};

use crate::analysis::{group_records, AggregateGroup};
use crate::providers::ProviderResult;
use crate::trial_log::TrialRecord;

/// Instruction sent with the numeric report when asking for a narrative
pub const NARRATIVE_INSTRUCTION: &str = "You are an objective evaluator. Using only the numbers in \
the following report, compare the models on speed, token usage and readability, point out \
notable differences and state which model suits which kind of use. Do not use any outside \
knowledge about the models or their vendors.";

const NARRATIVE_PLACEHOLDER: &str = "Narrative analysis unavailable.";

/// Produces a free-text comparison of a numeric report
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn summarize(&self, report_text: &str, instruction: &str) -> ProviderResult<String>;
}

/// Report generation errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No trial records to report on")]
    NoRecords,

    #[error("Failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A persisted report
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub text: String,
    pub path: PathBuf,
    pub summary_path: Option<PathBuf>,
    /// Whether the narrative section came from the narrator
    pub narrated: bool,
}

/// Renders and persists reports
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
    json_summary: bool,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            json_summary: false,
        }
    }

    pub fn with_json_summary(mut self, enabled: bool) -> Self {
        self.json_summary = enabled;
        self
    }

    /// Render the numeric part of the report
    pub fn render(&self, groups: &[AggregateGroup], question: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# LLM Performance Report\n");
        let _ = writeln!(out, "User Question: {}\n", question.trim());

        for group in groups {
            let _ = writeln!(out, "## {}", group.key());
            let _ = writeln!(out, "- Trials: {} (failed: {})", group.trials, group.failed);
            let _ = writeln!(out, "- Average Input Tokens: {}", fixed2(group.avg_input_tokens));
            let _ = writeln!(out, "- Average Output Tokens: {}", fixed2(group.avg_output_tokens));
            let _ = writeln!(
                out,
                "- Average Response Time: {} sec",
                fixed2(group.avg_response_time)
            );
            for summary in &group.metrics {
                let _ = writeln!(
                    out,
                    "- Avg. {}: {} ({}) - Missing: {}",
                    summary.metric.display_name(),
                    fixed2(summary.average.value()),
                    summary.metric.interpretation(),
                    summary.missing
                );
            }
            out.push('\n');
        }
        out
    }

    /// Aggregate, narrate and persist a report
    pub async fn generate(
        &self,
        records: &[TrialRecord],
        question: &str,
        narrator: Option<&dyn Narrator>,
    ) -> Result<GeneratedReport, ReportError> {
        if records.is_empty() {
            return Err(ReportError::NoRecords);
        }

        let groups = group_records(records);
        let numeric = self.render(&groups, question);

        let (narrative, narrated) = match narrator {
            Some(narrator) => match narrator.summarize(&numeric, NARRATIVE_INSTRUCTION).await {
                Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), true),
                Ok(_) => {
                    tracing::warn!("Narrator returned an empty summary");
                    (NARRATIVE_PLACEHOLDER.to_string(), false)
                }
                Err(e) => {
                    tracing::warn!("Narrative generation failed: {}", e);
                    (format!("{} ({})", NARRATIVE_PLACEHOLDER, e), false)
                }
            },
            None => (NARRATIVE_PLACEHOLDER.to_string(), false),
        };

        let text = format!("{}## Narrative Analysis\n\n{}\n", numeric, narrative);

        std::fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let path = write_new(&self.output_dir, &stamp, "txt", text.as_bytes())?;
        tracing::info!("Report saved to {}", path.display());

        let summary_path = if self.json_summary {
            let summary = JsonSummary::new(question, &path, &groups, narrated.then(|| narrative.clone()));
            write_summary(&self.output_dir, &stamp, &summary)
        } else {
            None
        };

        Ok(GeneratedReport {
            text,
            path,
            summary_path,
            narrated,
        })
    }
}

fn fixed2(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => Score::Unavailable.to_string(),
    }
}

/// Create `llm_report_<stamp>[_n].<ext>` without overwriting anything
fn write_new(dir: &Path, stamp: &str, ext: &str, contents: &[u8]) -> Result<PathBuf, ReportError> {
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("llm_report_{}.{}", stamp, ext)
        } else {
            format!("llm_report_{}_{}.{}", stamp, attempt, ext)
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                return file
                    .write_all(contents)
                    .map(|_| path.clone())
                    .map_err(|source| ReportError::Io { path, source });
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => return Err(ReportError::Io { path, source }),
        }
    }
}

/// Write the JSON summary next to the report; a failure is logged and skipped
fn write_summary(dir: &Path, stamp: &str, summary: &JsonSummary) -> Option<PathBuf> {
    let written = serde_json::to_vec_pretty(summary)
        .map_err(ReportError::from)
        .and_then(|json| write_new(dir, stamp, "json", &json));
    match written {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("JSON summary not written: {}", e);
            None
        }
    }
}

/// JSON summary export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub generated_at: String,
    pub question: String,
    pub report_file: String,
    pub total_trials: usize,
    pub groups: Vec<AggregateGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl JsonSummary {
    pub fn new(
        question: &str,
        report_file: &Path,
        groups: &[AggregateGroup],
        narrative: Option<String>,
    ) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            question: question.to_string(),
            report_file: report_file.display().to_string(),
            total_trials: groups.iter().map(|g| g.trials).sum(),
            groups: groups.to_vec(),
            narrative,
        }
    }
}

/// Print a compact comparison table
pub fn print_console_report(groups: &[AggregateGroup]) {
    println!("\n=== LLM Comparison Results ===\n");
    println!(
        "{:<40} {:>7} {:>9} {:>9} {:>9} {:>9}",
        "Provider::Model", "Trials", "Time (s)", "Out tok", "Flesch", "Fog"
    );
    println!("{:-<88}", "");

    for group in groups {
        let score = |m: Metric| fixed2(group.metric(m).and_then(|s| s.average.value()));
        println!(
            "{:<40} {:>7} {:>9} {:>9} {:>9} {:>9}",
            group.key(),
            format!("{}/{}", group.trials - group.failed, group.trials),
            fixed2(group.avg_response_time),
            fixed2(group.avg_output_tokens),
            score(Metric::FleschReadingEase),
            score(Metric::GunningFog),
        );
    }

    println!("\n{:=<88}", "");
}
