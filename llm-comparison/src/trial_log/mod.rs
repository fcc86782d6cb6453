//! Persisted trial records
//!
//! Every finished trial is written twice: once as a human-readable entry in
//! the text log ([`TextLogWriter`]) and once as a JSON line in the records
//! file ([`JsonlRecordWriter`]). Reports can be rebuilt from either one with
//! [`extract_file`] or [`read_records`].

pub mod extractor;
pub mod writer;

pub use extractor::{extract, extract_file, read_records, ExtractError};
pub use writer::{JsonlRecordWriter, TextLogWriter, ENTRY_DELIMITER};

use llm_labs::{PromptType, ReadabilityReport};
use serde::{Deserialize, Serialize};

use crate::runner::EvaluationCell;

/// Row consumed by aggregation and reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub prompt_type: PromptType,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
    pub response_time_seconds: Option<f64>,
    pub response_words: usize,
    pub readability: ReadabilityReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrialRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl From<&EvaluationCell> for TrialRecord {
    fn from(cell: &EvaluationCell) -> Self {
        Self {
            provider: cell.provider.to_lowercase(),
            model: cell.model.clone(),
            prompt: cell.prompt_name.clone(),
            prompt_type: cell.prompt_type,
            input_tokens: cell.input_tokens,
            output_tokens: cell.output_tokens,
            total_tokens: cell.total_tokens(),
            response_time_seconds: cell.response_time_seconds,
            response_words: cell.response_words,
            readability: cell.readability,
            error: cell.error().map(str::to_string),
        }
    }
}

/// Convert a run's cells to report rows
pub fn records_from_cells(cells: &[EvaluationCell]) -> Vec<TrialRecord> {
    cells.iter().map(TrialRecord::from).collect()
}
