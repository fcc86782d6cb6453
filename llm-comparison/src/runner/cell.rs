//! One evaluated (provider, model, prompt) trial

use chrono::{DateTime, Utc};
use llm_labs::{PromptType, ReadabilityReport};
use serde::{Deserialize, Serialize};

/// What the backend returned for a trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum TrialOutcome {
    Completed(String),
    Failed(String),
}

/// Result of a single trial; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCell {
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    pub prompt_name: String,
    pub prompt_type: PromptType,
    pub prompt_length_words: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub response: TrialOutcome,
    pub response_time_seconds: Option<f64>,
    /// Whitespace-separated words of the response
    pub response_words: usize,
    pub readability: ReadabilityReport,
}

impl EvaluationCell {
    pub fn is_success(&self) -> bool {
        matches!(self.response, TrialOutcome::Completed(_))
    }

    pub fn total_tokens(&self) -> usize {
        self.input_tokens + self.output_tokens
    }

    pub fn response_text(&self) -> Option<&str> {
        match &self.response {
            TrialOutcome::Completed(text) => Some(text),
            TrialOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.response {
            TrialOutcome::Completed(_) => None,
            TrialOutcome::Failed(message) => Some(message),
        }
    }
}
