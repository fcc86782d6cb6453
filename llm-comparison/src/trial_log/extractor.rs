//! Rebuild trial records from the text log or the JSON Lines file
//!
//! Text extraction is lenient: an entry missing any required labeled field
//! is dropped, never reported as an error. Only the labeled header of an
//! entry is searched, so response text that happens to contain
//! `Provider:`-style lines cannot leak into the fields.

use regex::Regex;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

use llm_labs::{Metric, PromptType, ReadabilityReport, Score};

use super::writer::ENTRY_DELIMITER;
use super::TrialRecord;
use crate::runner::EvaluationCell;

/// Reading a log or records file failed
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Compiled field patterns
pub struct LogExtractor {
    provider: Regex,
    model: Regex,
    prompt: Regex,
    prompt_type: Regex,
    tokens: Regex,
    response_time: Regex,
    metrics: Vec<(Metric, Regex)>,
}

fn field(label: &str, value: &str) -> Regex {
    Regex::new(&format!(r"(?m)^{}:[ \t]*{}[ \t]*$", regex::escape(label), value))
        .expect("field pattern is valid")
}

impl LogExtractor {
    pub fn new() -> Self {
        Self {
            provider: field("Provider", r"(\S+)"),
            model: field("Model", r"(\S.*?)"),
            prompt: field("Prompt", r"(\S.*?)"),
            prompt_type: field("Prompt Type", r"(\w+)"),
            tokens: field("Tokens (Input/Output/Total)", r"(\d+)/(\d+)/(\d+)"),
            response_time: field("Response Time", r"(\d+(?:\.\d+)?)s(?:[ \t]*\|[ \t]*Words:[ \t]*(\d+))?"),
            metrics: Metric::ALL
                .iter()
                .map(|&m| (m, field(m.log_label(), r"(\S+)")))
                .collect(),
        }
    }

    /// Parse every complete entry of a log
    pub fn extract(&self, log_text: &str) -> Vec<TrialRecord> {
        let mut records = Vec::new();
        let mut dropped = 0usize;
        for entry in split_entries(log_text) {
            match self.parse_entry(entry) {
                Some(record) => records.push(record),
                None if entry.trim().is_empty() => {}
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, "Skipped incomplete log entries");
        }
        records
    }

    fn parse_entry(&self, entry: &str) -> Option<TrialRecord> {
        let header = header_of(entry);

        let capture = |re: &Regex| -> Option<String> {
            re.captures(header)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        let provider = capture(&self.provider)?.to_lowercase();
        let model = capture(&self.model)?;
        let prompt = capture(&self.prompt)?;
        let prompt_type: PromptType = capture(&self.prompt_type)?.parse().ok()?;

        let tokens = self.tokens.captures(header)?;
        let input_tokens = tokens[1].parse().ok()?;
        let output_tokens = tokens[2].parse().ok()?;
        let total_tokens = tokens[3].parse().ok()?;

        let time = self.response_time.captures(header)?;
        let response_time_seconds: f64 = time[1].parse().ok()?;
        let response_words = match time.get(2) {
            Some(words) => words.as_str().parse().ok()?,
            None => 0,
        };

        let mut readability = ReadabilityReport::unavailable();
        for (metric, re) in &self.metrics {
            let score: Score = capture(re)?.parse().ok()?;
            readability.set(*metric, score);
        }

        Some(TrialRecord {
            provider,
            model,
            prompt,
            prompt_type,
            input_tokens,
            output_tokens,
            total_tokens,
            response_time_seconds: Some(response_time_seconds),
            response_words,
            readability,
            error: None,
        })
    }
}

impl Default for LogExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Split on delimiter lines; the text after the last delimiter is an entry too
fn split_entries(text: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end() == ENTRY_DELIMITER {
            entries.push(&text[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    if start < text.len() {
        entries.push(&text[start..]);
    }
    entries
}

/// Portion of an entry before the `Response:` line
fn header_of(entry: &str) -> &str {
    let mut offset = 0;
    for line in entry.split_inclusive('\n') {
        if line.trim_end() == "Response:" {
            return &entry[..offset];
        }
        offset += line.len();
    }
    entry
}

/// Parse log text with a freshly compiled extractor
pub fn extract(log_text: &str) -> Vec<TrialRecord> {
    LogExtractor::new().extract(log_text)
}

/// Read and parse a text log file
pub fn extract_file(path: impl AsRef<Path>) -> Result<Vec<TrialRecord>, ExtractError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(extract(&text))
}

/// Read cells back from a JSON Lines records file
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<EvaluationCell>, ExtractError> {
    let path = path.as_ref();
    let io_err = |source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(std::fs::File::open(path).map_err(io_err)?);

    let mut cells = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let cell = serde_json::from_str(&line).map_err(|source| ExtractError::Json {
            line: i + 1,
            source,
        })?;
        cells.push(cell);
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: &str = "\
[2025-01-01T10:00:00+00:00] trial 1/2
Provider: GROQ
Model: llama-3.1-8b-instant
Prompt: chain_of_thought
Prompt Type: Reasoning
Prompt Length: 14 words
Tokens (Input/Output/Total): 40/120/160
Response Time: 0.842s | Words: 95
Flesch Score: 62.1
SMOG Index: 10.5
Coleman-Liau Index: 11.2
Gunning Fog Index: 12.4
Automated Readability Index: 10.9
Dale-Chall: 8.1
FORCAST: 10.7
Linsear Write: 9.5
LIX: 45.2
RIX: N/A
Response:
Provider: fake line inside the answer
Because the sky scatters blue light.
--------------------------------------------------
";

    #[test]
    fn test_extract_complete_entry() {
        let records = extract(ENTRY);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.provider, "groq");
        assert_eq!(r.model, "llama-3.1-8b-instant");
        assert_eq!(r.prompt, "chain_of_thought");
        assert_eq!(r.prompt_type, PromptType::Reasoning);
        assert_eq!((r.input_tokens, r.output_tokens, r.total_tokens), (40, 120, 160));
        assert_eq!(r.response_time_seconds, Some(0.842));
        assert_eq!(r.response_words, 95);
        assert_eq!(r.readability.flesch_reading_ease, Score::Value(62.1));
        assert_eq!(r.readability.rix, Score::Unavailable);
    }

    #[test]
    fn test_incomplete_entry_is_dropped() {
        let broken = ENTRY.replace("Tokens (Input/Output/Total): 40/120/160\n", "");
        let failed = ENTRY.replace("0.842s", "N/A");
        let log = format!("{}{}{}", broken, ENTRY, failed);
        let records = extract(&log);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_garbage_does_not_panic() {
        assert!(extract("").is_empty());
        assert!(extract("hello\n--------------------------------------------------\n\n").is_empty());
        let truncated = &ENTRY[..ENTRY.len() / 2];
        assert!(extract(truncated).is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = extract_file("/nonexistent/llm_comparison.log").unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }

    #[test]
    fn test_read_records_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        std::fs::write(&path, "\n{not json}\n").unwrap();
        match read_records(&path).unwrap_err() {
            ExtractError::Json { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
