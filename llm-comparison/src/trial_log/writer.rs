//! Trial sinks writing the text log and the JSON Lines records file

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::runner::{EvaluationCell, TrialOutcome, TrialSink};

/// Line separating two log entries
pub const ENTRY_DELIMITER: &str = "--------------------------------------------------";

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Render one log entry, delimiter line included
pub fn format_entry(cell: &EvaluationCell, index: usize, total: usize) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "[{}] trial {}/{}", cell.timestamp.to_rfc3339(), index, total);
    let _ = writeln!(out, "Provider: {}", cell.provider.to_uppercase());
    let _ = writeln!(out, "Model: {}", cell.model);
    let _ = writeln!(out, "Prompt: {}", cell.prompt_name);
    let _ = writeln!(out, "Prompt Type: {}", cell.prompt_type);
    let _ = writeln!(out, "Prompt Length: {} words", cell.prompt_length_words);
    let _ = writeln!(
        out,
        "Tokens (Input/Output/Total): {}/{}/{}",
        cell.input_tokens,
        cell.output_tokens,
        cell.total_tokens()
    );
    match cell.response_time_seconds {
        Some(secs) => {
            let _ = writeln!(out, "Response Time: {:.3}s | Words: {}", secs, cell.response_words);
        }
        None => {
            let _ = writeln!(out, "Response Time: N/A | Words: {}", cell.response_words);
        }
    }
    for (metric, score) in cell.readability.iter() {
        let _ = writeln!(out, "{}: {}", metric.log_label(), score);
    }
    out.push_str("Response:\n");
    match &cell.response {
        TrialOutcome::Completed(text) => out.push_str(text.trim_end()),
        TrialOutcome::Failed(message) => {
            let _ = write!(out, "Error: {}", message);
        }
    }
    out.push('\n');
    out.push_str(ENTRY_DELIMITER);
    out.push('\n');
    out
}

/// Appends human-readable entries to the trial log
pub struct TextLogWriter {
    path: PathBuf,
    file: File,
}

impl TextLogWriter {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrialSink for TextLogWriter {
    fn record(&mut self, cell: &EvaluationCell, index: usize, total: usize) -> io::Result<()> {
        self.file
            .write_all(format_entry(cell, index, total).as_bytes())?;
        self.file.flush()
    }
}

/// Appends one JSON object per cell
pub struct JsonlRecordWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlRecordWriter {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let writer = BufWriter::new(open_append(&path)?);
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrialSink for JsonlRecordWriter {
    fn record(&mut self, cell: &EvaluationCell, _index: usize, _total: usize) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, cell)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}
