//! Text chunking strategies for the retrieval experiment
//!
//! The separator-based splitters merge small pieces back together up to
//! `chunk_size`, carrying up to `chunk_overlap` of the previous chunk into
//! the next one. Lengths are measured in characters, except for
//! [`ChunkStrategy::TokenMeasured`] which measures them in tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::context::TextAnalysisContext;
use crate::error::{CoreError, Result};
use crate::tokens::TokenCounter;

pub const RECURSIVE_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];
pub const SENTENCE_SEPARATORS: [&str; 4] = [". ", "! ", "? ", "\n"];

/// How a text is cut into chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ChunkStrategy {
    /// Fixed windows of byte-pair tokens
    Token,
    /// Split on paragraph breaks, merged by token length
    TokenMeasured,
    /// Split on a single separator, merged by character length
    Character { separator: String },
    /// Try each separator in turn until pieces fit
    Recursive { separators: Vec<String> },
    /// Recursive splitting on sentence punctuation
    Sentence,
}

impl ChunkStrategy {
    pub fn character() -> Self {
        ChunkStrategy::Character {
            separator: "\n".to_string(),
        }
    }

    pub fn recursive() -> Self {
        ChunkStrategy::Recursive {
            separators: RECURSIVE_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChunkStrategy::Token => "token",
            ChunkStrategy::TokenMeasured => "tiktoken",
            ChunkStrategy::Character { .. } => "char",
            ChunkStrategy::Recursive { .. } => "recursive",
            ChunkStrategy::Sentence => "sentence",
        }
    }

    /// Chunk size and overlap used when none are configured
    pub fn default_sizes(&self) -> (usize, usize) {
        match self {
            ChunkStrategy::Token | ChunkStrategy::TokenMeasured => (256, 20),
            ChunkStrategy::Character { .. } => (1000, 100),
            ChunkStrategy::Recursive { .. } | ChunkStrategy::Sentence => (500, 50),
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChunkStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "token" => Ok(ChunkStrategy::Token),
            "tiktoken" => Ok(ChunkStrategy::TokenMeasured),
            "char" | "character" => Ok(ChunkStrategy::character()),
            "recursive" => Ok(ChunkStrategy::recursive()),
            "sentence" => Ok(ChunkStrategy::Sentence),
            other => Err(CoreError::InvalidChunking(format!("unknown strategy: {}", other))),
        }
    }
}

/// A validated chunking configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunker {
    strategy: ChunkStrategy,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(strategy: ChunkStrategy, chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(CoreError::InvalidChunking("chunk size must be positive".into()));
        }
        if chunk_overlap > chunk_size {
            return Err(CoreError::InvalidChunking(format!(
                "chunk overlap {} is larger than chunk size {}",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            strategy,
            chunk_size,
            chunk_overlap,
        })
    }

    /// Chunker with the strategy's default size and overlap
    pub fn with_defaults(strategy: ChunkStrategy) -> Self {
        let (chunk_size, chunk_overlap) = strategy.default_sizes();
        Self {
            strategy,
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn strategy(&self) -> &ChunkStrategy {
        &self.strategy
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split(&self, ctx: &TextAnalysisContext, text: &str) -> Result<Vec<String>> {
        let tokens = ctx.token_counter();
        match &self.strategy {
            ChunkStrategy::Token => {
                if self.chunk_overlap == self.chunk_size {
                    return Err(CoreError::InvalidChunking(
                        "token windows need an overlap smaller than the chunk size".into(),
                    ));
                }
                tokens.split(text, self.chunk_size, self.chunk_overlap)
            }
            ChunkStrategy::TokenMeasured => {
                let measure = Measure::Tokens(tokens);
                Ok(self.split_on(text, "\n\n", &measure))
            }
            ChunkStrategy::Character { separator } => Ok(self.split_on(text, separator, &Measure::Chars)),
            ChunkStrategy::Recursive { separators } => {
                let seps: Vec<&str> = separators.iter().map(String::as_str).collect();
                Ok(self.split_recursive(text, &seps, &Measure::Chars))
            }
            ChunkStrategy::Sentence => Ok(self.split_recursive(text, &SENTENCE_SEPARATORS, &Measure::Chars)),
        }
    }

    fn split_on(&self, text: &str, separator: &str, measure: &Measure<'_>) -> Vec<String> {
        let pieces: Vec<&str> = if separator.is_empty() {
            char_pieces(text)
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };
        self.merge(&pieces, separator, measure)
    }

    fn split_recursive(&self, text: &str, separators: &[&str], measure: &Measure<'_>) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut remaining: &[&str] = &[];
        for (i, &sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces = split_keeping_separator(text, separator);
        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in pieces {
            if measure.len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, "", measure));
                fitting.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining, measure));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, "", measure));
        }
        chunks
    }

    /// Greedily join pieces up to `chunk_size`, keeping a tail of at most
    /// `chunk_overlap` as the start of the next chunk
    fn merge(&self, pieces: &[&str], separator: &str, measure: &Measure<'_>) -> Vec<String> {
        let sep_len = measure.len(separator);
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = measure.len(piece);
            let joined_len = |current: &[&str], total: usize| {
                total + len + if current.is_empty() { 0 } else { sep_len }
            };

            if joined_len(&current[..], total) > self.chunk_size {
                if total > self.chunk_size {
                    warn!(total, chunk_size = self.chunk_size, "Created a chunk longer than the chunk size");
                }
                if !current.is_empty() {
                    push_trimmed(&mut chunks, &current.join(separator));
                    while !current.is_empty()
                        && (total > self.chunk_overlap
                            || (joined_len(&current[..], total) > self.chunk_size && total > 0))
                    {
                        let first_len = measure.len(current[0]) + if current.len() > 1 { sep_len } else { 0 };
                        total -= first_len;
                        current.remove(0);
                    }
                }
            }

            current.push(piece);
            total += len + if current.len() > 1 { sep_len } else { 0 };
        }

        if !current.is_empty() {
            push_trimmed(&mut chunks, &current.join(separator));
        }
        chunks
    }
}

enum Measure<'a> {
    Chars,
    Tokens(&'a TokenCounter),
}

impl Measure<'_> {
    fn len(&self, text: &str) -> usize {
        match self {
            Measure::Chars => text.chars().count(),
            Measure::Tokens(counter) => counter.count(text),
        }
    }
}

fn push_trimmed(chunks: &mut Vec<String>, doc: &str) {
    let doc = doc.trim();
    if !doc.is_empty() {
        chunks.push(doc.to_string());
    }
}

fn char_pieces(text: &str) -> Vec<&str> {
    text.char_indices()
        .map(|(i, c)| &text[i..i + c.len_utf8()])
        .collect()
}

/// Split so that every piece after the first starts with the separator
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return char_pieces(text);
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.is_empty());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TextAnalysisContext {
        TextAnalysisContext::new().unwrap()
    }

    #[test]
    fn test_rejects_invalid_sizes() {
        assert!(Chunker::new(ChunkStrategy::Sentence, 0, 0).is_err());
        assert!(Chunker::new(ChunkStrategy::Sentence, 10, 11).is_err());
        assert!(Chunker::new(ChunkStrategy::Sentence, 10, 10).is_ok());
    }

    #[test]
    fn test_character_split_merges_lines() {
        let chunker = Chunker::new(ChunkStrategy::character(), 10, 0).unwrap();
        let chunks = chunker.split(&ctx(), "aaa\nbbb\nccc\nddd").unwrap();
        assert_eq!(chunks, vec!["aaa\nbbb", "ccc\nddd"]);
    }

    #[test]
    fn test_character_split_overlap() {
        let chunker = Chunker::new(ChunkStrategy::character(), 7, 3).unwrap();
        let chunks = chunker.split(&ctx(), "aaa\nbbb\nccc").unwrap();
        assert_eq!(chunks, vec!["aaa\nbbb", "bbb\nccc"]);
    }

    #[test]
    fn test_recursive_falls_back_to_words() {
        let chunker = Chunker::new(ChunkStrategy::recursive(), 10, 0).unwrap();
        let chunks = chunker.split(&ctx(), "one two three four five").unwrap();
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.join(" "), "one two three four five");
    }

    #[test]
    fn test_sentence_split_keeps_punctuation_with_next_piece() {
        let chunker = Chunker::new(ChunkStrategy::Sentence, 20, 0).unwrap();
        let chunks = chunker.split(&ctx(), "First one here. Second one here. Third.").unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "First one here");
        assert_eq!(chunks[1], ". Second one here");
    }

    #[test]
    fn test_token_windows_on_non_ascii_text() {
        let text = "日本語のテキスト… 🚀🚀🚀 naïve café";
        let chunker = Chunker::new(ChunkStrategy::Token, 3, 1).unwrap();
        let chunks = chunker.split(&ctx(), text).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| text.contains(c.as_str())));
        assert!(chunks.last().unwrap().ends_with("café"));
    }

    #[test]
    fn test_character_split_on_non_ascii_text() {
        let chunker = Chunker::new(ChunkStrategy::recursive(), 4, 0).unwrap();
        let chunks = chunker.split(&ctx(), "日本語のテキスト").unwrap();
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
        assert_eq!(chunks.concat(), "日本語のテキスト");
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(split_keeping_separator("a b c", " "), vec!["a", " b", " c"]);
        assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
    }

    #[test]
    fn test_strategy_names_parse() {
        for name in ["token", "tiktoken", "char", "recursive", "sentence"] {
            let strategy: ChunkStrategy = name.parse().unwrap();
            assert_eq!(strategy.name(), name);
        }
        assert!("pdf".parse::<ChunkStrategy>().is_err());
    }
}
