//! Byte-pair token counting with the GPT-2 vocabulary

use tiktoken_rs::CoreBPE;
use tracing::warn;

use crate::error::{CoreError, Result};

/// Result of counting the tokens of one text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenCount {
    pub tokens: usize,
    /// The text had more tokens than the configured limit
    pub truncated: bool,
}

/// Counts tokens with a fixed vocabulary so counts are comparable across calls.
///
/// By default every token is counted. With a limit, longer inputs are
/// clamped to the limit and the result is flagged as truncated.
pub struct TokenCounter {
    bpe: CoreBPE,
    limit: Option<usize>,
}

impl TokenCounter {
    /// Load the GPT-2 (`r50k_base`) vocabulary
    pub fn gpt2() -> Result<Self> {
        let bpe = tiktoken_rs::r50k_base().map_err(|e| CoreError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe, limit: None })
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn count(&self, text: &str) -> usize {
        self.count_detailed(text).tokens
    }

    pub fn count_detailed(&self, text: &str) -> TokenCount {
        let total = self.bpe.encode_ordinary(text).len();
        match self.limit {
            Some(limit) if total > limit => {
                warn!(total, limit, "Input exceeds token limit, count truncated");
                TokenCount {
                    tokens: limit,
                    truncated: true,
                }
            }
            _ => TokenCount {
                tokens: total,
                truncated: false,
            },
        }
    }

    /// Split a text into windows of `chunk_size` tokens, each starting
    /// `chunk_size - overlap` tokens after the previous one.
    ///
    /// A token may hold only part of a multi-byte character. Window edges
    /// are moved forward to the next character boundary, so a split
    /// character belongs to the window where it ends.
    pub fn split(&self, text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
        if chunk_size == 0 {
            return Err(CoreError::InvalidChunking("chunk size must be positive".into()));
        }
        if overlap >= chunk_size {
            return Err(CoreError::InvalidChunking(format!(
                "overlap {} must be smaller than chunk size {}",
                overlap, chunk_size
            )));
        }

        let offsets = self.token_offsets(text);
        let token_count = offsets.len() - 1;
        let step = chunk_size - overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < token_count {
            let end = (start + chunk_size).min(token_count);
            let from = next_char_boundary(text, offsets[start]);
            let to = next_char_boundary(text, offsets[end]);
            if from < to {
                chunks.push(text[from..to].to_string());
            }
            if end == token_count {
                break;
            }
            start += step;
        }
        Ok(chunks)
    }

    /// Byte offset where each token starts, followed by the text length
    fn token_offsets(&self, text: &str) -> Vec<usize> {
        let tokens = self.bpe.encode_ordinary(text);
        let mut offsets = Vec::with_capacity(tokens.len() + 1);
        let mut offset: usize = 0;
        offsets.push(offset);
        for bytes in self.bpe._decode_native_and_split(tokens) {
            offset = (offset + bytes.len()).min(text.len());
            offsets.push(offset);
        }
        offsets
    }
}

fn next_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("vocabulary", &"r50k_base")
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_is_stable() {
        let counter = TokenCounter::gpt2().unwrap();
        let a = counter.count("The quick brown fox jumps over the lazy dog.");
        let b = counter.count("The quick brown fox jumps over the lazy dog.");
        assert_eq!(a, b);
        assert!(a > 0);
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn test_limit_truncates_and_flags() {
        let counter = TokenCounter::gpt2().unwrap().with_limit(Some(3));
        let result = counter.count_detailed("one two three four five six seven");
        assert_eq!(result, TokenCount { tokens: 3, truncated: true });

        let short = counter.count_detailed("hi");
        assert!(!short.truncated);
    }

    #[test]
    fn test_split_windows_overlap() {
        let counter = TokenCounter::gpt2().unwrap();
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = counter.split(text, 4, 1).unwrap();
        assert!(chunks.len() >= 2);
        assert!(chunks[0].starts_with("alpha"));
        assert!(chunks.last().unwrap().ends_with("kappa"));
    }

    #[test]
    fn test_split_rejects_bad_parameters() {
        let counter = TokenCounter::gpt2().unwrap();
        assert!(counter.split("text", 0, 0).is_err());
        assert!(counter.split("text", 5, 5).is_err());
    }

    #[test]
    fn test_split_non_ascii_keeps_characters_whole() {
        let counter = TokenCounter::gpt2().unwrap();
        let text = "日本語のテキスト… 🚀🚀🚀 naïve café";
        let chunks = counter.split(text, 3, 1).unwrap();
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(text.contains(chunk.as_str()));
        }
        assert!(chunks[0].starts_with('日'));
        assert!(chunks.last().unwrap().ends_with("café"));

        let rebuilt: String = counter.split(text, 2, 0).unwrap().concat();
        assert_eq!(rebuilt, text);
    }
}
