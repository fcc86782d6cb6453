//! Loaded text-analysis resources, constructed once and passed by reference

use tracing::debug;

use crate::classifier::{self, PromptType};
use crate::dale_chall::FamiliarWords;
use crate::error::Result;
use crate::readability::ReadabilityScorer;
use crate::text::Segmenter;
use crate::tokens::TokenCounter;

/// Holds the tokenizer vocabulary, the familiar-word list and the
/// segmentation rules used by every analysis call
#[derive(Debug)]
pub struct TextAnalysisContext {
    tokens: TokenCounter,
    familiar: FamiliarWords,
    segmenter: Segmenter,
}

impl TextAnalysisContext {
    /// Load all resources. Token counts are not truncated.
    pub fn new() -> Result<Self> {
        let tokens = TokenCounter::gpt2()?;
        let familiar = FamiliarWords::bundled();
        debug!(familiar_words = familiar.len(), "Loaded text analysis context");
        Ok(Self {
            tokens,
            familiar,
            segmenter: Segmenter::new(),
        })
    }

    /// Clamp token counts at `limit` (None counts every token)
    pub fn with_token_limit(mut self, limit: Option<usize>) -> Self {
        self.tokens = self.tokens.with_limit(limit);
        self
    }

    pub fn token_counter(&self) -> &TokenCounter {
        &self.tokens
    }

    pub fn scorer(&self) -> ReadabilityScorer<'_> {
        ReadabilityScorer::new(self)
    }

    pub fn classify(&self, prompt: &str) -> PromptType {
        classifier::classify(prompt)
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    pub fn familiar_words(&self) -> &FamiliarWords {
        &self.familiar
    }
}
