//! LLM Labs - text analysis for comparing language model output
//!
//! Readability indices, prompt classification, token counting and text
//! chunking. All loaded resources live in a [`TextAnalysisContext`] that is
//! built once and passed by reference.
//!
//! # Example
//!
//! ```no_run
//! use llm_labs::{Metric, PromptType, TextAnalysisContext};
//!
//! let ctx = TextAnalysisContext::new().unwrap();
//! let report = ctx.scorer().score("The cat sat. The dog ran.");
//! println!("{}", report.get(Metric::FleschReadingEase));
//!
//! assert_eq!(ctx.classify("Solve this equation"), PromptType::Math);
//! let tokens = ctx.token_counter().count("Hello world");
//! ```

pub mod chunking;
pub mod classifier;
pub mod context;
pub mod dale_chall;
pub mod error;
pub mod readability;
pub mod similarity;
pub mod text;
pub mod tokens;

pub use chunking::{ChunkStrategy, Chunker};
pub use classifier::{classify, PromptType};
pub use context::TextAnalysisContext;
pub use error::{CoreError, Result};
pub use readability::{round2, Metric, ReadabilityReport, ReadabilityScorer, Score, ScoredText};
pub use similarity::Similarity;
pub use text::{Segmenter, TextStatistics};
pub use tokens::{TokenCount, TokenCounter};
