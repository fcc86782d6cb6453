//! LLM provider comparison harness
//!
//! Sends the same question through a set of prompt templates to several
//! providers and models, one trial at a time, and records latency, token
//! usage and readability of every answer. Trials are logged as they finish
//! and can be turned into a per-(provider, model) report, optionally with an
//! LLM-written narrative.
//!
//! # Features
//!
//! - Groq, Gemini and Ollama clients behind one [`providers::LLMProvider`] trait
//! - Per-trial timeouts; a failed trial never stops the batch
//! - Human-readable trial log plus a JSON Lines side channel
//! - Ten readability indices per answer (via `llm_labs`)
//! - A small retrieval experiment for comparing chunking strategies
//!
//! # Example
//!
//! ```no_run
//! use llm_comparison::prelude::*;
//! use llm_labs::TextAnalysisContext;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default();
//!     let ctx = TextAnalysisContext::new()?;
//!     let registry = ProviderRegistry::from_config(&config);
//!
//!     let prompts = PromptLibrary::builtin().select(&["zero_shot", "chain_of_thought"])?;
//!     let mut runner = EvaluationRunner::new(&ctx, RunnerConfig::default())
//!         .with_sink(TextLogWriter::open("llm_comparison.log")?);
//!     let cells = runner
//!         .run(&config.default_plan(), &prompts, "Why is the sky blue?", &registry)
//!         .await;
//!
//!     let report = ReportGenerator::new(".")
//!         .generate(&records_from_cells(&cells), "Why is the sky blue?", None)
//!         .await?;
//!     println!("{}", report.text);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod prompts;
pub mod providers;
pub mod rag;
pub mod reporting;
pub mod runner;
pub mod trial_log;

pub use config::{Config, ConfigError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{group_records, AggregateGroup, MetricSummary};
    pub use crate::config::{Config, ConfigError};
    pub use crate::prompts::{PromptError, PromptLibrary};
    pub use crate::providers::{
        create_provider, CompletionRequest, CompletionResponse, LLMProvider, Message,
        ProviderError, ProviderKind, ProviderNarrator, ProviderRegistry, ProviderResult,
    };
    pub use crate::reporting::{
        print_console_report, GeneratedReport, JsonSummary, Narrator, ReportError, ReportGenerator,
    };
    pub use crate::runner::{
        CompletionBackend, ConsoleProgress, EvaluationCell, EvaluationPlan, EvaluationRunner,
        RunnerConfig, TrialOutcome, TrialSink,
    };
    pub use crate::trial_log::{
        extract_file, read_records, records_from_cells, JsonlRecordWriter, TextLogWriter,
        TrialRecord,
    };
}
