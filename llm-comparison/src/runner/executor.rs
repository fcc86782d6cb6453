//! Sequential evaluation of provider x model x prompt trials

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use std::time::{Duration, Instant};

use llm_labs::{ReadabilityReport, TextAnalysisContext};

use super::cell::{EvaluationCell, TrialOutcome};
use crate::providers::{ProviderError, ProviderResult};

/// Provider name -> models, iterated in insertion order
pub type EvaluationPlan = IndexMap<String, Vec<String>>;

/// Prompt name -> template text, iterated in insertion order
pub type PromptSet = IndexMap<String, String>;

/// Model invocation capability used by the runner
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        provider: &str,
        model: &str,
        system_prompt: &str,
        user_input: &str,
    ) -> ProviderResult<String>;
}

/// Receives every finished trial before the next one starts
pub trait TrialSink: Send {
    fn record(&mut self, cell: &EvaluationCell, index: usize, total: usize) -> std::io::Result<()>;
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Per-trial timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { timeout_ms: 120_000 }
    }
}

/// Runs every trial of a plan, one at a time
pub struct EvaluationRunner<'ctx> {
    ctx: &'ctx TextAnalysisContext,
    config: RunnerConfig,
    sinks: Vec<Box<dyn TrialSink + 'ctx>>,
    progress: Box<dyn ProgressCallback + 'ctx>,
}

impl<'ctx> EvaluationRunner<'ctx> {
    pub fn new(ctx: &'ctx TextAnalysisContext, config: RunnerConfig) -> Self {
        Self {
            ctx,
            config,
            sinks: Vec::new(),
            progress: Box::new(NoOpProgress),
        }
    }

    pub fn with_sink(mut self, sink: impl TrialSink + 'ctx) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressCallback + 'ctx) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Run all trials in provider -> model -> prompt order.
    ///
    /// Always returns one cell per trial; a failed trial is recorded as a
    /// failed cell and the run continues.
    pub async fn run(
        &mut self,
        plan: &EvaluationPlan,
        prompts: &PromptSet,
        user_input: &str,
        backend: &dyn CompletionBackend,
    ) -> Vec<EvaluationCell> {
        let total = plan.values().map(|models| models.len()).sum::<usize>() * prompts.len();
        let mut cells = Vec::with_capacity(total);

        for (provider, models) in plan {
            for model in models {
                for (prompt_name, prompt) in prompts {
                    let index = cells.len() + 1;
                    self.progress.on_trial_start(index, total, provider, model, prompt_name);

                    let cell = self
                        .run_trial(provider, model, prompt_name, prompt, user_input, backend)
                        .await;

                    for sink in &mut self.sinks {
                        if let Err(e) = sink.record(&cell, index, total) {
                            tracing::warn!("Failed to record trial {}/{}: {}", index, total, e);
                        }
                    }
                    self.progress.on_trial_complete(index, total, &cell);
                    cells.push(cell);
                }
            }
        }

        let failed = cells.iter().filter(|c| !c.is_success()).count();
        tracing::info!(total, failed, "Evaluation finished");
        cells
    }

    async fn run_trial(
        &self,
        provider: &str,
        model: &str,
        prompt_name: &str,
        prompt: &str,
        user_input: &str,
        backend: &dyn CompletionBackend,
    ) -> EvaluationCell {
        let timestamp = Utc::now();
        let start = Instant::now();
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let result = match tokio::time::timeout(
            timeout,
            backend.complete(provider, model, prompt, user_input),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }),
        };
        let elapsed = start.elapsed().as_secs_f64();

        let prompt_type = self.ctx.classify(prompt);

        match result {
            Ok(text) => {
                let tokens = self.ctx.token_counter();
                let input = format!("{}{}", user_input, prompt);
                EvaluationCell {
                    timestamp,
                    provider: provider.to_string(),
                    model: model.to_string(),
                    prompt_name: prompt_name.to_string(),
                    prompt_type,
                    prompt_length_words: prompt.split_whitespace().count(),
                    input_tokens: tokens.count(&input),
                    output_tokens: tokens.count(&text),
                    response_time_seconds: Some((elapsed * 1000.0).round() / 1000.0),
                    response_words: text.split_whitespace().count(),
                    readability: self.ctx.scorer().score(&text),
                    response: TrialOutcome::Completed(text),
                }
            }
            Err(e) => {
                tracing::error!("Error on {}/{} with prompt {}: {}", provider, model, prompt_name, e);
                EvaluationCell {
                    timestamp,
                    provider: provider.to_string(),
                    model: model.to_string(),
                    prompt_name: prompt_name.to_string(),
                    prompt_type,
                    prompt_length_words: 0,
                    input_tokens: 0,
                    output_tokens: 0,
                    response: TrialOutcome::Failed(e.to_string()),
                    response_time_seconds: None,
                    response_words: 0,
                    readability: ReadabilityReport::unavailable(),
                }
            }
        }
    }
}

/// Progress callback for tracking execution
pub trait ProgressCallback: Send {
    fn on_trial_start(&self, index: usize, total: usize, provider: &str, model: &str, prompt: &str);
    fn on_trial_complete(&self, index: usize, total: usize, cell: &EvaluationCell);
}

/// Default no-op progress callback
pub struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_trial_start(&self, _index: usize, _total: usize, _provider: &str, _model: &str, _prompt: &str) {}
    fn on_trial_complete(&self, _index: usize, _total: usize, _cell: &EvaluationCell) {}
}

/// Console progress callback
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_trial_start(&self, index: usize, total: usize, provider: &str, model: &str, prompt: &str) {
        println!("[{}/{}] {} / {} / {}...", index, total, provider, model, prompt);
    }

    fn on_trial_complete(&self, _index: usize, _total: usize, cell: &EvaluationCell) {
        match (cell.error(), cell.response_time_seconds) {
            (None, Some(secs)) => println!(
                "  OK in {:.2}s, tokens {}/{}, type {}",
                secs, cell.input_tokens, cell.output_tokens, cell.prompt_type
            ),
            (Some(err), _) => println!("  FAILED: {}", err),
            (None, None) => println!("  OK"),
        }
    }
}
