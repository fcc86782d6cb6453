//! Evaluation execution engine

pub mod cell;
pub mod executor;

pub use cell::{EvaluationCell, TrialOutcome};
pub use executor::{
    CompletionBackend, ConsoleProgress, EvaluationPlan, EvaluationRunner, NoOpProgress,
    ProgressCallback, PromptSet, RunnerConfig, TrialSink,
};
