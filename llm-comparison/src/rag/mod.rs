//! Retrieval experiment: load, chunk, embed and rank

pub mod embedding;
pub mod loader;
pub mod pipeline;

pub use embedding::{EmbeddingProvider, OllamaEmbedder};
pub use loader::load_document;
pub use pipeline::{RagOutcome, RagPipeline, RetrievedChunk};

use std::path::PathBuf;
use thiserror::Error;

use crate::providers::ProviderError;

/// Retrieval experiment errors
#[derive(Debug, Error)]
pub enum RagError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Chunking(#[from] llm_labs::CoreError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] ProviderError),

    #[error("Document produced no chunks")]
    EmptyDocument,
}
