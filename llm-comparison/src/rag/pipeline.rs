use serde::Serialize;

use llm_labs::{similarity, Chunker, Similarity, TextAnalysisContext};

use super::embedding::EmbeddingProvider;
use super::RagError;

/// A chunk scored against the query
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub rank: usize,
    pub text: String,
    #[serde(flatten)]
    pub similarity: Similarity,
}

/// Result of one retrieval run
#[derive(Debug, Clone, Serialize)]
pub struct RagOutcome {
    pub strategy: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub chunk_count: usize,
    pub results: Vec<RetrievedChunk>,
}

/// Chunk a document, embed it and rank chunks against a query
pub struct RagPipeline {
    chunker: Chunker,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(chunker: Chunker, top_k: usize) -> Self {
        Self { chunker, top_k }
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    pub async fn run(
        &self,
        ctx: &TextAnalysisContext,
        document: &str,
        query: &str,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<RagOutcome, RagError> {
        let chunks = self.chunker.split(ctx, document)?;
        if chunks.is_empty() {
            return Err(RagError::EmptyDocument);
        }
        tracing::debug!(
            strategy = %self.chunker.strategy(),
            chunks = chunks.len(),
            "Document chunked"
        );

        let vectors = embedder.embed(&chunks).await?;
        let query_vector = embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RagError::Embedding(crate::providers::ProviderError::EmptyResponse(
                    embedder.name().to_string(),
                ))
            })?;

        let results = similarity::rank(&query_vector, &vectors, self.top_k)
            .into_iter()
            .enumerate()
            .map(|(i, similarity)| RetrievedChunk {
                rank: i + 1,
                text: chunks[similarity.index].clone(),
                similarity,
            })
            .collect();

        Ok(RagOutcome {
            strategy: self.chunker.strategy().to_string(),
            chunk_size: self.chunker.chunk_size(),
            chunk_overlap: self.chunker.chunk_overlap(),
            chunk_count: chunks.len(),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderResult;
    use async_trait::async_trait;
    use llm_labs::ChunkStrategy;

    /// Embeds a text as counts of a few marker words
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn name(&self) -> &str {
            "keywords"
        }

        async fn embed(&self, inputs: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
            Ok(inputs
                .iter()
                .map(|text| {
                    let lower = text.to_lowercase();
                    ["rust", "python", "coffee"]
                        .iter()
                        .map(|w| lower.matches(w).count() as f32 + 0.01)
                        .collect()
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_best_chunk_ranks_first() {
        let ctx = TextAnalysisContext::new().unwrap();
        let chunker = Chunker::new(ChunkStrategy::character(), 40, 0).unwrap();
        let pipeline = RagPipeline::new(chunker, 2);
        let document = "Coffee is brewed from beans.\nRust has ownership and borrowing.\nPython is dynamically typed.";

        let outcome = pipeline
            .run(&ctx, document, "How does Rust manage memory?", &KeywordEmbedder)
            .await
            .unwrap();
        assert_eq!(outcome.chunk_count, 3);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].rank, 1);
        assert!(outcome.results[0].text.starts_with("Rust"));
    }

    #[tokio::test]
    async fn test_empty_document() {
        let ctx = TextAnalysisContext::new().unwrap();
        let pipeline = RagPipeline::new(Chunker::with_defaults(ChunkStrategy::recursive()), 3);
        let err = pipeline.run(&ctx, "", "q", &KeywordEmbedder).await.unwrap_err();
        assert!(matches!(err, RagError::EmptyDocument));
    }
}
