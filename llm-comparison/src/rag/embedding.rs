//! Text embedding backends

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::providers::traits::error_from_response;
use crate::providers::{ProviderError, ProviderKind, ProviderResult};

/// Turns texts into vectors, one per input, in input order
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn embed(&self, inputs: &[String]) -> ProviderResult<Vec<Vec<f32>>>;
}

/// Ollama `/api/embed` client
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    http_client: Client,
}

impl OllamaEmbedder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: ProviderKind::Ollama.default_base_url().to_string(),
            model: model.into(),
            http_client: Client::new(),
        }
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct EmbedError {
    error: String,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed(&self, inputs: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .http_client
            .post(format!("{}/api/embed", self.base_url))
            .json(&EmbedRequest {
                model: &self.model,
                input: inputs,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(self.name(), response, |body| {
                serde_json::from_str::<EmbedError>(body).ok().map(|e| e.error)
            })
            .await);
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        if parsed.embeddings.len() != inputs.len() {
            return Err(ProviderError::Parse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let inputs = vec!["a".to_string(), "b".to_string()];
        let json = serde_json::to_value(EmbedRequest {
            model: "nomic-embed-text",
            input: &inputs,
        })
        .unwrap();
        assert_eq!(json["model"], "nomic-embed-text");
        assert_eq!(json["input"][1], "b");
    }

    #[test]
    fn test_parse_response() {
        let parsed: EmbedResponse =
            serde_json::from_str(r#"{"model":"m","embeddings":[[0.1,0.2],[0.3,0.4]]}"#).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[1][0], 0.3);
    }
}
