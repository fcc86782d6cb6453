//! Ollama local server client (`/api/chat`)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::traits::{
    error_from_response, CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError,
    ProviderResult,
};
use super::ProviderKind;

/// Ollama client; no API key
pub struct OllamaClient {
    base_url: String,
    http_client: Client,
    default_model: String,
}

impl OllamaClient {
    pub fn new() -> Self {
        Self {
            base_url: ProviderKind::Ollama.default_base_url().to_string(),
            http_client: Client::new(),
            default_model: ProviderKind::Ollama.default_model().to_string(),
        }
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set default model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Names of the locally installed models
    pub async fn list_models(&self) -> ProviderResult<Vec<String>> {
        let response = self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(self.name(), response, error_message).await);
        }
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: String,
    message: Message,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Deserialize)]
struct OllamaError {
    error: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<OllamaError>(body).ok().map(|e| e.error)
}

#[async_trait]
impl LLMProvider for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let start = Instant::now();

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system_prompt {
            messages.push(Message {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().cloned());

        let body = ChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            messages,
            stream: false,
            options: ChatOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(self.name(), response, error_message).await);
        }

        let text = response.text().await?;
        let api_response: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Parse(e.to_string()))?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let content = api_response.message.content.trim().to_string();
        if content.is_empty() {
            return Err(ProviderError::EmptyResponse(self.name().to_string()));
        }

        Ok(CompletionResponse {
            content,
            model: api_response.model,
            input_tokens: api_response.prompt_eval_count,
            output_tokens: api_response.eval_count,
            finish_reason: api_response.done_reason.unwrap_or_else(|| "unknown".to_string()),
            latency_ms,
        })
    }

    async fn health_check(&self) -> ProviderResult<bool> {
        Ok(self.list_models().await.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{
            "model": "llama3:latest",
            "created_at": "2024-05-01T10:00:00Z",
            "message": {"role": "assistant", "content": "Hello!\n"},
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 26,
            "eval_count": 4
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.message.content, "Hello!\n");
        assert_eq!(parsed.prompt_eval_count, 26);
        assert_eq!(parsed.done_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_request_is_not_streamed() {
        let body = ChatRequest {
            model: "llama3".into(),
            messages: vec![Message::user("hi")],
            stream: false,
            options: ChatOptions {
                num_predict: 64,
                temperature: None,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 64);
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error": "model 'nope' not found"}"#).as_deref(),
            Some("model 'nope' not found")
        );
    }
}
