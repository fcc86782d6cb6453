//! Groq API client (OpenAI-compatible chat completions)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::traits::{
    error_from_response, CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError,
    ProviderResult,
};
use super::ProviderKind;

/// Groq API client
pub struct GroqClient {
    api_key: String,
    base_url: String,
    http_client: Client,
    default_model: String,
}

impl GroqClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: ProviderKind::Groq.default_base_url().to_string(),
            http_client: Client::new(),
            default_model: ProviderKind::Groq.default_model().to_string(),
        }
    }

    /// Create from the `GROQ_API_KEY` environment variable
    pub fn from_env() -> ProviderResult<Self> {
        Self::from_env_var("GROQ_API_KEY")
    }

    pub fn from_env_var(var: &str) -> ProviderResult<Self> {
        let api_key = std::env::var(var)
            .map_err(|_| ProviderError::Config(format!("{} not set", var)))?;
        Ok(Self::new(api_key))
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
}

#[derive(Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl From<&Message> for GroqMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.clone(),
            content: Some(msg.content.clone()),
        }
    }
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: GroqUsage,
}

#[derive(Deserialize)]
struct Choice {
    message: GroqMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct GroqUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct GroqError {
    error: GroqErrorDetail,
}

#[derive(Deserialize)]
struct GroqErrorDetail {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GroqError>(body).ok().map(|e| e.error.message)
}

#[async_trait]
impl LLMProvider for GroqClient {
    fn name(&self) -> &str {
        "groq"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Groq
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let start = Instant::now();

        let mut messages: Vec<GroqMessage> = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(GroqMessage {
                role: "system".to_string(),
                content: Some(system.clone()),
            });
        }
        messages.extend(request.messages.iter().map(GroqMessage::from));

        let body = GroqRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(self.name(), response, error_message).await);
        }

        let text = response.text().await?;
        let api_response: GroqResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Parse(e.to_string()))?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

        let content = choice.message.content.unwrap_or_default().trim().to_string();
        if content.is_empty() {
            return Err(ProviderError::EmptyResponse(self.name().to_string()));
        }

        Ok(CompletionResponse {
            content,
            model: api_response.model,
            input_tokens: api_response.usage.prompt_tokens,
            output_tokens: api_response.usage.completion_tokens,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "unknown".to_string()),
            latency_ms,
        })
    }

    async fn health_check(&self) -> ProviderResult<bool> {
        let response = self
            .http_client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_completion() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "llama-3.1-8b-instant",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": " Paris. "}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let parsed: GroqResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.usage.prompt_tokens, 12);
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some(" Paris. "));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Invalid API Key"));
        assert!(error_message("<html>").is_none());
    }

    #[test]
    fn test_request_serialization() {
        let msg: GroqMessage = (&Message::user("hello")).into();
        assert_eq!(msg.role, "user");
        let json = serde_json::to_value(GroqRequest {
            model: "m".into(),
            messages: vec![msg],
            max_tokens: 10,
            temperature: None,
        })
        .unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["content"], "hello");
    }
}
