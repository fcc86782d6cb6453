//! Google Gemini API client (`generateContent`)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::traits::{
    error_from_response, CompletionRequest, CompletionResponse, LLMProvider, ProviderError,
    ProviderResult,
};
use super::ProviderKind;

/// Gemini API client
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    http_client: Client,
    default_model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: ProviderKind::Gemini.default_base_url().to_string(),
            http_client: Client::new(),
            default_model: ProviderKind::Gemini.default_model().to_string(),
        }
    }

    /// Create from the `GEMINI_API_KEY` environment variable
    pub fn from_env() -> ProviderResult<Self> {
        Self::from_env_var("GEMINI_API_KEY")
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
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: UsageMetadata,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GeminiError>(body).ok().map(|e| match e.error.status {
        Some(status) => format!("{}: {}", status, e.error.message),
        None => e.error.message,
    })
}

fn text_part(text: &str) -> Part {
    Part {
        text: text.to_string(),
    }
}

#[async_trait]
impl LLMProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let start = Instant::now();

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let contents = request
            .messages
            .iter()
            .map(|m| Content {
                // Gemini calls the assistant role "model"
                role: Some(if m.role == "assistant" { "model" } else { "user" }.to_string()),
                parts: vec![text_part(&m.content)],
            })
            .collect();

        let body = GeminiRequest {
            system_instruction: request.system_prompt.as_deref().map(|s| Content {
                role: None,
                parts: vec![text_part(s)],
            }),
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(self.name(), response, error_message).await);
        }

        let text = response.text().await?;
        let api_response: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Parse(e.to_string()))?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::EmptyResponse(self.name().to_string()))?;

        let content: String = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string();
        if content.is_empty() {
            return Err(ProviderError::EmptyResponse(self.name().to_string()));
        }

        Ok(CompletionResponse {
            content,
            model: api_response.model_version.unwrap_or(model),
            input_tokens: api_response.usage_metadata.prompt_token_count,
            output_tokens: api_response.usage_metadata.candidates_token_count,
            finish_reason: candidate.finish_reason.unwrap_or_else(|| "unknown".to_string()),
            latency_ms,
        })
    }

    async fn health_check(&self) -> ProviderResult<bool> {
        let response = self
            .http_client
            .get(format!("{}/models", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_system_instruction() {
        let body = GeminiRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![text_part("Be concise.")],
            }),
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![text_part("What is Rust?")],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 256,
                temperature: Some(0.2),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be concise.");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_parse_generate_content() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Rust is "}, {"text": "a language."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 5, "totalTokenCount": 12},
            "modelVersion": "gemini-2.0-flash"
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates[0].content.parts.len(), 2);
        assert_eq!(parsed.usage_metadata.candidates_token_count, 5);
        assert_eq!(parsed.candidates[0].finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_blocked_prompt_has_no_candidates() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("INVALID_ARGUMENT: API key not valid.")
        );
    }
}
