//! Provider trait definitions for LLM API clients

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ProviderKind;

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request for a completion from an LLM provider
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: Option<String>,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// Sent through the vendor's native system slot
    pub system_prompt: Option<String>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            model: None,
            messages,
            max_tokens,
            temperature: None,
            system_prompt: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: Option<f32>) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        self.system_prompt = (!system.trim().is_empty()).then_some(system);
        self
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: String,
    pub latency_ms: u64,
}

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} authentication failed ({status}): {message}")]
    Auth {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0} returned an empty response")]
    EmptyResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Map a non-success HTTP status to an error, using the vendor's
    /// error message when one was extracted from the body
    pub fn from_status(
        provider: &str,
        status: u16,
        retry_after_secs: Option<u64>,
        message: String,
    ) -> Self {
        match status {
            429 => ProviderError::RateLimited {
                retry_after_ms: retry_after_secs.unwrap_or(60) * 1000,
            },
            401 | 403 => ProviderError::Auth {
                provider: provider.to_string(),
                status,
                message,
            },
            _ => ProviderError::Api { status, message },
        }
    }
}

/// Read `retry-after` (seconds) and the body of a failed response, then
/// build the matching error
pub(crate) async fn error_from_response<F>(
    provider: &str,
    response: reqwest::Response,
    extract_message: F,
) -> ProviderError
where
    F: FnOnce(&str) -> Option<String>,
{
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body).unwrap_or_else(|| format!("HTTP {}: {}", status, body));
    tracing::debug!(provider, status, "Request failed: {}", message);
    ProviderError::from_status(provider, status, retry_after, message)
}

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Get the provider name (e.g., "groq", "gemini", "ollama")
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Get the default model for this provider
    fn default_model(&self) -> &str;

    /// Send a completion request
    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse>;

    /// Check if the provider is healthy/accessible
    async fn health_check(&self) -> ProviderResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ProviderError::from_status("groq", 429, Some(2), String::new()),
            ProviderError::RateLimited { retry_after_ms: 2000 }
        ));
        assert!(matches!(
            ProviderError::from_status("groq", 429, None, String::new()),
            ProviderError::RateLimited { retry_after_ms: 60_000 }
        ));
        assert!(matches!(
            ProviderError::from_status("gemini", 403, None, "bad key".into()),
            ProviderError::Auth { status: 403, .. }
        ));
        assert!(matches!(
            ProviderError::from_status("ollama", 500, None, "boom".into()),
            ProviderError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_blank_system_prompt_is_dropped() {
        let request = CompletionRequest::new(vec![Message::user("hi")], 16).with_system("  ");
        assert!(request.system_prompt.is_none());
        let request = request.with_system("Be brief.");
        assert_eq!(request.system_prompt.as_deref(), Some("Be brief."));
    }
}
