//! LLM Provider implementations

pub mod gemini;
pub mod groq;
pub mod ollama;
pub mod traits;

pub use gemini::GeminiClient;
pub use groq::GroqClient;
pub use ollama::OllamaClient;
pub use traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult,
};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{Config, ProviderConfig};
use crate::reporting::Narrator;
use crate::runner::CompletionBackend;

/// The supported vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    Gemini,
    Ollama,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Groq, ProviderKind::Gemini, ProviderKind::Ollama];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Environment variable holding the API key, if the vendor needs one
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "llama-3.1-8b-instant",
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::Ollama => "llama3:latest",
        }
    }

    /// Where to browse the vendor's model catalogue
    pub fn models_url(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://console.groq.com/docs/models",
            ProviderKind::Gemini => "https://ai.google.dev/gemini-api/docs/models",
            ProviderKind::Ollama => "https://ollama.com/library",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(ProviderKind::Groq),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(ProviderError::Config(format!("Unknown provider: {}", s))),
        }
    }
}

/// Build a client for one provider, applying config overrides
pub fn create_provider(
    kind: ProviderKind,
    config: Option<&ProviderConfig>,
) -> ProviderResult<Arc<dyn LLMProvider>> {
    let key_var = config
        .and_then(|c| c.api_key_env.as_deref())
        .or(kind.api_key_env());
    let base_url = config.and_then(|c| c.base_url.clone());
    let model = config.map(|c| c.default_model.clone());

    let provider: Arc<dyn LLMProvider> = match kind {
        ProviderKind::Groq => {
            let mut client = GroqClient::from_env_var(key_var.unwrap_or("GROQ_API_KEY"))?;
            if let Some(url) = base_url {
                client = client.with_base_url(url);
            }
            if let Some(model) = model {
                client = client.with_model(model);
            }
            Arc::new(client)
        }
        ProviderKind::Gemini => {
            let mut client = GeminiClient::from_env_var(key_var.unwrap_or("GEMINI_API_KEY"))?;
            if let Some(url) = base_url {
                client = client.with_base_url(url);
            }
            if let Some(model) = model {
                client = client.with_model(model);
            }
            Arc::new(client)
        }
        ProviderKind::Ollama => {
            let mut client = OllamaClient::new();
            if let Some(url) = base_url {
                client = client.with_base_url(url);
            }
            if let Some(model) = model {
                client = client.with_model(model);
            }
            Arc::new(client)
        }
    };
    Ok(provider)
}

/// Configured providers, dispatched by kind
pub struct ProviderRegistry {
    providers: IndexMap<ProviderKind, Arc<dyn LLMProvider>>,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl ProviderRegistry {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            providers: IndexMap::new(),
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn register(&mut self, provider: Arc<dyn LLMProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    /// Create the named providers; config supplies keys, URLs and models
    pub fn for_kinds(kinds: &[ProviderKind], config: &Config) -> ProviderResult<Self> {
        let mut registry =
            Self::new(config.evaluation.max_tokens).with_temperature(config.evaluation.temperature);
        for &kind in kinds {
            registry.register(create_provider(kind, config.get_provider(kind))?);
        }
        Ok(registry)
    }

    /// Create every enabled provider whose credentials are available
    pub fn from_config(config: &Config) -> Self {
        let mut registry =
            Self::new(config.evaluation.max_tokens).with_temperature(config.evaluation.temperature);
        for (kind, pc) in config.enabled_providers() {
            match create_provider(kind, Some(pc)) {
                Ok(provider) => registry.register(provider),
                Err(e) => tracing::warn!("Skipping provider {}: {}", kind, e),
            }
        }
        registry
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn LLMProvider>> {
        self.providers.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn resolve(&self, provider: &str) -> ProviderResult<&Arc<dyn LLMProvider>> {
        let kind: ProviderKind = provider.parse()?;
        self.get(kind)
            .ok_or_else(|| ProviderError::Config(format!("Provider {} is not configured", kind)))
    }

    /// One completion with the prompt template in the system slot
    pub async fn invoke(
        &self,
        provider: &str,
        model: &str,
        system_prompt: &str,
        user_message: &str,
    ) -> ProviderResult<CompletionResponse> {
        let client = self.resolve(provider)?;
        let request = CompletionRequest::new(vec![Message::user(user_message)], self.max_tokens)
            .with_model(model)
            .with_system(system_prompt)
            .with_temperature(self.temperature);
        client.complete(&request).await
    }

    /// Narrator backed by one of the registered providers
    pub fn narrator(&self, provider: &str, model: &str) -> ProviderResult<ProviderNarrator> {
        Ok(ProviderNarrator {
            provider: Arc::clone(self.resolve(provider)?),
            model: model.to_string(),
            max_tokens: self.max_tokens.max(2048),
        })
    }
}

#[async_trait]
impl CompletionBackend for ProviderRegistry {
    async fn complete(
        &self,
        provider: &str,
        model: &str,
        system_prompt: &str,
        user_input: &str,
    ) -> ProviderResult<String> {
        self.invoke(provider, model, system_prompt, user_input)
            .await
            .map(|r| r.content)
    }
}

/// Summarizes a numeric report with an LLM
pub struct ProviderNarrator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: u32,
}

#[async_trait]
impl Narrator for ProviderNarrator {
    async fn summarize(&self, report_text: &str, instruction: &str) -> ProviderResult<String> {
        let request = CompletionRequest::new(vec![Message::user(report_text)], self.max_tokens)
            .with_model(&self.model)
            .with_system(instruction);
        self.provider.complete(&request).await.map(|r| r.content)
    }
}
