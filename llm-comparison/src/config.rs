//! Configuration management for the comparison harness
//!
//! Loads provider, evaluation, report and retrieval settings from a TOML
//! file. Every field has a default so a partial file is valid.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::providers::ProviderKind;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_providers")]
    pub providers: IndexMap<String, ProviderConfig>,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub rag: RagConfig,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub default_model: String,
    /// Models evaluated by `run` when none are given on the command line
    #[serde(default)]
    pub models: Vec<String>,
    /// Override of the vendor endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
}

/// Batch evaluation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_records_file")]
    pub records_file: PathBuf,
}

/// Report generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_true")]
    pub narrate: bool,
    #[serde(default = "default_narrator_provider")]
    pub narrator_provider: String,
    #[serde(default = "default_narrator_model")]
    pub narrator_model: String,
    #[serde(default)]
    pub json_summary: bool,
}

/// Text analysis settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Clamp token counts at this many tokens (unset counts everything)
    #[serde(default)]
    pub token_limit: Option<usize>,
}

/// Retrieval experiment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

// Default value functions
fn default_true() -> bool { true }
fn default_timeout_ms() -> u64 { 120_000 }
fn default_max_tokens() -> u32 { 1024 }
fn default_log_file() -> PathBuf { PathBuf::from("llm_comparison.log") }
fn default_records_file() -> PathBuf { PathBuf::from("llm_comparison.jsonl") }
fn default_output_dir() -> PathBuf { PathBuf::from(".") }
fn default_narrator_provider() -> String { "gemini".to_string() }
fn default_narrator_model() -> String { "gemini-2.0-flash".to_string() }
fn default_embedding_url() -> String { "http://localhost:11434".to_string() }
fn default_embedding_model() -> String { "nomic-embed-text".to_string() }
fn default_top_k() -> usize { 3 }

fn default_providers() -> IndexMap<String, ProviderConfig> {
    ProviderKind::ALL
        .iter()
        .map(|kind| {
            (
                kind.as_str().to_string(),
                ProviderConfig {
                    enabled: true,
                    default_model: kind.default_model().to_string(),
                    models: vec![kind.default_model().to_string()],
                    base_url: None,
                    api_key_env: kind.api_key_env().map(str::to_string),
                },
            )
        })
        .collect()
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: None,
            log_file: default_log_file(),
            records_file: default_records_file(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            narrate: true,
            narrator_provider: default_narrator_provider(),
            narrator_model: default_narrator_model(),
            json_summary: false,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            chunk_size: None,
            chunk_overlap: None,
            top_k: default_top_k(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            evaluation: EvaluationConfig::default(),
            report: ReportConfig::default(),
            analysis: AnalysisConfig::default(),
            rag: RagConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.normalize_provider_keys()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default config locations or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = ["llm-comparison.toml", "config/llm-comparison.toml"];

        for path in &config_paths {
            if !Path::new(path).exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", path);
                    return config;
                }
                Err(e) => tracing::warn!("Ignoring configuration at {}: {}", path, e),
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Provider names must be known kinds
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in self.providers.keys() {
            name.parse::<ProviderKind>()
                .map_err(|_| ConfigError::UnknownProvider(name.clone()))?;
        }
        if self.evaluation.timeout_ms == 0 {
            return Err(ConfigError::Invalid("evaluation.timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// Rename provider sections to their canonical names (`[providers.google]` becomes `gemini`)
    fn normalize_provider_keys(&mut self) -> Result<(), ConfigError> {
        let mut normalized = IndexMap::with_capacity(self.providers.len());
        for (name, provider) in std::mem::take(&mut self.providers) {
            let kind: ProviderKind = name
                .parse()
                .map_err(|_| ConfigError::UnknownProvider(name.clone()))?;
            if normalized.insert(kind.as_str().to_string(), provider).is_some() {
                return Err(ConfigError::Invalid(format!(
                    "provider {} is configured more than once",
                    kind
                )));
            }
        }
        self.providers = normalized;
        Ok(())
    }

    /// Enabled providers, in file order
    pub fn enabled_providers(&self) -> impl Iterator<Item = (ProviderKind, &ProviderConfig)> {
        self.providers
            .iter()
            .filter(|(_, p)| p.enabled)
            .filter_map(|(name, p)| name.parse::<ProviderKind>().ok().map(|k| (k, p)))
    }

    pub fn get_provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        self.providers.get(kind.as_str())
    }

    /// Provider -> models plan built from the enabled providers
    pub fn default_plan(&self) -> IndexMap<String, Vec<String>> {
        self.enabled_providers()
            .map(|(kind, p)| {
                let models = if p.models.is_empty() {
                    vec![p.default_model.clone()]
                } else {
                    p.models.clone()
                };
                (kind.as_str().to_string(), models)
            })
            .collect()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown provider in configuration: {0}")]
    UnknownProvider(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.providers.contains_key("groq"));
        assert!(config.providers.contains_key("gemini"));
        assert!(config.providers.contains_key("ollama"));
        assert_eq!(config.evaluation.timeout_ms, 120_000);
        assert_eq!(config.report.narrator_model, "gemini-2.0-flash");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[providers.ollama]
default_model = "llama3:latest"
models = ["llama3:latest", "mistral"]
base_url = "http://gpu-box:11434"

[providers.groq]
enabled = false
default_model = "llama-3.1-8b-instant"

[evaluation]
timeout_ms = 30000
log_file = "runs/trials.log"

[analysis]
token_limit = 1024
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.evaluation.timeout_ms, 30_000);
        assert_eq!(config.evaluation.log_file, PathBuf::from("runs/trials.log"));
        assert_eq!(config.analysis.token_limit, Some(1024));
        assert_eq!(config.rag.top_k, 3);

        let plan = config.default_plan();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan["ollama"], vec!["llama3:latest", "mistral"]);
    }

    #[test]
    fn test_provider_aliases_are_normalized() {
        let toml = r#"
[providers.google]
default_model = "gemini-1.5-pro"
api_key_env = "MY_GEMINI_KEY"

[providers.Groq]
default_model = "llama-3.1-8b-instant"
"#;
        let config = Config::from_toml(toml).unwrap();
        let gemini = config.get_provider(ProviderKind::Gemini).unwrap();
        assert_eq!(gemini.default_model, "gemini-1.5-pro");
        assert_eq!(gemini.api_key_env.as_deref(), Some("MY_GEMINI_KEY"));
        assert!(config.get_provider(ProviderKind::Groq).is_some());
        assert_eq!(
            config.providers.keys().collect::<Vec<_>>(),
            vec!["gemini", "groq"]
        );
    }

    #[test]
    fn test_duplicate_provider_sections_rejected() {
        let toml = r#"
[providers.gemini]
default_model = "a"

[providers.google]
default_model = "b"
"#;
        assert!(matches!(Config::from_toml(toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let toml = r#"
[providers.anthropic]
default_model = "claude"
"#;
        assert!(matches!(
            Config::from_toml(toml),
            Err(ConfigError::UnknownProvider(name)) if name == "anthropic"
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::default().save_toml(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.providers.len(), 3);
        assert_eq!(loaded.report.narrator_provider, "gemini");
    }
}
