//! Configuration system for sift.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{SiftError, SiftResult};

/// Semantic backend selection. Exactly one is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SemanticProvider {
    /// Local sentence-embedding model.
    #[default]
    Local,
    /// OpenAI embeddings API.
    OpenAI,
    /// Ollama embeddings API.
    Ollama,
    /// OpenRouter chat completion returning a similarity score.
    OpenRouter,
    /// YandexGPT completion returning a similarity score.
    Yandex,
}

impl SemanticProvider {
    /// Parse a provider name as it appears in `SEMANTIC_PROVIDER`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "local" => Some(Self::Local),
            "openai" => Some(Self::OpenAI),
            "ollama" => Some(Self::Ollama),
            "openrouter" => Some(Self::OpenRouter),
            "yandex" | "yandexgpt" => Some(Self::Yandex),
            _ => None,
        }
    }

    /// Whether this provider talks to a remote API that needs credentials.
    pub fn requires_credentials(&self) -> bool {
        matches!(self, Self::OpenAI | Self::OpenRouter | Self::Yandex)
    }
}

/// Semantic matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Active backend.
    pub provider: SemanticProvider,
    /// Model identifier for the local backend.
    pub model: String,
    /// Threshold applied to texts of four or more tokens.
    pub base_threshold: f32,
    /// Deadline for a single backend call.
    pub request_timeout_secs: u64,
    /// Directory holding downloaded local models.
    pub cache_dir: PathBuf,
    /// Enable the cross-topic clause of the false-positive check.
    pub cross_topic_guard: bool,
    /// OpenAI embeddings settings.
    pub openai: OpenAISettings,
    /// Ollama embeddings settings.
    pub ollama: OllamaSettings,
    /// OpenRouter scorer settings.
    pub openrouter: OpenRouterSettings,
    /// YandexGPT scorer settings.
    pub yandex: YandexSettings,
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("sift"))
        .unwrap_or_else(|| PathBuf::from(".sift"))
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            provider: SemanticProvider::Local,
            model: "paraphrase-multilingual-minilm-l12-v2".to_string(),
            base_threshold: 0.25,
            request_timeout_secs: 30,
            cache_dir: default_cache_dir(),
            cross_topic_guard: false,
            openai: OpenAISettings::default(),
            ollama: OllamaSettings::default(),
            openrouter: OpenRouterSettings::default(),
            yandex: YandexSettings::default(),
        }
    }
}

impl SemanticConfig {
    /// Backend call deadline as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// OpenAI embeddings settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            base_url: None,
        }
    }
}

/// Ollama embeddings settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
        }
    }
}

/// OpenRouter scorer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenRouterSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for OpenRouterSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "qwen/qwen-2.5-7b-instruct".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
        }
    }
}

/// YandexGPT scorer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YandexSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    pub base_url: String,
}

impl Default for YandexSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            folder_id: None,
            base_url: "https://llm.api.cloud.yandex.net/foundationModels/v1".to_string(),
        }
    }
}

/// Retry policy for forward delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts on transient errors
    pub max_retries: u32,
    /// Initial delay before first retry (milliseconds)
    pub initial_delay_ms: u64,
    /// Maximum delay between retries (milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 2.0_f32,
        }
    }
}

/// Relay (forwarding collaborator) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Minimum spacing between forwards to the same destination.
    pub min_forward_interval_ms: u64,
    /// Retry policy for transient transport errors.
    pub retry_policy: RetryPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            min_forward_interval_ms: 2_000,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl RelayConfig {
    /// Minimum forward spacing as a duration.
    pub fn min_forward_interval(&self) -> Duration {
        Duration::from_millis(self.min_forward_interval_ms)
    }
}

/// Main sift configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SiftConfig {
    /// Semantic matching configuration.
    pub semantic: SemanticConfig,
    /// Relay configuration.
    pub relay: RelayConfig,
}

impl SiftConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> SiftResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| SiftError::Configuration(e.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| SiftError::Configuration(e.to_string()))
            }
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| SiftError::Configuration(e.to_string()))
            }
            _ => Err(SiftError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay environment variables on top of this configuration.
    ///
    /// Unparseable values leave the current setting untouched.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let semantic = &mut self.semantic;

        if let Some(provider) = var("SEMANTIC_PROVIDER") {
            match SemanticProvider::parse(&provider) {
                Some(p) => semantic.provider = p,
                None => tracing::warn!(provider = %provider, "Unknown SEMANTIC_PROVIDER, keeping {:?}", semantic.provider),
            }
        }
        if let Some(model) = var("SEMANTIC_MODEL") {
            semantic.model = model;
        }
        if let Some(threshold) = var("SEMANTIC_THRESHOLD").and_then(|v| v.trim().parse().ok()) {
            semantic.base_threshold = threshold;
        }
        if let Some(secs) = var("SEMANTIC_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            semantic.request_timeout_secs = secs;
        }
        if let Some(dir) = var("SEMANTIC_CACHE_DIR") {
            semantic.cache_dir = PathBuf::from(dir);
        }
        if let Some(flag) = var("SEMANTIC_CROSS_TOPIC_GUARD") {
            semantic.cross_topic_guard = matches!(flag.trim(), "1" | "true" | "yes" | "on");
        }

        if let Some(key) = var("OPENAI_API_KEY") {
            semantic.openai.api_key = Some(key);
        }
        if let Some(model) = var("OPENAI_MODEL") {
            semantic.openai.model = model;
        }
        if let Some(url) = var("OLLAMA_BASE_URL") {
            semantic.ollama.base_url = url;
        }
        if let Some(key) = var("OPENROUTER_API_KEY") {
            semantic.openrouter.api_key = Some(key);
        }
        if let Some(model) = var("OPENROUTER_MODEL") {
            semantic.openrouter.model = model;
        }
        if let Some(key) = var("YANDEX_API_KEY") {
            semantic.yandex.api_key = Some(key);
        }
        if let Some(folder) = var("YANDEX_FOLDER_ID") {
            semantic.yandex.folder_id = Some(folder);
        }

        if let Some(ms) = var("FORWARD_MIN_INTERVAL_MS").and_then(|v| v.trim().parse().ok()) {
            self.relay.min_forward_interval_ms = ms;
        }
    }

    /// Report configuration problems that do not prevent startup.
    ///
    /// A selected remote provider without credentials is reported here; at
    /// match time it simply never matches.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let semantic = &self.semantic;

        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());

        match semantic.provider {
            SemanticProvider::OpenAI if blank(&semantic.openai.api_key) => {
                warnings.push("OPENAI_API_KEY is not set; semantic filters will never match".to_string());
            }
            SemanticProvider::OpenRouter if blank(&semantic.openrouter.api_key) => {
                warnings.push("OPENROUTER_API_KEY is not set; semantic filters will never match".to_string());
            }
            SemanticProvider::Yandex
                if blank(&semantic.yandex.api_key) || blank(&semantic.yandex.folder_id) =>
            {
                warnings.push(
                    "YANDEX_API_KEY or YANDEX_FOLDER_ID is not set; semantic filters will never match"
                        .to_string(),
                );
            }
            _ => {}
        }

        if !(0.0..=1.0).contains(&semantic.base_threshold) {
            warnings.push(format!(
                "semantic.base_threshold {} is outside [0, 1]",
                semantic.base_threshold
            ));
        }

        warnings
    }
}
