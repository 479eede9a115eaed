//! OpenRouter scorer: asks a chat model for a similarity score.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sift_core::error::{SiftError, SiftResult};
use sift_core::traits::{parse_score, ScorerConfig, SimilarityScorer};

use crate::prompt::similarity_prompt;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "qwen/qwen-2.5-7b-instruct";

/// OpenRouter chat-completion scorer.
pub struct OpenRouterScorer {
    client: Client,
    config: ScorerConfig,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenRouterScorer {
    /// Create a new OpenRouter scorer.
    ///
    /// Fails without a network call when no API key is configured.
    pub fn new(config: ScorerConfig) -> SiftResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok().filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| SiftError::missing_credentials("openrouter", "OPENROUTER_API_KEY"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SiftError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| OPENROUTER_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            client,
            config,
            api_key,
            base_url,
        })
    }

    fn build_request(&self, text: &str, topic: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: similarity_prompt(text, topic),
            }],
            temperature: self.config.temperature,
            max_tokens: 8,
        }
    }
}

/// Pull the assistant's text out of a chat-completion body.
fn extract_content(body: &str) -> SiftResult<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| SiftError::parse(format!("Failed to parse OpenRouter response: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| SiftError::parse("OpenRouter response has no choices"))
}

#[async_trait]
impl SimilarityScorer for OpenRouterScorer {
    async fn score(&self, text: &str, topic: &str) -> SiftResult<f32> {
        let request = self.build_request(text, topic);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SiftError::timeout("OpenRouter request", self.config.timeout_secs)
                } else {
                    SiftError::network(format!("OpenRouter request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SiftError::network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(SiftError::scorer(format!(
                "OpenRouter API error ({}): {}",
                status, message
            )));
        }

        let content = extract_content(&body)?;
        let score = parse_score(&content)?;
        debug!(model = %self.config.model, topic, score, "OpenRouter score");
        Ok(score)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> OpenRouterScorer {
        OpenRouterScorer::new(ScorerConfig {
            api_key: Some("or-test".to_string()),
            base_url: Some("https://openrouter.example/api/v1/".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let scorer = scorer();
        assert_eq!(scorer.model_name(), DEFAULT_MODEL);
        assert_eq!(scorer.base_url, "https://openrouter.example/api/v1");
    }

    #[test]
    fn test_missing_key() {
        std::env::remove_var("OPENROUTER_API_KEY");
        let err = OpenRouterScorer::new(ScorerConfig::default()).err().unwrap();
        assert_eq!(err.code(), sift_core::ErrorCode::CfgMissingCredentials);
    }

    #[test]
    fn test_request_shape() {
        let request = serde_json::to_value(scorer().build_request("Собрание в 15:00", "встреча")).unwrap();
        assert_eq!(request["model"], DEFAULT_MODEL);
        assert_eq!(request["messages"][0]["role"], "user");
        assert!(request["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("встреча"));
        assert!((request["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"id":"gen-1","choices":[{"index":0,"message":{"role":"assistant","content":" 0.82 "}}]}"#;
        let content = extract_content(body).unwrap();
        assert!((parse_score(&content).unwrap() - 0.82).abs() < 1e-6);
    }

    #[test]
    fn test_extract_content_errors() {
        assert!(extract_content(r#"{"choices":[]}"#).is_err());
        assert!(extract_content("<html>bad gateway</html>").is_err());
    }
}
