//! YandexGPT scorer: asks the foundation-models completion API for a score.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sift_core::error::{SiftError, SiftResult};
use sift_core::traits::{parse_score, ScorerConfig, SimilarityScorer};

use crate::prompt::similarity_prompt;

const YANDEX_API_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1";
const DEFAULT_MODEL: &str = "yandexgpt/latest";

/// YandexGPT completion scorer.
pub struct YandexScorer {
    client: Client,
    config: ScorerConfig,
    api_key: String,
    folder_id: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: Vec<YandexMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f32,
    max_tokens: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct YandexMessage {
    role: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    message: YandexMessage,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl YandexScorer {
    /// Create a new YandexGPT scorer.
    ///
    /// Both an API key and a folder id are required; neither missing value
    /// triggers a network call.
    pub fn new(config: ScorerConfig) -> SiftResult<Self> {
        let non_blank = |value: Option<String>, var: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .or_else(|| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        };

        let api_key = non_blank(config.api_key.clone(), "YANDEX_API_KEY");
        let folder_id = non_blank(config.folder_id.clone(), "YANDEX_FOLDER_ID");
        let (Some(api_key), Some(folder_id)) = (api_key, folder_id) else {
            return Err(SiftError::missing_credentials(
                "yandex",
                "YANDEX_API_KEY and YANDEX_FOLDER_ID",
            ));
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SiftError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| YANDEX_API_URL.to_string())
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
            folder_id,
            base_url,
        })
    }

    /// `gpt://<folder>/<model>` as the API expects it.
    pub fn model_uri(&self) -> String {
        format!("gpt://{}/{}", self.folder_id, self.config.model)
    }

    fn build_request(&self, text: &str, topic: &str) -> CompletionRequest {
        CompletionRequest {
            model_uri: self.model_uri(),
            completion_options: CompletionOptions {
                stream: false,
                temperature: self.config.temperature,
                max_tokens: "8".to_string(),
            },
            messages: vec![YandexMessage {
                role: "user".to_string(),
                text: similarity_prompt(text, topic),
            }],
        }
    }
}

fn extract_text(body: &str) -> SiftResult<String> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| SiftError::parse(format!("Failed to parse YandexGPT response: {}", e)))?;

    response
        .result
        .alternatives
        .into_iter()
        .next()
        .map(|alt| alt.message.text)
        .ok_or_else(|| SiftError::parse("YandexGPT response has no alternatives"))
}

#[async_trait]
impl SimilarityScorer for YandexScorer {
    async fn score(&self, text: &str, topic: &str) -> SiftResult<f32> {
        let request = self.build_request(text, topic);

        let response = self
            .client
            .post(format!("{}/completion", self.base_url))
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .header("x-folder-id", &self.folder_id)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SiftError::timeout("YandexGPT request", self.config.timeout_secs)
                } else {
                    SiftError::network(format!("YandexGPT request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SiftError::network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .ok()
                .and_then(|e| e.message.or_else(|| e.error.map(|v| v.to_string())))
                .unwrap_or(body);
            return Err(SiftError::scorer(format!(
                "YandexGPT API error ({}): {}",
                status, message
            )));
        }

        let content = extract_text(&body)?;
        let score = parse_score(&content)?;
        debug!(model = %self.config.model, topic, score, "YandexGPT score");
        Ok(score)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScorerConfig {
        ScorerConfig {
            api_key: Some("yc-key".to_string()),
            folder_id: Some("b1gfolder".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_model_uri() {
        let scorer = YandexScorer::new(config()).unwrap();
        assert_eq!(scorer.model_uri(), "gpt://b1gfolder/yandexgpt/latest");
    }

    #[test]
    fn test_folder_id_required() {
        std::env::remove_var("YANDEX_FOLDER_ID");
        let config = ScorerConfig {
            folder_id: None,
            ..config()
        };
        let err = YandexScorer::new(config).err().unwrap();
        assert_eq!(err.code(), sift_core::ErrorCode::CfgMissingCredentials);
    }

    #[test]
    fn test_request_shape() {
        let scorer = YandexScorer::new(config()).unwrap();
        let request = serde_json::to_value(scorer.build_request("deadline", "дедлайн")).unwrap();
        assert_eq!(request["modelUri"], "gpt://b1gfolder/yandexgpt/latest");
        assert_eq!(request["completionOptions"]["stream"], false);
        assert_eq!(request["messages"][0]["role"], "user");
        assert!(request["messages"][0]["text"].as_str().unwrap().contains("дедлайн"));
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{"result":{"alternatives":[{"message":{"role":"assistant","text":"0.9"},"status":"ALTERNATIVE_STATUS_FINAL"}],"modelVersion":"06.12.2023"}}"#;
        assert_eq!(extract_text(body).unwrap(), "0.9");
        assert!(extract_text(r#"{"result":{"alternatives":[]}}"#).is_err());
    }
}
