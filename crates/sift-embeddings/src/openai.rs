//! OpenAI embedding provider implementation.

use async_trait::async_trait;
use tracing::debug;

use sift_core::error::{SiftError, SiftResult};
use sift_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};

/// OpenAI embedding provider.
pub struct OpenAIEmbedder {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: EmbedderConfig,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder.
    ///
    /// Fails without a network call when no API key is configured.
    pub fn new(config: EmbedderConfig) -> SiftResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| SiftError::missing_credentials("openai", "OPENAI_API_KEY"))?;

        #[cfg(feature = "openai")]
        let client = {
            let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
            if let Some(ref base_url) = config.base_url {
                openai_config = openai_config.with_api_base(base_url);
            }

            let http = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_secs))
                .build()
                .map_err(|e| SiftError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

            Client::with_config(openai_config).with_http_client(http)
        };

        #[cfg(not(feature = "openai"))]
        {
            let _ = api_key;
            return Err(SiftError::Configuration(
                "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
            ));
        }

        #[cfg(feature = "openai")]
        Ok(Self { client, config })
    }
}

#[cfg(feature = "openai")]
impl OpenAIEmbedder {
    async fn request(&self, input: EmbeddingInput) -> SiftResult<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequest {
            model: self.config.model.clone(),
            input,
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| SiftError::embedding(format!("OpenAI embedding error: {}", e)))?;

        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[cfg(feature = "openai")]
    async fn embed(&self, text: &str) -> SiftResult<Vec<f32>> {
        self.request(EmbeddingInput::String(text.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SiftError::embedding("No embedding returned"))
    }

    #[cfg(not(feature = "openai"))]
    async fn embed(&self, _text: &str) -> SiftResult<Vec<f32>> {
        Err(SiftError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    #[cfg(feature = "openai")]
    async fn embed_batch(&self, texts: &[String]) -> SiftResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        debug!(model = %self.config.model, count = texts.len(), "Requesting OpenAI embeddings");

        let embeddings = self.request(EmbeddingInput::StringArray(texts.to_vec())).await?;
        if embeddings.len() != texts.len() {
            return Err(SiftError::embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(all(test, feature = "openai"))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_configuration_error() {
        std::env::remove_var("OPENAI_API_KEY");
        let config = EmbedderConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        let err = OpenAIEmbedder::new(config).err().unwrap();
        assert_eq!(err.code(), sift_core::ErrorCode::CfgMissingCredentials);
    }

    #[test]
    fn test_explicit_key() {
        let config = EmbedderConfig {
            api_key: Some("sk-test".to_string()),
            base_url: Some("http://localhost:9999/v1".to_string()),
            ..Default::default()
        };
        let embedder = OpenAIEmbedder::new(config).unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
        assert_eq!(embedder.dimension(), 1536);
    }
}
