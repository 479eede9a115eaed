//! Ollama embedding provider implementation.

use async_trait::async_trait;

use sift_core::error::{SiftError, SiftResult};
use sift_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "ollama")]
use ollama_rs::{
    generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest},
    Ollama,
};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama embedding provider.
pub struct OllamaEmbedder {
    #[cfg(feature = "ollama")]
    client: Ollama,
    config: EmbedderConfig,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder.
    pub fn new(config: EmbedderConfig) -> SiftResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let url = url::Url::parse(&base_url)
            .map_err(|e| SiftError::Configuration(format!("Invalid Ollama URL {}: {}", base_url, e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| SiftError::Configuration(format!("Ollama URL has no host: {}", base_url)))?;
        let port = url.port().unwrap_or(11434);

        #[cfg(feature = "ollama")]
        let client = Ollama::new(format!("{}://{}", url.scheme(), host), port);

        #[cfg(not(feature = "ollama"))]
        {
            let _ = (host, port);
            return Err(SiftError::Configuration(
                "Ollama feature not enabled. Enable the 'ollama' feature.".to_string(),
            ));
        }

        #[cfg(feature = "ollama")]
        Ok(Self { client, config })
    }
}

#[cfg(feature = "ollama")]
impl OllamaEmbedder {
    async fn request(&self, input: EmbeddingsInput) -> SiftResult<Vec<Vec<f32>>> {
        let request = GenerateEmbeddingsRequest::new(self.config.model.clone(), input);

        let response = tokio::time::timeout(
            std::time::Duration::from_secs(self.config.timeout_secs),
            self.client.generate_embeddings(request),
        )
        .await
        .map_err(|_| SiftError::timeout("Ollama embedding request", self.config.timeout_secs))?
        .map_err(|e| SiftError::embedding(format!("Ollama embedding error: {}", e)))?;

        Ok(response.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[cfg(feature = "ollama")]
    async fn embed(&self, text: &str) -> SiftResult<Vec<f32>> {
        self.request(EmbeddingsInput::Single(text.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SiftError::embedding("No embedding returned"))
    }

    #[cfg(not(feature = "ollama"))]
    async fn embed(&self, _text: &str) -> SiftResult<Vec<f32>> {
        Err(SiftError::Configuration(
            "Ollama feature not enabled. Enable the 'ollama' feature.".to_string(),
        ))
    }

    #[cfg(feature = "ollama")]
    async fn embed_batch(&self, texts: &[String]) -> SiftResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.request(EmbeddingsInput::Multiple(texts.to_vec())).await
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(all(test, feature = "ollama"))]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        let config = EmbedderConfig {
            model: "nomic-embed-text".to_string(),
            base_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(OllamaEmbedder::new(config).is_err());
    }

    #[test]
    fn test_default_url() {
        let config = EmbedderConfig {
            model: "nomic-embed-text".to_string(),
            embedding_dims: 768,
            ..Default::default()
        };
        let embedder = OllamaEmbedder::new(config).unwrap();
        assert_eq!(embedder.model_name(), "nomic-embed-text");
        assert_eq!(embedder.dimension(), 768);
    }
}
