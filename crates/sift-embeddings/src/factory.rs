//! Factory for creating embedding providers.

use std::sync::Arc;

use sift_core::config::{SemanticConfig, SemanticProvider};
use sift_core::error::{SiftError, SiftResult};
use sift_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "local")]
use crate::local::LocalEmbedder;
use crate::ollama::OllamaEmbedder;
use crate::openai::OpenAIEmbedder;

/// Factory for creating embedding providers.
pub struct EmbedderFactory;

impl EmbedderFactory {
    /// Create a remote embedder from the given configuration.
    ///
    /// Local models load asynchronously; use [`EmbedderFactory::local`] for them.
    pub fn create(provider: SemanticProvider, config: EmbedderConfig) -> SiftResult<Arc<dyn Embedder>> {
        match provider {
            SemanticProvider::OpenAI => {
                let embedder = OpenAIEmbedder::new(config)?;
                Ok(Arc::new(embedder))
            }
            SemanticProvider::Ollama => {
                let embedder = OllamaEmbedder::new(config)?;
                Ok(Arc::new(embedder))
            }
            _ => Err(SiftError::UnsupportedProvider {
                provider: format!("{:?}", provider),
            }),
        }
    }

    /// Load a local fastembed model.
    #[cfg(feature = "local")]
    pub async fn local(
        model: impl Into<String>,
        cache_dir: impl Into<std::path::PathBuf>,
    ) -> SiftResult<Arc<dyn Embedder>> {
        let embedder = LocalEmbedder::load(model.into(), cache_dir.into()).await?;
        Ok(Arc::new(embedder))
    }

    /// Build the embedder selected by the semantic configuration.
    pub async fn from_config(config: &SemanticConfig) -> SiftResult<Arc<dyn Embedder>> {
        match config.provider {
            #[cfg(feature = "local")]
            SemanticProvider::Local => Self::local(config.model.clone(), config.cache_dir.clone()).await,
            SemanticProvider::OpenAI | SemanticProvider::Ollama => {
                Self::create(config.provider, Self::embedder_config(config))
            }
            other => Err(SiftError::UnsupportedProvider {
                provider: format!("{:?}", other),
            }),
        }
    }

    /// Map the semantic configuration to a remote embedder configuration.
    pub fn embedder_config(config: &SemanticConfig) -> EmbedderConfig {
        match config.provider {
            SemanticProvider::Ollama => EmbedderConfig {
                model: config.ollama.model.clone(),
                embedding_dims: 0,
                api_key: None,
                base_url: Some(config.ollama.base_url.clone()),
                timeout_secs: config.request_timeout_secs,
            },
            _ => EmbedderConfig {
                model: config.openai.model.clone(),
                api_key: config.openai.api_key.clone(),
                base_url: config.openai.base_url.clone(),
                timeout_secs: config.request_timeout_secs,
                ..Default::default()
            },
        }
    }
}
