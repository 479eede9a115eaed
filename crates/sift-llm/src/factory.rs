//! Factory for creating similarity scorers.

use std::sync::Arc;

use sift_core::config::{SemanticConfig, SemanticProvider};
use sift_core::error::{SiftError, SiftResult};
use sift_core::traits::{ScorerConfig, SimilarityScorer};

use crate::openrouter::OpenRouterScorer;
use crate::yandex::YandexScorer;

/// Factory for creating completion-based similarity scorers.
pub struct ScorerFactory;

impl ScorerFactory {
    /// Create a scorer from the given configuration.
    pub fn create(provider: SemanticProvider, config: ScorerConfig) -> SiftResult<Arc<dyn SimilarityScorer>> {
        match provider {
            SemanticProvider::OpenRouter => {
                let scorer = OpenRouterScorer::new(config)?;
                Ok(Arc::new(scorer))
            }
            SemanticProvider::Yandex => {
                let scorer = YandexScorer::new(config)?;
                Ok(Arc::new(scorer))
            }
            _ => Err(SiftError::UnsupportedProvider {
                provider: format!("{:?}", provider),
            }),
        }
    }

    /// Build the scorer selected by the semantic configuration.
    pub fn from_config(config: &SemanticConfig) -> SiftResult<Arc<dyn SimilarityScorer>> {
        Self::create(config.provider, Self::scorer_config(config))
    }

    /// Map the semantic configuration to a scorer configuration.
    pub fn scorer_config(config: &SemanticConfig) -> ScorerConfig {
        match config.provider {
            SemanticProvider::Yandex => ScorerConfig {
                api_key: config.yandex.api_key.clone(),
                folder_id: config.yandex.folder_id.clone(),
                base_url: Some(config.yandex.base_url.clone()),
                timeout_secs: config.request_timeout_secs,
                ..Default::default()
            },
            _ => ScorerConfig {
                model: config.openrouter.model.clone(),
                api_key: config.openrouter.api_key.clone(),
                base_url: Some(config.openrouter.base_url.clone()),
                timeout_secs: config.request_timeout_secs,
                ..Default::default()
            },
        }
    }
}
