//! Wiring semantic backends and the filter engine from configuration.

use std::sync::Arc;

use sift_core::config::{SemanticConfig, SemanticProvider};
use sift_core::error::SiftResult;
use sift_core::matching::{FilterEngine, LazyBackend};
use sift_core::traits::{EmbeddingBackend, ScorerBackend, SimilarityBackend};

use sift_embeddings::EmbedderFactory;
use sift_llm::ScorerFactory;

/// Create the process-wide backend handle for the configured provider.
///
/// Nothing is built until the first semantic evaluation. Missing credentials
/// or a model that fails to load leave the handle permanently unavailable.
pub fn create_backend(config: &SemanticConfig) -> LazyBackend {
    let provider = format!("{:?}", config.provider).to_lowercase();
    let config = config.clone();
    LazyBackend::new(provider, move || {
        let config = config.clone();
        async move { build_backend(&config).await }
    })
}

/// Build the configured backend now.
pub async fn build_backend(config: &SemanticConfig) -> SiftResult<Arc<dyn SimilarityBackend>> {
    match config.provider {
        SemanticProvider::Local | SemanticProvider::OpenAI | SemanticProvider::Ollama => {
            let embedder = EmbedderFactory::from_config(config).await?;
            Ok(Arc::new(EmbeddingBackend::new(embedder)))
        }
        SemanticProvider::OpenRouter | SemanticProvider::Yandex => {
            let scorer = ScorerFactory::from_config(config)?;
            Ok(Arc::new(ScorerBackend::new(scorer)))
        }
    }
}

/// Create a filter engine over a lazily built backend.
pub fn create_engine(config: &SemanticConfig) -> FilterEngine {
    FilterEngine::new(Arc::new(create_backend(config)), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::error::SiftError;

    #[tokio::test]
    async fn test_backend_is_lazy() {
        let mut config = SemanticConfig::default();
        config.provider = SemanticProvider::OpenRouter;
        config.openrouter.api_key = Some("or-key".to_string());

        let backend = create_backend(&config);
        assert_eq!(backend.provider(), "openrouter");
        assert!(!backend.is_initialized());

        let built = backend.get().await.unwrap();
        assert!(backend.is_initialized());
        assert_eq!(built.name(), "qwen/qwen-2.5-7b-instruct");
    }

    #[tokio::test]
    async fn test_missing_credentials_leave_backend_unavailable() {
        std::env::remove_var("YANDEX_API_KEY");
        std::env::remove_var("YANDEX_FOLDER_ID");
        let mut config = SemanticConfig::default();
        config.provider = SemanticProvider::Yandex;

        let backend = create_backend(&config);
        let err = backend.get().await.err().unwrap();
        assert!(matches!(err, SiftError::Unavailable(ref msg) if msg.contains("YANDEX_API_KEY")));
    }

    #[tokio::test]
    async fn test_engine_without_credentials_never_matches_semantically() {
        std::env::remove_var("OPENAI_API_KEY");
        let mut config = SemanticConfig::default();
        config.provider = SemanticProvider::OpenAI;
        config.openai.api_key = None;

        let engine = create_engine(&config);
        let filters = vec![
            sift_core::Filter::semantic(1, 10, "встреча"),
            sift_core::Filter::keywords(2, 10, "собрание"),
        ];
        let decision = engine.evaluate("Собрание в 15:00", &filters).await;
        assert!(decision.forward);
        assert_eq!(decision.matched.map(|m| m.filter_id), Some(2));
    }
}
