//! Local embedding provider backed by fastembed ONNX models.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{InitOptions, TextEmbedding};
use tracing::{debug, info};

use sift_core::error::{SiftError, SiftResult};
use sift_core::traits::Embedder;

/// Local sentence-embedding model.
///
/// fastembed's `embed` needs `&mut self`, so the model sits behind a mutex.
/// Inference is CPU-bound and runs on the blocking pool.
pub struct LocalEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimensions: usize,
}

impl LocalEmbedder {
    /// Load `model_name`, downloading it into `cache_dir` if needed.
    ///
    /// Blocks while the model is fetched and loaded; see [`LocalEmbedder::load`]
    /// for the async variant.
    pub fn new(model_name: &str, cache_dir: &Path, show_progress: bool) -> SiftResult<Self> {
        let model_enum = parse_model_name(model_name)?;

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            SiftError::embedding_init(format!(
                "Failed to create models directory {}: {}",
                models_dir.display(),
                e
            ))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(show_progress);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| SiftError::embedding_init(format!("Failed to load {}: {}", model_name, e)))?;

        let dimensions = probe_dimensions(&mut model)?;
        info!(model = model_name, dimensions, "Local embedding model loaded");

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    /// Load the model on the blocking pool.
    pub async fn load(model_name: String, cache_dir: PathBuf) -> SiftResult<Self> {
        tokio::task::spawn_blocking(move || Self::new(&model_name, &cache_dir, false))
            .await
            .map_err(|e| SiftError::embedding_init(format!("Model loading task failed: {}", e)))?
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> SiftResult<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SiftError::embedding("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[String]) -> SiftResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        debug!(model = %self.model_name, count = texts.len(), "Embedding locally");

        let model = self.model.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| SiftError::embedding(format!("Failed to acquire model lock: {}", e)))?;
            model
                .embed(texts, None)
                .map_err(|e| SiftError::embedding(e.to_string()))
        })
        .await
        .map_err(|e| SiftError::embedding(format!("Embedding task failed: {}", e)))?
    }

    fn dimension(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Map a model identifier to fastembed's enum.
///
/// Accepts the Hugging Face style name with or without the
/// `sentence-transformers/` prefix, case-insensitively.
pub fn parse_model_name(name: &str) -> SiftResult<fastembed::EmbeddingModel> {
    use fastembed::EmbeddingModel as M;

    let lower = name.trim().to_lowercase();
    let short = lower
        .strip_prefix("sentence-transformers/")
        .or_else(|| lower.strip_prefix("intfloat/"))
        .or_else(|| lower.strip_prefix("baai/"))
        .unwrap_or(&lower);

    match short {
        "paraphrase-multilingual-minilm-l12-v2" => Ok(M::ParaphraseMLMiniLML12V2),
        "paraphrase-multilingual-minilm-l12-v2-q" => Ok(M::ParaphraseMLMiniLML12V2Q),
        "paraphrase-multilingual-mpnet-base-v2" => Ok(M::ParaphraseMLMpnetBaseV2),
        "multilingual-e5-small" => Ok(M::MultilingualE5Small),
        "multilingual-e5-base" => Ok(M::MultilingualE5Base),
        "multilingual-e5-large" => Ok(M::MultilingualE5Large),
        "all-minilm-l6-v2" => Ok(M::AllMiniLML6V2),
        "all-minilm-l6-v2-q" => Ok(M::AllMiniLML6V2Q),
        "bge-small-en-v1.5" => Ok(M::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(M::BGEBaseENV15),
        _ => Err(SiftError::embedding_init(format!(
            "Unknown local model: {}. Supported: paraphrase-multilingual-MiniLM-L12-v2, \
             paraphrase-multilingual-mpnet-base-v2, multilingual-e5-{{small,base,large}}, \
             all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5 (append -q for quantized MiniLM)",
            name
        ))),
    }
}

fn probe_dimensions(model: &mut TextEmbedding) -> SiftResult<usize> {
    let probe = model
        .embed(vec!["test"], None)
        .map_err(|e| SiftError::embedding_init(format!("Failed to probe dimensions: {}", e)))?;

    probe
        .first()
        .map(|v| v.len())
        .ok_or_else(|| SiftError::embedding_init("Model returned no embedding"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_names() {
        assert!(matches!(
            parse_model_name("paraphrase-multilingual-MiniLM-L12-v2"),
            Ok(fastembed::EmbeddingModel::ParaphraseMLMiniLML12V2)
        ));
        assert!(matches!(
            parse_model_name("sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"),
            Ok(fastembed::EmbeddingModel::ParaphraseMLMiniLML12V2)
        ));
        assert!(matches!(
            parse_model_name("intfloat/multilingual-e5-small"),
            Ok(fastembed::EmbeddingModel::MultilingualE5Small)
        ));
    }

    #[test]
    fn test_unknown_model_is_init_error() {
        let err = parse_model_name("nonexistent-model").err().unwrap();
        assert_eq!(err.code(), sift_core::ErrorCode::EmbInitFailed);
    }

    #[test]
    fn test_unknown_model_fails_before_download() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LocalEmbedder::new("nonexistent-model", dir.path(), false).is_err());
        assert!(!dir.path().join("models").exists());
    }

    #[tokio::test]
    #[ignore = "requires model download"]
    async fn test_multilingual_similarity() {
        use sift_core::traits::cosine_similarity;

        let dir = std::env::temp_dir().join("sift-embed-test");
        let embedder = LocalEmbedder::load("paraphrase-multilingual-MiniLM-L12-v2".into(), dir)
            .await
            .unwrap();
        assert_eq!(embedder.dimension(), 384);

        let a = embedder.embed("совещание в пятницу").await.unwrap();
        let b = embedder.embed("встреча").await.unwrap();
        let c = embedder.embed("купить молоко").await.unwrap();
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }
}
