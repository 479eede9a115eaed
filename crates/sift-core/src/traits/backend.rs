//! The single capability the semantic matcher consumes.
//!
//! Embedding providers and completion scorers are both adapted to
//! [`SimilarityBackend`], so the decision ladder sees one similarity per topic
//! regardless of where it came from.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::error::{SiftError, SiftResult};
use crate::traits::{Embedder, SimilarityScorer};

/// Produces one similarity score per topic for a message.
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    /// Similarities between `text` and each of `topics`, in the same order.
    async fn similarities(&self, text: &str, topics: &[String]) -> SiftResult<Vec<f32>>;

    /// Name used in diagnostics.
    fn name(&self) -> &str;
}

/// Cosine similarity over embeddings from an [`Embedder`].
pub struct EmbeddingBackend {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingBackend {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl SimilarityBackend for EmbeddingBackend {
    async fn similarities(&self, text: &str, topics: &[String]) -> SiftResult<Vec<f32>> {
        let text_embedding = self.embedder.embed(text).await?;
        let topic_embeddings = self.embedder.embed_batch(topics).await?;

        if topic_embeddings.len() != topics.len() {
            return Err(SiftError::embedding(format!(
                "Expected {} topic embeddings, got {}",
                topics.len(),
                topic_embeddings.len()
            )));
        }

        Ok(topic_embeddings
            .iter()
            .map(|topic| cosine_similarity(&text_embedding, topic))
            .collect())
    }

    fn name(&self) -> &str {
        self.embedder.model_name()
    }
}

/// Per-topic scores from a [`SimilarityScorer`].
///
/// All topics are scored concurrently, so the call takes as long as the
/// slowest request. The first failure fails the call.
pub struct ScorerBackend {
    scorer: Arc<dyn SimilarityScorer>,
}

impl ScorerBackend {
    pub fn new(scorer: Arc<dyn SimilarityScorer>) -> Self {
        Self { scorer }
    }
}

#[async_trait]
impl SimilarityBackend for ScorerBackend {
    async fn similarities(&self, text: &str, topics: &[String]) -> SiftResult<Vec<f32>> {
        try_join_all(topics.iter().map(|topic| self.scorer.score(text, topic))).await
    }

    fn name(&self) -> &str {
        self.scorer.model_name()
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c) - 0.0).abs() < 0.001);

        let d = vec![0.707, 0.707, 0.0];
        assert!((cosine_similarity(&a, &d) - 0.707).abs() < 0.01);
    }

    #[test]
    fn test_cosine_similarity_edge_cases() {
        let empty: Vec<f32> = vec![];
        assert_eq!(cosine_similarity(&empty, &empty), 0.0);

        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);

        let zero = vec![0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    /// Embeds a handful of known words onto fixed axes.
    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed(&self, text: &str) -> SiftResult<Vec<f32>> {
            Ok(match text {
                "deadline" | "дедлайн" => vec![1.0, 0.0],
                "meeting" => vec![0.0, 1.0],
                _ => vec![0.6, 0.8],
            })
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "axis"
        }
    }

    struct FixedScorer(f32);

    #[async_trait]
    impl SimilarityScorer for FixedScorer {
        async fn score(&self, _text: &str, topic: &str) -> SiftResult<f32> {
            if topic == "broken" {
                return Err(SiftError::invalid_score("n/a"));
            }
            Ok(self.0)
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_embedding_backend_scores_each_topic() {
        let backend = EmbeddingBackend::new(Arc::new(AxisEmbedder));
        let topics = vec!["дедлайн".to_string(), "meeting".to_string()];

        let sims = backend.similarities("deadline", &topics).await.unwrap();
        assert_eq!(sims.len(), 2);
        assert!((sims[0] - 1.0).abs() < 1e-6);
        assert!(sims[1].abs() < 1e-6);
        assert_eq!(backend.name(), "axis");
    }

    #[tokio::test]
    async fn test_scorer_backend_propagates_failure() {
        let backend = ScorerBackend::new(Arc::new(FixedScorer(0.6)));

        let ok = backend
            .similarities("text", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(ok, vec![0.6, 0.6]);

        let err = backend
            .similarities("text", &["a".to_string(), "broken".to_string()])
            .await;
        assert!(err.is_err());
    }

    /// Answers after a fixed delay, like a slow completion endpoint.
    struct SlowScorer(std::time::Duration);

    #[async_trait]
    impl SimilarityScorer for SlowScorer {
        async fn score(&self, _text: &str, topic: &str) -> SiftResult<f32> {
            tokio::time::sleep(self.0).await;
            Ok(if topic == "встреча" { 0.9 } else { 0.1 })
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scorer_backend_requests_run_concurrently() {
        let delay = std::time::Duration::from_secs(20);
        let backend = ScorerBackend::new(Arc::new(SlowScorer(delay)));
        let topics: Vec<String> = ["спорт", "встреча", "погода"].iter().map(|t| t.to_string()).collect();

        let start = tokio::time::Instant::now();
        let sims = tokio::time::timeout(std::time::Duration::from_secs(30), backend.similarities("Собрание", &topics))
            .await
            .expect("three 20s requests fit in one 30s deadline")
            .unwrap();

        assert_eq!(sims, vec![0.1, 0.9, 0.1]);
        assert!(start.elapsed() < std::time::Duration::from_secs(30));
    }
}
