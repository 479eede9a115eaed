//! Completion-based similarity scorer trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SiftError, SiftResult};

/// A provider that rates how close a text is to a topic directly,
/// without exposing embeddings.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    /// Score `text` against `topic`, in [0, 1].
    async fn score(&self, text: &str, topic: &str) -> SiftResult<f32>;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Scorer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Model name/identifier.
    pub model: String,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Provider-specific account scope (Yandex folder id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            api_key: None,
            base_url: None,
            folder_id: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Parse a completion that is expected to be a bare number in [0, 1].
///
/// Surrounding whitespace and a trailing period are tolerated. Finite values
/// outside the range are clamped; anything else is a parse error.
pub fn parse_score(raw: &str) -> SiftResult<f32> {
    let trimmed = raw.trim().trim_end_matches('.');
    let value: f32 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| SiftError::invalid_score(raw))?;

    if !value.is_finite() {
        return Err(SiftError::invalid_score(raw));
    }

    Ok(value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score() {
        assert!((parse_score("0.73").unwrap() - 0.73).abs() < 1e-6);
        assert!((parse_score("  0.5\n").unwrap() - 0.5).abs() < 1e-6);
        assert!((parse_score("0,8").unwrap() - 0.8).abs() < 1e-6);
        assert!((parse_score("1.").unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_score_clamps() {
        assert_eq!(parse_score("1.7").unwrap(), 1.0);
        assert_eq!(parse_score("-0.2").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_score_rejects_prose() {
        assert!(parse_score("The similarity is high").is_err());
        assert!(parse_score("").is_err());
        assert!(parse_score("NaN").is_err());
        assert!(parse_score("inf").is_err());
    }
}
