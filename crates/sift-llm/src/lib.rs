//! sift-llm - Completion-based similarity scorers for sift.
//!
//! These providers ask a hosted chat model to rate how close a message is to
//! a topic and reply with a bare number in [0, 1].
//!
//! # Supported Providers
//!
//! - **OpenRouter** - any OpenAI-compatible chat model (Qwen by default)
//! - **YandexGPT** - Yandex Cloud foundation models
//!
//! # Example
//!
//! ```ignore
//! use sift_llm::ScorerFactory;
//!
//! let scorer = ScorerFactory::from_config(&config.semantic)?;
//! let score = scorer.score("Собрание в 15:00", "встреча").await?;
//! ```

mod factory;
mod openrouter;
mod prompt;
mod yandex;

pub use factory::ScorerFactory;
pub use openrouter::OpenRouterScorer;
pub use prompt::similarity_prompt;
pub use yandex::YandexScorer;

// Re-export core types for convenience
pub use sift_core::traits::{parse_score, ScorerBackend, ScorerConfig, SimilarityScorer};
