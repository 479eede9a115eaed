//! sift-core - Core library for sift.
//!
//! This crate provides the filter types, provider traits and the matching
//! engine that decides whether a chat message should be forwarded to a user.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sift_core::{Filter, FilterEngine, LazyBackend, SiftConfig};
//!
//! let config = SiftConfig::from_env();
//! let backend = Arc::new(LazyBackend::new("local", build_local_backend));
//! let engine = FilterEngine::new(backend, &config.semantic);
//!
//! let filters = vec![Filter::keywords(1, 42, "дедлайн, срок")];
//! let forward = engine.should_forward("Дедлайн по проекту завтра", &filters).await;
//! ```

pub mod config;
pub mod error;
pub mod matching;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{RelayConfig, RetryPolicy, SemanticConfig, SemanticProvider, SiftConfig};
pub use error::{ErrorCode, SiftError, SiftResult};
pub use matching::{FilterEngine, ForwardDecision, LazyBackend, MatchedFilter, SemanticMatcher};
pub use traits::{
    Embedder, EmbedderConfig, EmbeddingBackend, ScorerBackend, ScorerConfig, SimilarityBackend,
    SimilarityScorer,
};
pub use types::{Filter, FilterRecord, FilterRule};
