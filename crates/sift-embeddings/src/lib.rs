//! sift-embeddings - Embedding provider implementations for sift.
//!
//! # Supported Providers
//!
//! - **Local** (feature: `local`) - fastembed ONNX models, multilingual MiniLM by default
//! - **OpenAI** (feature: `openai`) - text-embedding-3-small, text-embedding-3-large, etc.
//! - **Ollama** (feature: `ollama`) - Embedding models served by Ollama
//!
//! # Example
//!
//! ```ignore
//! use sift_embeddings::EmbedderFactory;
//!
//! // Load the default local model
//! let embedder = EmbedderFactory::local("paraphrase-multilingual-MiniLM-L12-v2", cache_dir).await?;
//!
//! // Or build whatever the configuration selects
//! let embedder = EmbedderFactory::from_config(&config.semantic).await?;
//! ```

mod factory;
#[cfg(feature = "local")]
mod local;
mod ollama;
mod openai;

pub use factory::EmbedderFactory;
#[cfg(feature = "local")]
pub use local::{parse_model_name, LocalEmbedder};
pub use ollama::OllamaEmbedder;
pub use openai::OpenAIEmbedder;

// Re-export core types for convenience
pub use sift_core::traits::{Embedder, EmbedderConfig, EmbeddingBackend};
