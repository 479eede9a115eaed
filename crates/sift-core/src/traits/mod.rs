//! Core traits for sift providers.

mod backend;
mod embedder;
mod scorer;

pub use backend::*;
pub use embedder::*;
pub use scorer::*;
