//! Lazily-initialized, process-wide semantic backend handle.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::error::{SiftError, SiftResult};
use crate::traits::SimilarityBackend;

type InitFn = Box<dyn Fn() -> BoxFuture<'static, SiftResult<Arc<dyn SimilarityBackend>>> + Send + Sync>;

/// Owns the active semantic backend and builds it on first use.
///
/// Initialization runs at most once, even when several evaluations race to
/// trigger it. A failed initialization is remembered: the backend stays
/// unavailable for the lifetime of this handle and is never retried.
pub struct LazyBackend {
    provider: String,
    init: InitFn,
    cell: OnceCell<Result<Arc<dyn SimilarityBackend>, String>>,
}

impl LazyBackend {
    /// Create a handle that runs `init` on first use.
    pub fn new<F, Fut>(provider: impl Into<String>, init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SiftResult<Arc<dyn SimilarityBackend>>> + Send + 'static,
    {
        Self {
            provider: provider.into(),
            init: Box::new(move || Box::pin(init())),
            cell: OnceCell::new(),
        }
    }

    /// Create a handle around an already-built backend.
    pub fn ready(backend: Arc<dyn SimilarityBackend>) -> Self {
        let provider = backend.name().to_string();
        Self {
            provider,
            init: Box::new(|| {
                Box::pin(async { Err(SiftError::Internal("backend already initialized".to_string())) })
            }),
            cell: OnceCell::new_with(Some(Ok(backend))),
        }
    }

    /// Provider label used in diagnostics.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Whether initialization has been attempted (successfully or not).
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Get the backend, initializing it on first call.
    pub async fn get(&self) -> SiftResult<Arc<dyn SimilarityBackend>> {
        let state = self
            .cell
            .get_or_init(|| async {
                match (self.init)().await {
                    Ok(backend) => {
                        info!(provider = %self.provider, backend = backend.name(), "Semantic backend initialized");
                        Ok(backend)
                    }
                    Err(e) => {
                        error!(provider = %self.provider, error = %e, "Semantic backend failed to initialize; semantic filters disabled");
                        Err(e.to_string())
                    }
                }
            })
            .await;

        state.clone().map_err(SiftError::Unavailable)
    }
}

impl std::fmt::Debug for LazyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyBackend")
            .field("provider", &self.provider)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
