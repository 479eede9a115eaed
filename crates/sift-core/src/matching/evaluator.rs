//! Filter evaluation: decide whether a message should be forwarded to a user.
//!
//! Filters are checked in stored order with OR semantics. A keyword filter
//! runs the keyword matcher; a semantic filter runs the semantic matcher. The
//! first filter that matches decides.

use std::sync::Arc;

use tracing::debug;

use crate::config::SemanticConfig;
use crate::matching::keyword::match_keywords;
use crate::matching::lazy::LazyBackend;
use crate::matching::semantic::SemanticMatcher;
use crate::types::{Filter, FilterRule};

/// The filter that caused a forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFilter {
    /// Position in the evaluated slice.
    pub index: usize,
    pub filter_id: i64,
    /// `"keywords"` or `"semantic"`.
    pub kind: &'static str,
}

/// Result of evaluating one message against one user's filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardDecision {
    pub forward: bool,
    pub matched: Option<MatchedFilter>,
}

impl ForwardDecision {
    fn skip() -> Self {
        Self::default()
    }

    fn matched(index: usize, filter: &Filter, kind: &'static str) -> Self {
        Self {
            forward: true,
            matched: Some(MatchedFilter {
                index,
                filter_id: filter.id,
                kind,
            }),
        }
    }
}

/// Combines the keyword and semantic matchers over a user's filter set.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    semantic: SemanticMatcher,
}

impl FilterEngine {
    /// Create an engine over the shared backend handle.
    pub fn new(backend: Arc<LazyBackend>, config: &SemanticConfig) -> Self {
        Self {
            semantic: SemanticMatcher::from_config(backend, config),
        }
    }

    /// Create an engine from an already configured semantic matcher.
    pub fn with_matcher(semantic: SemanticMatcher) -> Self {
        Self { semantic }
    }

    /// Whether `text` matches any of `filters`.
    pub async fn should_forward(&self, text: &str, filters: &[Filter]) -> bool {
        self.evaluate(text, filters).await.forward
    }

    /// Evaluate `filters` in order and report which one matched, if any.
    pub async fn evaluate(&self, text: &str, filters: &[Filter]) -> ForwardDecision {
        if text.trim().is_empty() || filters.is_empty() {
            return ForwardDecision::skip();
        }

        for (index, filter) in filters.iter().enumerate() {
            let Some(rule) = &filter.rule else {
                debug!(filter_id = filter.id, "Filter has no active expression, skipping");
                continue;
            };

            let matched = match rule {
                FilterRule::Keywords(keywords) => match_keywords(text, keywords),
                FilterRule::Semantic(topics) => self.semantic.match_semantic(text, topics).await,
            };

            debug!(
                filter_id = filter.id,
                user_id = filter.user_id,
                kind = rule.kind(),
                expression = rule.expression(),
                matched,
                "Filter checked"
            );

            if matched {
                return ForwardDecision::matched(index, filter, rule.kind());
            }
        }

        ForwardDecision::skip()
    }
}
