//! Semantic matcher: similarity between a message and a set of topics,
//! corrected for message length and known false positives.
//!
//! The decision itself ([`decide`]) is a pure function of the text, topics and
//! per-topic similarities; [`SemanticMatcher`] only fetches similarities from
//! the active backend and logs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::SemanticConfig;
use crate::error::SiftError;
use crate::matching::heuristics::{is_false_positive, is_synonym_pair, synonyms_of};
use crate::matching::lazy::LazyBackend;
use crate::types::split_terms;

/// Threshold for single-token messages.
pub const SINGLE_WORD_THRESHOLD: f32 = 0.85;
/// Threshold for two- and three-token messages.
pub const SHORT_TEXT_THRESHOLD: f32 = 0.35;
/// Threshold for a single word that is a known cross-language synonym of the topic.
pub const SYNONYM_THRESHOLD: f32 = 0.55;
/// Lower bound of the high-similarity zone.
pub const HIGH_ZONE: f32 = 0.50;
/// Lower bound of the borderline zone.
pub const BORDERLINE_ZONE: f32 = 0.35;
/// Borderline similarities at or above this match without shared words.
pub const HIGH_BORDERLINE: f32 = 0.45;

/// Similarity bar for a message of `token_count` whitespace-separated tokens.
pub fn adjusted_threshold(token_count: usize, base_threshold: f32) -> f32 {
    match token_count {
        1 => SINGLE_WORD_THRESHOLD,
        2 | 3 => SHORT_TEXT_THRESHOLD,
        _ => base_threshold,
    }
}

/// Which rung of the decision ladder decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Similarity in the high zone, compared against the adjusted threshold.
    High,
    /// Vetoed by the false-positive table.
    FalsePositive,
    /// Single words are never confirmed below the high zone.
    SingleWord,
    /// Shared words with the topic (or its synonyms) plus threshold met.
    SharedWords,
    /// Upper borderline accepted without shared words.
    HighBorderline,
    /// Nothing applied.
    NoMatch,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::FalsePositive => "false_positive",
            Self::SingleWord => "single_word",
            Self::SharedWords => "shared_words",
            Self::HighBorderline => "high_borderline",
            Self::NoMatch => "no_match",
        }
    }
}

/// Full result of one semantic decision.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticOutcome {
    pub matched: bool,
    pub branch: Branch,
    pub similarity: f32,
    pub threshold: f32,
    pub best_topic: String,
    pub token_count: usize,
}

/// Options that shape the decision ladder.
#[derive(Debug, Clone, Copy)]
pub struct DecisionParams {
    /// Threshold for texts of four or more tokens.
    pub base_threshold: f32,
    /// Enable the cross-topic clause of the false-positive check.
    pub cross_topic_guard: bool,
}

impl Default for DecisionParams {
    fn default() -> Self {
        Self {
            base_threshold: 0.25,
            cross_topic_guard: false,
        }
    }
}

/// Run the decision ladder over precomputed similarities.
///
/// Returns `None` when there is nothing to decide: a blank text, no topics, or
/// a similarity list that does not line up with the topics.
pub fn decide(
    text: &str,
    topics: &[String],
    similarities: &[f32],
    params: DecisionParams,
) -> Option<SemanticOutcome> {
    let token_count = text.split_whitespace().count();
    if token_count == 0 || topics.is_empty() || similarities.len() != topics.len() {
        return None;
    }

    let (best_idx, max_sim) = similarities
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| !s.is_nan())
        .fold((0, f32::MIN), |best, (i, s)| if s > best.1 { (i, s) } else { best });
    let max_sim = max_sim.max(0.0);
    let best_topic = &topics[best_idx];

    let mut threshold = adjusted_threshold(token_count, params.base_threshold);
    if token_count == 1 && is_synonym_pair(text, best_topic) {
        threshold = SYNONYM_THRESHOLD;
    }

    let outcome = |matched: bool, branch: Branch| SemanticOutcome {
        matched,
        branch,
        similarity: max_sim,
        threshold,
        best_topic: best_topic.clone(),
        token_count,
    };

    let text_words = || -> HashSet<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    };
    let topic_words = || -> HashSet<String> {
        best_topic
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    };

    if max_sim >= HIGH_ZONE {
        if is_false_positive(text, best_topic, params.cross_topic_guard) {
            return Some(outcome(false, Branch::FalsePositive));
        }
        return Some(outcome(max_sim >= threshold, Branch::High));
    }

    if max_sim >= BORDERLINE_ZONE {
        if is_false_positive(text, best_topic, params.cross_topic_guard) {
            return Some(outcome(false, Branch::FalsePositive));
        }
        if token_count == 1 {
            return Some(outcome(false, Branch::SingleWord));
        }

        let mut vocabulary = topic_words();
        vocabulary.extend(synonyms_of(best_topic).into_iter().map(str::to_string));
        let shares_words = !text_words().is_disjoint(&vocabulary);

        if shares_words && max_sim >= threshold {
            return Some(outcome(true, Branch::SharedWords));
        }
        if max_sim >= HIGH_BORDERLINE {
            return Some(outcome(true, Branch::HighBorderline));
        }
        return Some(outcome(false, Branch::NoMatch));
    }

    if token_count == 1 {
        return Some(outcome(false, Branch::SingleWord));
    }
    if !text_words().is_disjoint(&topic_words()) && max_sim >= threshold {
        return Some(outcome(true, Branch::SharedWords));
    }

    Some(outcome(false, Branch::NoMatch))
}

/// Semantic matcher bound to the process-wide backend handle.
#[derive(Debug, Clone)]
pub struct SemanticMatcher {
    backend: Arc<LazyBackend>,
    params: DecisionParams,
    timeout: Duration,
}

impl SemanticMatcher {
    pub fn new(backend: Arc<LazyBackend>, params: DecisionParams, timeout: Duration) -> Self {
        Self {
            backend,
            params,
            timeout,
        }
    }

    pub fn from_config(backend: Arc<LazyBackend>, config: &SemanticConfig) -> Self {
        Self::new(
            backend,
            DecisionParams {
                base_threshold: config.base_threshold,
                cross_topic_guard: config.cross_topic_guard,
            },
            config.request_timeout(),
        )
    }

    /// Match `text` against comma-separated `topics`.
    ///
    /// Never fails: an unavailable backend, a transport error, a malformed
    /// response or a timeout all mean "no match".
    pub async fn match_semantic(&self, text: &str, topics: &str) -> bool {
        self.evaluate(text, topics)
            .await
            .map_or(false, |outcome| outcome.matched)
    }

    /// Like [`match_semantic`](Self::match_semantic), returning the full outcome.
    pub async fn evaluate(&self, text: &str, topics: &str) -> Option<SemanticOutcome> {
        let topic_list: Vec<String> = split_terms(topics).map(str::to_string).collect();
        if topic_list.is_empty() || text.trim().is_empty() {
            return None;
        }

        let backend = match self.backend.get().await {
            Ok(backend) => backend,
            Err(e) => {
                debug!(provider = self.backend.provider(), error = %e, "Semantic backend unavailable, no match");
                return None;
            }
        };

        let similarities =
            match tokio::time::timeout(self.timeout, backend.similarities(text, &topic_list)).await
            {
                Ok(Ok(similarities)) => similarities,
                Ok(Err(e)) => {
                    warn!(backend = backend.name(), code = e.code().as_str(), error = %e, "Semantic backend call failed, no match");
                    return None;
                }
                Err(_) => {
                    let e = SiftError::timeout(backend.name(), self.timeout.as_secs());
                    warn!(backend = backend.name(), error = %e, "Semantic backend call timed out, no match");
                    return None;
                }
            };

        let outcome = decide(text, &topic_list, &similarities, self.params);
        match &outcome {
            Some(o) => debug!(
                similarity = o.similarity,
                threshold = o.threshold,
                tokens = o.token_count,
                topic = %o.best_topic,
                branch = o.branch.as_str(),
                matched = o.matched,
                "Semantic decision"
            ),
            None => warn!(
                backend = backend.name(),
                topics = topic_list.len(),
                scores = similarities.len(),
                "Backend returned mismatched similarities, no match"
            ),
        }
        outcome
    }
}
