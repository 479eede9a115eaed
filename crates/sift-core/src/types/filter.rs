//! Filter types: the persisted record and its tagged form.

use serde::{Deserialize, Serialize};

/// Which matcher a filter uses, with its (comma-separated) expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "expression", rename_all = "lowercase")]
pub enum FilterRule {
    /// Case-insensitive substring match over comma-separated keywords.
    Keywords(String),
    /// Semantic similarity against comma-separated topics.
    Semantic(String),
}

impl FilterRule {
    /// Short label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Keywords(_) => "keywords",
            Self::Semantic(_) => "semantic",
        }
    }

    /// The raw expression.
    pub fn expression(&self) -> &str {
        match self {
            Self::Keywords(expr) | Self::Semantic(expr) => expr,
        }
    }
}

/// A filter as stored: optional keyword and topic expressions plus a flag
/// selecting semantic mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<String>,
    #[serde(default)]
    pub use_semantic: bool,
}

impl FilterRecord {
    /// Keyword filter record.
    pub fn keywords(expr: impl Into<String>) -> Self {
        Self {
            keywords: Some(expr.into()),
            ..Default::default()
        }
    }

    /// Semantic filter record.
    pub fn semantic(topics: impl Into<String>) -> Self {
        Self {
            topics: Some(topics.into()),
            use_semantic: true,
            ..Default::default()
        }
    }

    /// Resolve the active rule.
    ///
    /// A non-blank keyword expression wins; otherwise a non-blank topic
    /// expression is used when semantic mode is on. Anything else is inert.
    pub fn rule(&self) -> Option<FilterRule> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        if let Some(keywords) = non_blank(&self.keywords) {
            return Some(FilterRule::Keywords(keywords));
        }
        if self.use_semantic {
            if let Some(topics) = non_blank(&self.topics) {
                return Some(FilterRule::Semantic(topics));
            }
        }
        None
    }
}

/// A user-owned filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: i64,
    pub user_id: i64,
    /// `None` for filters whose active expression is empty; these never match.
    pub rule: Option<FilterRule>,
}

impl Filter {
    /// Build a filter from its stored record.
    pub fn from_record(id: i64, user_id: i64, record: &FilterRecord) -> Self {
        Self {
            id,
            user_id,
            rule: record.rule(),
        }
    }

    /// Keyword filter.
    pub fn keywords(id: i64, user_id: i64, expr: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            rule: Some(FilterRule::Keywords(expr.into())),
        }
    }

    /// Semantic filter.
    pub fn semantic(id: i64, user_id: i64, topics: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            rule: Some(FilterRule::Semantic(topics.into())),
        }
    }
}

/// Split a comma-separated expression into trimmed, non-empty terms.
pub fn split_terms(expr: &str) -> impl Iterator<Item = &str> {
    expr.split(',').map(str::trim).filter(|t| !t.is_empty())
}
