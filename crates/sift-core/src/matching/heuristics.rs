//! Hand-curated correction tables for the semantic matcher.
//!
//! Short texts about neighbouring everyday topics land close together in
//! embedding space. These tables veto matches that carry words of another
//! known topic, widen the overlap check with synonyms, and relax the
//! single-word threshold for cross-language spellings of the same topic.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Word lists guarding one high-confusion topic.
#[derive(Debug, Clone)]
pub struct FalsePositiveRule {
    /// Any of these in the text points at a different topic.
    pub forbidden: &'static [&'static str],
    /// Any of these in the text confirms the topic.
    pub required: &'static [&'static str],
}

/// Topics that have a false-positive rule. Each is also a "main topic" for
/// the cross-topic clause.
pub const MAIN_TOPICS: &[&str] = &["дедлайн", "программирование", "встреча"];

static FALSE_POSITIVE_RULES: Lazy<HashMap<&'static str, FalsePositiveRule>> = Lazy::new(|| {
    HashMap::from([
        (
            "дедлайн",
            FalsePositiveRule {
                forbidden: &[
                    "встреча", "купить", "погода", "привет", "продукты", "молоко",
                    "программирование", "готово", "готов", "сделано", "выполнено", "ок",
                    "окей", "да", "нет", "спасибо",
                ],
                required: &[
                    "дедлайн", "deadline", "срок", "сдать", "сдачи", "крайний", "последний",
                    "день",
                ],
            },
        ),
        (
            "программирование",
            FalsePositiveRule {
                forbidden: &[
                    "дедлайн", "встреча", "купить", "погода", "привет", "продукты", "молоко",
                    "готово", "готов", "сделано", "выполнено", "ок", "окей",
                ],
                required: &[
                    "программирование", "код", "разработка", "приложение", "python",
                    "программа", "написать",
                ],
            },
        ),
        (
            "встреча",
            FalsePositiveRule {
                forbidden: &[
                    "дедлайн", "программирование", "купить", "погода", "продукты", "молоко",
                    "готово", "готов", "сделано", "выполнено",
                ],
                required: &["встреча", "собрание", "совещание", "встретимся"],
            },
        ),
    ])
});

static TOPIC_SYNONYMS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        (
            "дедлайн",
            &["deadline", "срок", "сдачи", "крайний", "последний", "день", "сдать"] as &[&str],
        ),
        (
            "программирование",
            &["код", "разработка", "приложение", "python", "программа", "написать"] as &[&str],
        ),
        (
            "встреча",
            &["собрание", "совещание", "встретимся", "встречаемся"] as &[&str],
        ),
    ])
});

/// Cross-language spellings of one concept. Order within a pair is irrelevant.
pub const SYNONYM_PAIRS: &[(&str, &str)] = &[("deadline", "дедлайн")];

/// Rule for `topic`, if it is a known high-confusion topic.
pub fn false_positive_rule(topic: &str) -> Option<&'static FalsePositiveRule> {
    FALSE_POSITIVE_RULES.get(topic.trim().to_lowercase().as_str())
}

/// Decide whether a candidate match of `text` against `topic` is spurious.
///
/// Flags when a forbidden word is present and no required word is. With
/// `cross_topic_guard` on, it also flags when another main topic from the
/// forbidden list appears in the text as a whole token, even if a required
/// word is present. Presence checks are case-insensitive substring tests.
pub fn is_false_positive(text: &str, topic: &str, cross_topic_guard: bool) -> bool {
    let topic_lower = topic.trim().to_lowercase();
    let Some(rule) = FALSE_POSITIVE_RULES.get(topic_lower.as_str()) else {
        return false;
    };

    let text_lower = text.to_lowercase();
    let has_forbidden = rule.forbidden.iter().any(|w| text_lower.contains(w));
    if !has_forbidden {
        return false;
    }

    if cross_topic_guard {
        let tokens: HashSet<&str> = text_lower.split_whitespace().collect();
        let names_other_topic = MAIN_TOPICS.iter().any(|main| {
            *main != topic_lower && rule.forbidden.contains(main) && tokens.contains(main)
        });
        if names_other_topic {
            return true;
        }
    }

    let has_required = rule.required.iter().any(|w| text_lower.contains(w));
    !has_required
}

/// Synonyms and related words for `topic`; empty for unknown topics.
pub fn synonyms_of(topic: &str) -> HashSet<&'static str> {
    TOPIC_SYNONYMS
        .get(topic.trim().to_lowercase().as_str())
        .map(|words| words.iter().copied().collect())
        .unwrap_or_default()
}

/// Whether `a` and `b` are the two sides of a known synonym pair.
pub fn is_synonym_pair(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    SYNONYM_PAIRS
        .iter()
        .any(|(x, y)| (a == *x && b == *y) || (a == *y && b == *x))
}
