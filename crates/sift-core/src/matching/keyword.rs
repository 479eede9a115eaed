//! Keyword matcher: case-insensitive substring containment.

use crate::types::split_terms;

/// True if any comma-separated keyword occurs in `text`, ignoring case.
///
/// No tokenization and no word boundaries: "срок" matches "сроки".
pub fn match_keywords(text: &str, keywords: &str) -> bool {
    let text_lower = text.to_lowercase();
    split_terms(keywords).any(|keyword| text_lower.contains(&keyword.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_match() {
        assert!(match_keywords("Дедлайн по проекту завтра", "дедлайн, срок"));
        assert!(match_keywords("Сроки горят", "срок"));
        assert!(match_keywords("Learn PYTHON today", " python "));
    }

    #[test]
    fn test_no_match() {
        assert!(!match_keywords("Привет, как дела", "дедлайн"));
    }

    #[test]
    fn test_empty_expression_never_matches() {
        assert!(!match_keywords("anything at all", ""));
        assert!(!match_keywords("anything at all", " , ,"));
    }

    #[test]
    fn test_any_term_suffices() {
        assert!(match_keywords("совещание в пятницу", "встреча,совещание"));
    }
}
