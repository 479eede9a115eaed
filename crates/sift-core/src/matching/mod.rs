//! Message matching: keyword and semantic matchers and the filter evaluator.

pub mod evaluator;
pub mod heuristics;
pub mod keyword;
pub mod lazy;
pub mod semantic;

pub use evaluator::{FilterEngine, ForwardDecision, MatchedFilter};
pub use keyword::match_keywords;
pub use lazy::LazyBackend;
pub use semantic::{adjusted_threshold, decide, Branch, DecisionParams, SemanticMatcher, SemanticOutcome};
